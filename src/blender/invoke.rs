// Headless Blender invocation builder

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::BridgeConfig;
use crate::process::ProcessInvocation;

/// Time budget for plain script runs.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(120);
/// Time budget for export pipelines; applying modifiers on dense meshes is
/// the slow path.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(180);

/// Builds ProcessInvocations for the configured Blender binary.
#[derive(Debug, Clone)]
pub struct BlenderRunner {
    bin: PathBuf,
}

impl BlenderRunner {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            bin: config.blender_bin.clone(),
        }
    }

    /// `blender --background [blend_file] --python <script> [-- extra...]`
    ///
    /// DISPLAY is cleared so Blender never tries to open a window even on a
    /// machine with an X server. Extra args land after `--` where the script
    /// reads them from sys.argv.
    pub fn invocation(
        &self,
        blend_file: Option<&Path>,
        script: &Path,
        extra_args: &[String],
        timeout: Duration,
    ) -> ProcessInvocation {
        let mut invocation =
            ProcessInvocation::new(&self.bin, timeout).arg("--background");
        if let Some(blend) = blend_file {
            invocation = invocation.arg(blend.display().to_string());
        }
        invocation = invocation
            .arg("--python")
            .arg(script.display().to_string());
        if !extra_args.is_empty() {
            invocation = invocation.arg("--").args(extra_args.iter().cloned());
        }
        invocation.env("DISPLAY", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    fn runner() -> BlenderRunner {
        let config = BridgeConfig {
            blender_bin: PathBuf::from("/usr/bin/blender"),
            ..BridgeConfig::default()
        };
        BlenderRunner::new(&config)
    }

    #[test]
    fn test_invocation_program_and_timeout() {
        let inv = runner().invocation(None, Path::new("/tmp/s.py"), &[], RUN_TIMEOUT);
        assert_eq!(inv.program(), Path::new("/usr/bin/blender"));
        assert_eq!(inv.timeout(), RUN_TIMEOUT);
    }

    #[test]
    fn test_invocation_arg_order_with_blend_file() {
        let inv = runner().invocation(
            Some(Path::new("/tmp/scene.blend")),
            Path::new("/tmp/s.py"),
            &["alpha".to_string()],
            EXPORT_TIMEOUT,
        );
        // blend file must come before --python so Blender opens it first
        assert_eq!(
            inv.arg_list(),
            &[
                "--background",
                "/tmp/scene.blend",
                "--python",
                "/tmp/s.py",
                "--",
                "alpha"
            ]
        );
    }
}
