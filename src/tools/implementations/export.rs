// blender_export - compose script + export trailer, run Blender, verify OBJ
//
// The compose -> run -> verify sequence lives here and is shared with the
// full blender_to_nova pipeline. A step failure resolves to an error
// envelope carrying bounded diagnostics and whatever progress was made;
// later steps never run after a failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blender::{
    marker_lines, obj_export_trailer, tail_lines, ArtifactReference, BlenderRunner, TempScript,
    EXPORT_TIMEOUT,
};
use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::process::{self, ProcessOutcome};
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_str, require_plain_name};

const STDOUT_TAIL: usize = 30;
const STDERR_TAIL: usize = 20;

/// Successful compose/run/verify pass.
pub(crate) struct ExportRun {
    pub artifact: ArtifactReference,
    pub stdout: String,
}

/// Source of the user fragment for an export pipeline.
pub(crate) struct ExportRequest {
    pub inline: Option<String>,
    pub script_path: Option<PathBuf>,
    pub blend_file: Option<PathBuf>,
}

impl ExportRequest {
    pub fn from_input(input: &Value) -> Result<Self, BridgeError> {
        let request = Self {
            inline: opt_str(input, "script"),
            script_path: opt_str(input, "script_path").map(PathBuf::from),
            blend_file: opt_str(input, "blend_file").map(PathBuf::from),
        };
        if request.inline.is_none() && request.script_path.is_none() && request.blend_file.is_none()
        {
            return Err(BridgeError::Schema(
                "provide 'script', 'script_path' or 'blend_file'".to_string(),
            ));
        }
        Ok(request)
    }
}

/// Run the shared pipeline front half. On failure the error envelope is
/// already assembled; the caller just returns it.
pub(crate) async fn compose_run_verify(
    runner: &BlenderRunner,
    scratch_dir: &Path,
    request: &ExportRequest,
    out_path: &Path,
) -> Result<ExportRun, ToolOutput> {
    // ComposingScript
    let user_fragment = match (&request.inline, &request.script_path) {
        (Some(inline), _) => Some(inline.clone()),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                return Err(ToolOutput::error(json!({
                    "error": format!("failed to read user script {}: {}", path.display(), err),
                    "category": "schema",
                    "step": "compose",
                })))
            }
        },
        (None, None) => None,
    };
    let composed = crate::blender::compose(
        user_fragment.as_deref(),
        &obj_export_trailer(out_path),
    );
    let script = match TempScript::materialize(&composed, scratch_dir) {
        Ok(script) => script,
        Err(err) => {
            return Err(ToolOutput::error(json!({
                "error": format!("{:#}", err),
                "category": "internal",
                "step": "compose",
            })))
        }
    };

    // RunningProcess - the TempScript guard holds across the run, so the
    // scratch file is gone before this function returns on any path.
    let invocation = runner.invocation(
        request.blend_file.as_deref(),
        script.path(),
        &[],
        EXPORT_TIMEOUT,
    );
    let outcome = match process::run(&invocation).await {
        Ok(outcome) => outcome,
        Err(err) => {
            return Err(ToolOutput::error(json!({
                "error": format!("{:#}", err),
                "category": "process_failure",
                "step": "run",
            })))
        }
    };
    let (stdout, stderr) = match outcome {
        ProcessOutcome::Success { stdout, stderr } => (stdout, stderr),
        ProcessOutcome::TimedOut { timeout } => {
            let err = BridgeError::ProcessTimeout(timeout);
            return Err(ToolOutput::error(json!({
                "error": err.to_string(),
                "category": err.category(),
                "step": "run",
            })));
        }
        ProcessOutcome::Failed {
            exit_code,
            stdout,
            stderr,
        } => {
            return Err(ToolOutput::error(json!({
                "error": format!("Blender exited with code {}", exit_code),
                "category": "process_failure",
                "step": "run",
                "stdout": tail_lines(&stdout, STDOUT_TAIL),
                "stderr": tail_lines(&stderr, STDERR_TAIL),
            })));
        }
    };

    // VerifyingArtifact - absence after a clean exit means the script
    // content is wrong, not the infrastructure; say so.
    match ArtifactReference::verify(out_path) {
        Ok(artifact) => Ok(ExportRun { artifact, stdout }),
        Err(err) => Err(ToolOutput::error(json!({
            "error": err.to_string(),
            "category": err.category(),
            "step": "verify",
            "stdout": tail_lines(&stdout, STDOUT_TAIL),
            "stderr": tail_lines(&stderr, STDERR_TAIL),
        }))),
    }
}

pub struct BlenderExportTool {
    config: Arc<BridgeConfig>,
    runner: BlenderRunner,
}

impl BlenderExportTool {
    pub fn new(config: Arc<BridgeConfig>, runner: BlenderRunner) -> Self {
        Self { config, runner }
    }
}

#[async_trait]
impl Tool for BlenderExportTool {
    fn name(&self) -> &str {
        "blender_export"
    }

    fn description(&self) -> &str {
        "Export a Blender scene to OBJ (the editor's import format). Provide a blend_file, or a \
         script that creates geometry, or both. Returns the path and size of the exported file."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .optional("script", ParamKind::String, "Inline Python to run before exporting")
            .optional(
                "script_path",
                ParamKind::String,
                "Path to a .py script to run before exporting",
            )
            .optional("blend_file", ParamKind::String, "Path to a .blend file to export")
            .optional(
                "output_name",
                ParamKind::String,
                "Output filename (default: export_<timestamp>.obj)",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let request = ExportRequest::from_input(&input)?;
        let out_name = opt_str(&input, "output_name").unwrap_or_else(|| {
            format!("export_{}.obj", chrono::Utc::now().timestamp_millis())
        });
        require_plain_name(&out_name, "output_name")?;
        let out_name = if out_name.ends_with(".obj") {
            out_name
        } else {
            format!("{}.obj", out_name)
        };
        let out_path = self.config.export_dir.join(out_name);

        let run = match compose_run_verify(
            &self.runner,
            &self.config.export_dir,
            &request,
            &out_path,
        )
        .await
        {
            Ok(run) => run,
            Err(failure) => return Ok(failure),
        };

        Ok(ToolOutput::ok(json!({
            "status": "ok",
            "obj_path": run.artifact.path,
            "size_bytes": run.artifact.size_bytes,
            "stdout": marker_lines(&run.stdout),
        })))
    }
}
