// blender_run - run a Python script in headless Blender

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blender::{filter_banner, tail_lines, BlenderRunner, TempScript, RUN_TIMEOUT};
use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::process::{self, ProcessOutcome};
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_str, opt_str_vec};

const STDERR_TAIL: usize = 20;

pub struct BlenderRunTool {
    config: Arc<BridgeConfig>,
    runner: BlenderRunner,
}

impl BlenderRunTool {
    pub fn new(config: Arc<BridgeConfig>, runner: BlenderRunner) -> Self {
        Self { config, runner }
    }
}

#[async_trait]
impl Tool for BlenderRunTool {
    fn name(&self) -> &str {
        "blender_run"
    }

    fn description(&self) -> &str {
        "Run a Python script in headless Blender. Provide either 'script' (inline code) or \
         'script_path' (path to a .py file). The script runs with full bpy API access - use it \
         for meshes, modifiers, materials, UV unwrapping. Returns Blender's stdout/stderr."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .optional("script", ParamKind::String, "Inline Python code to run in Blender")
            .optional("script_path", ParamKind::String, "Path to a .py script file to run")
            .optional(
                "blend_file",
                ParamKind::String,
                "Open this .blend file before running the script",
            )
            .optional(
                "args",
                ParamKind::StringArray,
                "Extra arguments passed after -- (accessible via sys.argv)",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let inline = opt_str(&input, "script");
        let script_path = opt_str(&input, "script_path").map(PathBuf::from);
        if inline.is_none() && script_path.is_none() {
            return Err(
                BridgeError::Schema("provide either 'script' or 'script_path'".to_string()).into(),
            );
        }

        // Inline scripts get a scratch file that the guard removes on every
        // exit path; caller-provided files are left alone.
        let guard = match &inline {
            Some(text) => Some(TempScript::materialize(text, &self.config.export_dir)?),
            None => None,
        };
        let script = guard
            .as_ref()
            .map(|g| g.path().to_path_buf())
            .or(script_path)
            .expect("script source checked above");

        let blend_file = opt_str(&input, "blend_file").map(PathBuf::from);
        let args = opt_str_vec(&input, "args");
        let invocation =
            self.runner
                .invocation(blend_file.as_deref(), &script, &args, RUN_TIMEOUT);

        match process::run(&invocation).await? {
            ProcessOutcome::Success { stdout, stderr } => Ok(ToolOutput::ok(json!({
                "status": "ok",
                "stdout": filter_banner(&stdout),
                "stderr": tail_lines(&stderr, STDERR_TAIL),
            }))),
            ProcessOutcome::TimedOut { timeout } => {
                let err = BridgeError::ProcessTimeout(timeout);
                Ok(ToolOutput::error(json!({
                    "error": err.to_string(),
                    "category": err.category(),
                })))
            }
            ProcessOutcome::Failed {
                exit_code,
                stdout,
                stderr,
            } => Ok(ToolOutput::error(json!({
                "error": format!("Blender exited with code {}", exit_code),
                "category": "process_failure",
                "stdout": tail_lines(&stdout, 30),
                "stderr": tail_lines(&stderr, STDERR_TAIL),
            }))),
        }
    }
}
