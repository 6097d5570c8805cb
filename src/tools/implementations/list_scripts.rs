// blender_list_scripts - inventory of reusable scripts and produced artifacts

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::config::BridgeConfig;
use crate::tools::registry::Tool;
use crate::tools::types::{ToolInputSchema, ToolOutput};

const ARTIFACT_EXTENSIONS: &[&str] = &["obj", "glb", "gltf", "fbx", "blend"];

pub struct BlenderListScriptsTool {
    config: Arc<BridgeConfig>,
}

impl BlenderListScriptsTool {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for BlenderListScriptsTool {
    fn name(&self) -> &str {
        "blender_list_scripts"
    }

    fn description(&self) -> &str {
        "List available Blender Python scripts in the configured scripts directory, plus \
         previously exported model files in the export directory."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutput> {
        let mut scripts = Vec::new();
        if self.config.scripts_dir.exists() {
            for entry in WalkDir::new(&self.config.scripts_dir)
                .into_iter()
                .filter_map(|entry| entry.ok())
            {
                if entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some("py")
                {
                    scripts.push(entry.path().display().to_string());
                }
            }
        }
        scripts.sort();

        let mut output_files = Vec::new();
        if self.config.export_dir.exists() {
            for entry in WalkDir::new(&self.config.export_dir)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
            {
                let ext = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase);
                if entry.file_type().is_file()
                    && ext.as_deref().is_some_and(|e| ARTIFACT_EXTENSIONS.contains(&e))
                {
                    output_files.push(entry.path().display().to_string());
                }
            }
        }
        output_files.sort();

        Ok(ToolOutput::ok(json!({
            "scripts": scripts,
            "output_files": output_files,
        })))
    }
}
