// blender_to_nova - full pipeline: script -> OBJ -> editor import
//
// The relay step failing must not discard the artifact: the export is the
// expensive part, and the agent can retry just the import with
// nova_import_asset.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blender::{marker_lines, BlenderRunner};
use crate::config::BridgeConfig;
use crate::nova::NovaClient;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::export::{compose_run_verify, ExportRequest};
use super::{opt_f64, opt_str, req_str, require_plain_name};

pub struct BlenderToNovaTool {
    config: Arc<BridgeConfig>,
    runner: BlenderRunner,
    nova: Arc<NovaClient>,
}

impl BlenderToNovaTool {
    pub fn new(config: Arc<BridgeConfig>, runner: BlenderRunner, nova: Arc<NovaClient>) -> Self {
        Self {
            config,
            runner,
            nova,
        }
    }
}

#[async_trait]
impl Tool for BlenderToNovaTool {
    fn name(&self) -> &str {
        "blender_to_nova"
    }

    fn description(&self) -> &str {
        "Full pipeline: run a Blender Python script to create or modify a mesh, export it to \
         OBJ, and import the result into the Nova editor as an asset. This is the recommended \
         way to get complex geometry (characters, organic shapes, detailed props) into the \
         editor. After import, spawn it with nova_spawn and bind it via nova_set_property."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("asset_name", ParamKind::String, "Name for the editor asset")
            .optional(
                "script",
                ParamKind::String,
                "Inline Blender Python script that creates the geometry",
            )
            .optional("script_path", ParamKind::String, "Path to a .py script file")
            .optional(
                "blend_file",
                ParamKind::String,
                "Path to an existing .blend file to export",
            )
            .optional(
                "destination",
                ParamKind::String,
                "Editor content path (default: /Game)",
            )
            .optional("scale", ParamKind::Number, "Uniform import scale factor")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let asset_name = req_str(&input, "asset_name")?;
        require_plain_name(&asset_name, "asset_name")?;
        let request = ExportRequest::from_input(&input)?;
        let destination = opt_str(&input, "destination").unwrap_or_else(|| "/Game".to_string());
        let scale = opt_f64(&input, "scale");

        let out_path = self.config.export_dir.join(format!("{}.obj", asset_name));
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

        let blender_summary = json!({
            "stdout": marker_lines(&run.stdout),
            "obj_path": run.artifact.path,
            "obj_size": run.artifact.size_bytes,
        });

        // RelayingToRemote
        let import = self
            .nova
            .import_asset(
                &run.artifact.path.display().to_string(),
                Some(&asset_name),
                &destination,
                scale,
            )
            .await;

        match import {
            Ok(response) => Ok(ToolOutput::ok(json!({
                "status": response["status"].as_str().unwrap_or("ok"),
                "blender": blender_summary,
                "nova_import": response,
                "next_steps": format!(
                    "Asset imported at {}/{}. Use nova_spawn to place it in the scene.",
                    destination, asset_name
                ),
            }))),
            // Export succeeded; keep the artifact info so only the relay
            // needs retrying.
            Err(err) => Ok(ToolOutput::error(json!({
                "error": err.to_string(),
                "category": err.category(),
                "step": "relay",
                "blender": blender_summary,
                "artifact": run.artifact,
            }))),
        }
    }
}
