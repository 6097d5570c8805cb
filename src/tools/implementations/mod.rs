// Tool implementations
//
// One file per operation family. Pipeline tools (export, to_nova, download,
// generate) aggregate step outcomes so a failure after an expensive step
// still surfaces the partial progress.

mod assets;
mod download;
mod editor;
mod export;
mod generate;
mod list_scripts;
mod run_script;
mod scene;
mod search;
mod to_nova;

pub use assets::{NovaCreateMaterialTool, NovaImportAssetTool};
pub use download::ModelDownloadTool;
pub use editor::{
    NovaExecTool, NovaHealthTool, NovaProjectInfoTool, NovaScreenshotTool, NovaSetCameraTool,
};
pub use export::BlenderExportTool;
pub use generate::ModelGenerateTool;
pub use list_scripts::BlenderListScriptsTool;
pub use run_script::BlenderRunTool;
pub use scene::{
    NovaDeleteTool, NovaGetActorTool, NovaSceneListTool, NovaSetPropertyTool, NovaSpawnTool,
    NovaTransformTool,
};
pub use search::ModelSearchTool;
pub use to_nova::BlenderToNovaTool;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::blender::BlenderRunner;
use crate::config::BridgeConfig;
use crate::download::Downloader;
use crate::errors::BridgeError;
use crate::nova::NovaClient;
use crate::providers::MeshyClient;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolOutput;

/// Build the full operation catalog against one immutable configuration.
/// Called once at startup; panics on duplicate names by design.
pub fn build_registry(config: Arc<BridgeConfig>) -> Result<ToolRegistry> {
    let nova = Arc::new(NovaClient::new(&config.nova)?);
    let downloader = Arc::new(Downloader::new()?);
    let runner = BlenderRunner::new(&config);
    let meshy = config
        .meshy_api_key
        .as_deref()
        .map(MeshyClient::new)
        .transpose()?
        .map(Arc::new);

    let mut registry = ToolRegistry::new();

    // Blender-side pipelines
    registry.register(Box::new(BlenderRunTool::new(config.clone(), runner.clone())));
    registry.register(Box::new(BlenderListScriptsTool::new(config.clone())));
    registry.register(Box::new(BlenderExportTool::new(config.clone(), runner.clone())));
    registry.register(Box::new(BlenderToNovaTool::new(
        config.clone(),
        runner.clone(),
        nova.clone(),
    )));
    registry.register(Box::new(ModelDownloadTool::new(
        config.clone(),
        runner.clone(),
        downloader.clone(),
        nova.clone(),
    )));
    registry.register(Box::new(ModelSearchTool::new()?));
    registry.register(Box::new(ModelGenerateTool::new(
        config.clone(),
        meshy,
        downloader,
        nova.clone(),
    )));

    // Nova-side relays
    registry.register(Box::new(NovaHealthTool::new(nova.clone())));
    registry.register(Box::new(NovaProjectInfoTool::new(nova.clone())));
    registry.register(Box::new(NovaSceneListTool::new(nova.clone())));
    registry.register(Box::new(NovaSpawnTool::new(nova.clone())));
    registry.register(Box::new(NovaTransformTool::new(nova.clone())));
    registry.register(Box::new(NovaDeleteTool::new(nova.clone())));
    registry.register(Box::new(NovaGetActorTool::new(nova.clone())));
    registry.register(Box::new(NovaSetPropertyTool::new(nova.clone())));
    registry.register(Box::new(NovaImportAssetTool::new(nova.clone())));
    registry.register(Box::new(NovaCreateMaterialTool::new(nova.clone())));
    registry.register(Box::new(NovaScreenshotTool::new(nova.clone())));
    registry.register(Box::new(NovaSetCameraTool::new(nova.clone())));
    registry.register(Box::new(NovaExecTool::new(nova)));

    Ok(registry)
}

// ---- parameter accessors (schemas are validated before handlers run, so
// these only guard against handler/schema drift) ----

pub(crate) fn req_str(input: &Value, key: &str) -> Result<String> {
    input[key]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("Missing {} parameter", key))
}

pub(crate) fn opt_str(input: &Value, key: &str) -> Option<String> {
    input[key].as_str().map(str::to_string)
}

pub(crate) fn opt_f64(input: &Value, key: &str) -> Option<f64> {
    input[key].as_f64()
}

pub(crate) fn opt_bool(input: &Value, key: &str) -> Option<bool> {
    input[key].as_bool()
}

pub(crate) fn opt_str_vec(input: &Value, key: &str) -> Vec<String> {
    input[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Names destined for `export_dir.join(..)` must stay inside the export
/// directory; a separator or parent reference would escape it.
pub(crate) fn require_plain_name(value: &str, key: &str) -> Result<(), BridgeError> {
    if value.is_empty() || value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(BridgeError::Schema(format!(
            "'{}' must be a plain file name without path separators",
            key
        )));
    }
    Ok(())
}

/// Forward a Nova call result as an envelope; a remote fault becomes an
/// error envelope rather than a handler fault.
pub(crate) fn relay_result(result: Result<Value, BridgeError>) -> Result<ToolOutput> {
    match result {
        Ok(value) => Ok(ToolOutput::ok(value)),
        Err(err) => Ok(ToolOutput::error(json!({
            "error": err.to_string(),
            "category": err.category(),
        }))),
    }
}
