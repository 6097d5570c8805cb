// model_generate - text prompt -> Meshy task -> download -> optional import

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::BridgeConfig;
use crate::download::{filename_from_url, Downloader};
use crate::errors::BridgeError;
use crate::nova::NovaClient;
use crate::providers::MeshyClient;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_bool, opt_str, req_str, require_plain_name};

/// Generated assets come out of Meshy in meters; the editor world works in
/// centimeters, so direct OBJ imports get a fixed x100 scale.
const GENERATED_IMPORT_SCALE: f64 = 100.0;

pub struct ModelGenerateTool {
    config: Arc<BridgeConfig>,
    meshy: Option<Arc<MeshyClient>>,
    downloader: Arc<Downloader>,
    nova: Arc<NovaClient>,
}

impl ModelGenerateTool {
    pub fn new(
        config: Arc<BridgeConfig>,
        meshy: Option<Arc<MeshyClient>>,
        downloader: Arc<Downloader>,
        nova: Arc<NovaClient>,
    ) -> Self {
        Self {
            config,
            meshy,
            downloader,
            nova,
        }
    }
}

#[async_trait]
impl Tool for ModelGenerateTool {
    fn name(&self) -> &str {
        "model_generate"
    }

    fn description(&self) -> &str {
        "Generate a 3D model from a text prompt via the Meshy text-to-3D provider, download \
         the result, and optionally import it into the Nova editor. Requires MESHY_API_KEY. \
         Non-OBJ results are saved locally; convert them with model_download or blender_export \
         before importing."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("prompt", ParamKind::String, "Text description of the model to generate")
            .optional(
                "style",
                ParamKind::String,
                "Art style hint (default: realistic)",
            )
            .optional(
                "asset_name",
                ParamKind::String,
                "Asset name (default: ai_model_<timestamp>)",
            )
            .optional(
                "import_to_nova",
                ParamKind::Boolean,
                "Import into the editor when the result is OBJ (default: true)",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let prompt = req_str(&input, "prompt")?;
        let style = opt_str(&input, "style").unwrap_or_else(|| "realistic".to_string());
        let asset_name = opt_str(&input, "asset_name")
            .unwrap_or_else(|| format!("ai_model_{}", chrono::Utc::now().timestamp()));
        require_plain_name(&asset_name, "asset_name")?;
        let import = opt_bool(&input, "import_to_nova").unwrap_or(true);

        let meshy = self.meshy.as_ref().ok_or_else(|| {
            BridgeError::Provider("MESHY_API_KEY is not configured".to_string())
        })?;

        let generated = match meshy.generate(&prompt, &style).await {
            Ok(generated) => generated,
            Err(err) => {
                return Ok(ToolOutput::error(json!({
                    "error": err.to_string(),
                    "category": err.category(),
                    "step": "generate",
                })))
            }
        };

        let extension = filename_from_url(&generated.model_url)
            .rsplit('.')
            .next()
            .map(str::to_ascii_lowercase)
            .filter(|ext| ext.len() <= 4)
            .unwrap_or_else(|| "glb".to_string());
        let dest = self
            .config
            .export_dir
            .join(format!("{}.{}", asset_name, extension));

        let artifact = match self.downloader.download(&generated.model_url, &dest).await {
            Ok(artifact) => artifact,
            // The provider did its (billable) work; surface the task so the
            // caller can refetch without regenerating.
            Err(err) => {
                return Ok(ToolOutput::error(json!({
                    "error": err.to_string(),
                    "category": err.category(),
                    "step": "download",
                    "task_id": generated.task_id,
                    "source_url": generated.model_url,
                })))
            }
        };

        let mut details = Map::new();
        details.insert("status".to_string(), json!("ok"));
        details.insert("provider".to_string(), json!("meshy"));
        details.insert("prompt".to_string(), json!(prompt));
        details.insert("task_id".to_string(), json!(generated.task_id));
        details.insert("file_path".to_string(), json!(artifact.path));
        details.insert("size_bytes".to_string(), json!(artifact.size_bytes));
        details.insert("source_url".to_string(), json!(generated.model_url));

        if !import {
            return Ok(ToolOutput::ok(Value::Object(details)));
        }

        if artifact.format != "obj" {
            details.insert(
                "note".to_string(),
                json!(
                    "Generated file is not OBJ. Convert it with model_download or \
                     blender_export before importing."
                ),
            );
            return Ok(ToolOutput::ok(Value::Object(details)));
        }

        let import_result = self
            .nova
            .import_asset(
                &artifact.path.display().to_string(),
                Some(&asset_name),
                "/Game",
                Some(GENERATED_IMPORT_SCALE),
            )
            .await;
        match import_result {
            Ok(response) => {
                details.insert("nova_import".to_string(), response);
                Ok(ToolOutput::ok(Value::Object(details)))
            }
            Err(err) => {
                details.insert("error".to_string(), json!(err.to_string()));
                details.insert("category".to_string(), json!(err.category()));
                details.insert("step".to_string(), json!("relay"));
                Ok(ToolOutput::error(Value::Object(details)))
            }
        }
    }
}
