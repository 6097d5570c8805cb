// model_download - fetch a model file, optionally convert and import

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::blender::{import_snippet, ArtifactReference, BlenderRunner};
use crate::config::BridgeConfig;
use crate::download::{filename_from_url, Downloader};
use crate::errors::BridgeError;
use crate::nova::NovaClient;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::export::{compose_run_verify, ExportRequest};
use super::{opt_bool, opt_str, require_plain_name};

pub struct ModelDownloadTool {
    config: Arc<BridgeConfig>,
    runner: BlenderRunner,
    downloader: Arc<Downloader>,
    nova: Arc<NovaClient>,
}

impl ModelDownloadTool {
    pub fn new(
        config: Arc<BridgeConfig>,
        runner: BlenderRunner,
        downloader: Arc<Downloader>,
        nova: Arc<NovaClient>,
    ) -> Self {
        Self {
            config,
            runner,
            downloader,
            nova,
        }
    }

    /// Convert a non-OBJ download to OBJ by round-tripping through Blender.
    async fn convert_to_obj(
        &self,
        source: &ArtifactReference,
        obj_path: &Path,
    ) -> Result<ArtifactReference, ToolOutput> {
        let request = match source.format.as_str() {
            // .blend files are opened from the command line; no import line
            "blend" => ExportRequest {
                inline: None,
                script_path: None,
                blend_file: Some(source.path.clone()),
            },
            format => match import_snippet(&source.path, format) {
                Some(snippet) => ExportRequest {
                    inline: Some(snippet),
                    script_path: None,
                    blend_file: None,
                },
                None => {
                    return Err(ToolOutput::error(json!({
                        "error": format!("unsupported model format '{}'", format),
                        "category": "schema",
                        "file_path": source.path,
                    })))
                }
            },
        };
        compose_run_verify(&self.runner, &self.config.export_dir, &request, obj_path)
            .await
            .map(|run| run.artifact)
    }
}

#[async_trait]
impl Tool for ModelDownloadTool {
    fn name(&self) -> &str {
        "model_download"
    }

    fn description(&self) -> &str {
        "Download a 3D model file from a URL. Optionally convert it to OBJ via Blender and \
         import it into the Nova editor. OBJ imports directly; GLB/GLTF/FBX/BLEND are \
         converted first."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("url", ParamKind::String, "URL to download the model from")
            .optional(
                "filename",
                ParamKind::String,
                "Save as filename (derived from the URL if omitted)",
            )
            .optional(
                "import_to_nova",
                ParamKind::Boolean,
                "Import into the editor after download (default: false)",
            )
            .optional(
                "asset_name",
                ParamKind::String,
                "Editor asset name (required when import_to_nova is true)",
            )
            .optional(
                "destination",
                ParamKind::String,
                "Editor content path (default: /Game)",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let url = super::req_str(&input, "url")?;
        let import = opt_bool(&input, "import_to_nova").unwrap_or(false);
        let asset_name = opt_str(&input, "asset_name");
        let destination = opt_str(&input, "destination").unwrap_or_else(|| "/Game".to_string());

        // Checked before the download so invalid input has no side effect.
        if import && asset_name.is_none() {
            return Err(BridgeError::Schema(
                "'asset_name' is required when import_to_nova is true".to_string(),
            )
            .into());
        }
        if let Some(name) = &asset_name {
            require_plain_name(name, "asset_name")?;
        }

        let filename = opt_str(&input, "filename").unwrap_or_else(|| filename_from_url(&url));
        require_plain_name(&filename, "filename")?;
        let dest = self.config.export_dir.join(&filename);

        let downloaded = match self.downloader.download(&url, &dest).await {
            Ok(artifact) => artifact,
            Err(err) => {
                return Ok(ToolOutput::error(json!({
                    "error": err.to_string(),
                    "category": err.category(),
                    "step": "download",
                })))
            }
        };

        let mut details = Map::new();
        details.insert("status".to_string(), json!("ok"));
        details.insert("file_path".to_string(), json!(downloaded.path));
        details.insert("size_bytes".to_string(), json!(downloaded.size_bytes));
        details.insert("format".to_string(), json!(downloaded.format));

        if !import {
            return Ok(ToolOutput::ok(Value::Object(details)));
        }
        let asset_name = asset_name.expect("checked above");

        let import_artifact = if downloaded.format == "obj" {
            downloaded.clone()
        } else {
            let obj_path = self.config.export_dir.join(format!("{}.obj", asset_name));
            match self.convert_to_obj(&downloaded, &obj_path).await {
                Ok(converted) => {
                    details.insert("converted_to".to_string(), json!(converted.path));
                    converted
                }
                Err(mut failure) => {
                    // Keep the download info so the caller can convert or
                    // import by hand without refetching.
                    if let Value::Object(map) = &mut failure.details {
                        map.insert("file_path".to_string(), json!(downloaded.path));
                        map.insert("size_bytes".to_string(), json!(downloaded.size_bytes));
                    }
                    return Ok(failure);
                }
            }
        };

        let import_result = self
            .nova
            .import_asset(
                &import_artifact.path.display().to_string(),
                Some(&asset_name),
                &destination,
                None,
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
