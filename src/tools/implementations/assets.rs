// Asset relays: import and material creation

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::nova::NovaClient;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_f64, opt_str, relay_result, req_str};

pub struct NovaImportAssetTool {
    nova: Arc<NovaClient>,
}

impl NovaImportAssetTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaImportAssetTool {
    fn name(&self) -> &str {
        "nova_import_asset"
    }

    fn description(&self) -> &str {
        "Import a model file already on disk into the Nova editor content browser. Use this to \
         retry an import after a pipeline tool exported the file but the relay failed."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("file_path", ParamKind::String, "Absolute path to the model file")
            .optional(
                "asset_name",
                ParamKind::String,
                "Asset name (derived from the filename if omitted)",
            )
            .optional(
                "destination",
                ParamKind::String,
                "Editor content path (default: /Game)",
            )
            .optional("scale", ParamKind::Number, "Uniform import scale factor")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let file_path = req_str(&input, "file_path")?;
        let asset_name = opt_str(&input, "asset_name");
        let destination = opt_str(&input, "destination").unwrap_or_else(|| "/Game".to_string());
        let scale = opt_f64(&input, "scale");

        relay_result(
            self.nova
                .import_asset(&file_path, asset_name.as_deref(), &destination, scale)
                .await,
        )
    }
}

pub struct NovaCreateMaterialTool {
    nova: Arc<NovaClient>,
}

impl NovaCreateMaterialTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaCreateMaterialTool {
    fn name(&self) -> &str {
        "nova_create_material"
    }

    fn description(&self) -> &str {
        "Create a simple colored material in the editor content browser. Assign it to a mesh \
         with nova_set_property."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("name", ParamKind::String, "Material asset name")
            .optional(
                "path",
                ParamKind::String,
                "Content path to create it under (default: /Game)",
            )
            .optional(
                "color",
                ParamKind::Object,
                "Base color as {r, g, b, a} with components in 0..1",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let name = req_str(&input, "name")?;
        let path = opt_str(&input, "path").unwrap_or_else(|| "/Game".to_string());

        let mut body = json!({ "name": name, "path": path });
        if input["color"].is_object() {
            body["color"] = input["color"].clone();
        }
        relay_result(self.nova.create_material(body).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NovaEndpoint;

    fn client_for(server: &mockito::ServerGuard) -> Arc<NovaClient> {
        Arc::new(
            NovaClient::new(&NovaEndpoint::default())
                .unwrap()
                .with_base_url(format!("{}/nova", server.url())),
        )
    }

    #[tokio::test]
    async fn test_import_asset_builds_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/nova/asset/import")
            .match_body(mockito::Matcher::Json(json!({
                "file_path": "/tmp/mesh.obj",
                "asset_name": "Mesh",
                "destination": "/Game/Props",
                "scale": 2.0,
            })))
            .with_status(200)
            .with_body(r#"{"status":"ok","asset_path":"/Game/Props/Mesh"}"#)
            .create_async()
            .await;

        let output = NovaImportAssetTool::new(client_for(&server))
            .execute(json!({
                "file_path": "/tmp/mesh.obj",
                "asset_name": "Mesh",
                "destination": "/Game/Props",
                "scale": 2.0,
            }))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert_eq!(output.details["asset_path"], "/Game/Props/Mesh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_material_defaults_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/nova/material/create")
            .match_body(mockito::Matcher::Json(json!({
                "name": "RedMat",
                "path": "/Game",
                "color": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 },
            })))
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let output = NovaCreateMaterialTool::new(client_for(&server))
            .execute(json!({
                "name": "RedMat",
                "color": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 },
            }))
            .await
            .unwrap();
        assert!(!output.is_error);
        mock.assert_async().await;
    }
}
