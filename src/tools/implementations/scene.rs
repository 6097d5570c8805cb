// nova_scene_* / actor relays

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::nova::NovaClient;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_f64, opt_str, relay_result, req_str};

pub struct NovaSceneListTool {
    nova: Arc<NovaClient>,
}

impl NovaSceneListTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaSceneListTool {
    fn name(&self) -> &str {
        "nova_scene_list"
    }

    fn description(&self) -> &str {
        "List all actors in the current Nova editor level with their classes and transforms."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutput> {
        relay_result(self.nova.scene_list().await)
    }
}

pub struct NovaSpawnTool {
    nova: Arc<NovaClient>,
}

impl NovaSpawnTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaSpawnTool {
    fn name(&self) -> &str {
        "nova_spawn"
    }

    fn description(&self) -> &str {
        "Spawn an actor in the Nova editor level. The class can be a built-in (StaticMeshActor, \
         PointLight, CameraActor) or a /Game content path to an imported asset."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("class", ParamKind::String, "Actor class or content path to spawn")
            .optional("label", ParamKind::String, "Label for the spawned actor")
            .optional("x", ParamKind::Number, "World X position (default: 0)")
            .optional("y", ParamKind::Number, "World Y position (default: 0)")
            .optional("z", ParamKind::Number, "World Z position (default: 0)")
            .optional("pitch", ParamKind::Number, "Pitch in degrees (default: 0)")
            .optional("yaw", ParamKind::Number, "Yaw in degrees (default: 0)")
            .optional("roll", ParamKind::Number, "Roll in degrees (default: 0)")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let class = req_str(&input, "class")?;
        let mut body = json!({
            "class": class,
            "location": {
                "x": opt_f64(&input, "x").unwrap_or(0.0),
                "y": opt_f64(&input, "y").unwrap_or(0.0),
                "z": opt_f64(&input, "z").unwrap_or(0.0),
            },
            "rotation": {
                "pitch": opt_f64(&input, "pitch").unwrap_or(0.0),
                "yaw": opt_f64(&input, "yaw").unwrap_or(0.0),
                "roll": opt_f64(&input, "roll").unwrap_or(0.0),
            },
        });
        if let Some(label) = opt_str(&input, "label") {
            body["label"] = json!(label);
        }
        relay_result(self.nova.spawn(body).await)
    }
}

pub struct NovaTransformTool {
    nova: Arc<NovaClient>,
}

impl NovaTransformTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaTransformTool {
    fn name(&self) -> &str {
        "nova_transform"
    }

    fn description(&self) -> &str {
        "Move, rotate or scale an actor by name. Omitted components are left unchanged."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("name", ParamKind::String, "Actor name or label")
            .optional(
                "location",
                ParamKind::Object,
                "New location as {x, y, z}",
            )
            .optional(
                "rotation",
                ParamKind::Object,
                "New rotation as {pitch, yaw, roll} in degrees",
            )
            .optional("scale", ParamKind::Object, "New scale as {x, y, z}")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let name = req_str(&input, "name")?;
        let mut body = json!({ "name": name });
        for key in ["location", "rotation", "scale"] {
            if input[key].is_object() {
                body[key] = input[key].clone();
            }
        }
        relay_result(self.nova.transform(body).await)
    }
}

pub struct NovaDeleteTool {
    nova: Arc<NovaClient>,
}

impl NovaDeleteTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaDeleteTool {
    fn name(&self) -> &str {
        "nova_delete"
    }

    fn description(&self) -> &str {
        "Delete an actor from the Nova editor level by name."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new().required("name", ParamKind::String, "Actor name or label")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let name = req_str(&input, "name")?;
        relay_result(self.nova.delete_actor(&name).await)
    }
}

pub struct NovaGetActorTool {
    nova: Arc<NovaClient>,
}

impl NovaGetActorTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaGetActorTool {
    fn name(&self) -> &str {
        "nova_get_actor"
    }

    fn description(&self) -> &str {
        "Get details for one actor: class, transform and editable properties."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new().required("name", ParamKind::String, "Actor name or label")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let name = req_str(&input, "name")?;
        relay_result(self.nova.get_actor(&name).await)
    }
}

pub struct NovaSetPropertyTool {
    nova: Arc<NovaClient>,
}

impl NovaSetPropertyTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaSetPropertyTool {
    fn name(&self) -> &str {
        "nova_set_property"
    }

    fn description(&self) -> &str {
        "Set a named property on an actor. Values are passed as strings and coerced by the \
         editor (e.g. \"5000.0\" for intensity, a /Game path for a mesh binding)."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("name", ParamKind::String, "Actor name or label")
            .required("property", ParamKind::String, "Property name to set")
            .required("value", ParamKind::String, "New value, as a string")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let name = req_str(&input, "name")?;
        let property = req_str(&input, "property")?;
        let value = req_str(&input, "value")?;
        relay_result(self.nova.set_property(&name, &property, &value).await)
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
    async fn test_spawn_builds_location_and_rotation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/nova/scene/spawn")
            .match_body(mockito::Matcher::Json(json!({
                "class": "PointLight",
                "label": "KeyLight",
                "location": { "x": 100.0, "y": 0.0, "z": 250.0 },
                "rotation": { "pitch": 0.0, "yaw": 90.0, "roll": 0.0 },
            })))
            .with_status(200)
            .with_body(r#"{"status":"ok","name":"PointLight_1"}"#)
            .create_async()
            .await;

        let tool = NovaSpawnTool::new(client_for(&server));
        let output = tool
            .execute(json!({
                "class": "PointLight",
                "label": "KeyLight",
                "x": 100.0,
                "z": 250.0,
                "yaw": 90.0,
            }))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert_eq!(output.details["name"], "PointLight_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transform_forwards_only_present_components() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/nova/scene/transform")
            .match_body(mockito::Matcher::Json(json!({
                "name": "Cube",
                "scale": { "x": 2.0, "y": 2.0, "z": 2.0 },
            })))
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let tool = NovaTransformTool::new(client_for(&server));
        let output = tool
            .execute(json!({
                "name": "Cube",
                "scale": { "x": 2.0, "y": 2.0, "z": 2.0 },
            }))
            .await
            .unwrap();
        assert!(!output.is_error);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_unreachable_editor_is_error_envelope() {
        let client = Arc::new(
            NovaClient::new(&NovaEndpoint {
                host: "127.0.0.1".to_string(),
                port: 9,
                api_key: None,
            })
            .unwrap(),
        );
        let tool = NovaDeleteTool::new(client);
        let output = tool.execute(json!({ "name": "Cube" })).await.unwrap();
        assert!(output.is_error);
        assert_eq!(output.details["category"], "connection");
    }
}
