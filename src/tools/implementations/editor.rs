// Editor-level relays: health, project info, screenshots, console commands

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::nova::NovaClient;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_f64, opt_str, relay_result, req_str};

pub struct NovaHealthTool {
    nova: Arc<NovaClient>,
}

impl NovaHealthTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaHealthTool {
    fn name(&self) -> &str {
        "nova_health"
    }

    fn description(&self) -> &str {
        "Check that the Nova editor control API is reachable. Run this before a session to \
         confirm the editor is up and the bridge plugin is listening."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutput> {
        relay_result(self.nova.health().await)
    }
}

pub struct NovaProjectInfoTool {
    nova: Arc<NovaClient>,
}

impl NovaProjectInfoTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaProjectInfoTool {
    fn name(&self) -> &str {
        "nova_project_info"
    }

    fn description(&self) -> &str {
        "Get the open Nova project: name, engine version and the current level."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutput> {
        relay_result(self.nova.project_info().await)
    }
}

pub struct NovaScreenshotTool {
    nova: Arc<NovaClient>,
}

impl NovaScreenshotTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaScreenshotTool {
    fn name(&self) -> &str {
        "nova_screenshot"
    }

    fn description(&self) -> &str {
        "Capture a screenshot of the editor viewport. Returns the saved image path; use it to \
         visually verify scene changes."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .optional(
                "save_path",
                ParamKind::String,
                "File path to save the screenshot (editor default if omitted)",
            )
            .optional("width", ParamKind::Number, "Capture width in pixels")
            .optional("height", ParamKind::Number, "Capture height in pixels")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let mut body = json!({});
        if let Some(path) = opt_str(&input, "save_path") {
            body["save_path"] = json!(path);
        }
        if let Some(width) = opt_f64(&input, "width") {
            body["width"] = json!(width as u32);
        }
        if let Some(height) = opt_f64(&input, "height") {
            body["height"] = json!(height as u32);
        }
        relay_result(self.nova.viewport_screenshot(body).await)
    }
}

pub struct NovaSetCameraTool {
    nova: Arc<NovaClient>,
}

impl NovaSetCameraTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaSetCameraTool {
    fn name(&self) -> &str {
        "nova_set_camera"
    }

    fn description(&self) -> &str {
        "Position the editor viewport camera. Omitted components are left unchanged. Combine \
         with nova_screenshot to frame and capture a view."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .optional("location", ParamKind::Object, "Camera location as {x, y, z}")
            .optional(
                "rotation",
                ParamKind::Object,
                "Camera rotation as {pitch, yaw, roll} in degrees",
            )
            .optional("fov", ParamKind::Number, "Field of view in degrees")
            .optional(
                "show_flags",
                ParamKind::Object,
                "Viewport show flags to toggle, e.g. {\"grid\": false}",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let mut body = json!({});
        for key in ["location", "rotation", "show_flags"] {
            if input[key].is_object() {
                body[key] = input[key].clone();
            }
        }
        if let Some(fov) = opt_f64(&input, "fov") {
            body["fov"] = json!(fov);
        }
        relay_result(self.nova.set_camera(body).await)
    }
}

pub struct NovaExecTool {
    nova: Arc<NovaClient>,
}

impl NovaExecTool {
    pub fn new(nova: Arc<NovaClient>) -> Self {
        Self { nova }
    }
}

#[async_trait]
impl Tool for NovaExecTool {
    fn name(&self) -> &str {
        "nova_exec"
    }

    fn description(&self) -> &str {
        "Run an editor console command (e.g. \"stat fps\", \"t.MaxFPS 120\"). Escape hatch for \
         operations the other tools do not cover."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new().required("command", ParamKind::String, "Console command to run")
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let command = req_str(&input, "command")?;
        relay_result(self.nova.exec_command(&command).await)
    }
}
