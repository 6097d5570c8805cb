// HTTP client for the Nova editor control API
//
// One request/response exchange per call, no retained session. The editor's
// error replies are not always well-formed JSON, so response decoding keeps
// an explicit raw-text variant instead of failing the call.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::NovaEndpoint;
use crate::errors::BridgeError;

/// Budget for ordinary queries.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Budget for calls that trigger heavyweight editor work (asset import).
pub const IMPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// Body of a successful exchange: parsed JSON, or the raw text when the
/// editor sent something unparseable. Downstream code must handle both.
#[derive(Debug, Clone)]
pub enum RemoteResponse {
    Parsed(Value),
    Raw(String),
}

impl RemoteResponse {
    /// Collapse into a JSON value; raw text lands under a dedicated field.
    pub fn into_value(self) -> Value {
        match self {
            RemoteResponse::Parsed(value) => value,
            RemoteResponse::Raw(text) => json!({ "raw": text }),
        }
    }
}

pub struct NovaClient {
    client: Client,
    base_url: String,
    host: String,
    port: u16,
    api_key: Option<String>,
}

impl NovaClient {
    pub fn new(endpoint: &NovaEndpoint) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: format!("http://{}:{}/nova", endpoint.host, endpoint.port),
            host: endpoint.host.clone(),
            port: endpoint.port,
            api_key: endpoint.api_key.clone(),
        })
    }

    /// Point the client at an arbitrary base URL (tests).
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One request/response exchange against a `/nova/...` route.
    pub async fn call(
        &self,
        method: Method,
        route: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<RemoteResponse, BridgeError> {
        let url = format!("{}{}", self.base_url, route);
        debug!(%method, %url, "Nova request");

        let mut request = self.client.request(method, &url).timeout(timeout);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                BridgeError::RemoteTimeout(timeout)
            } else {
                BridgeError::Connection {
                    host: self.host.clone(),
                    port: self.port,
                    detail: err.to_string(),
                }
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            if err.is_timeout() {
                BridgeError::RemoteTimeout(timeout)
            } else {
                BridgeError::RemoteProtocol {
                    status: status.as_u16(),
                    body: err.to_string(),
                }
            }
        })?;

        if !status.is_success() {
            return Err(BridgeError::RemoteProtocol {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.is_empty() {
            return Ok(RemoteResponse::Parsed(json!({ "status": "ok" })));
        }
        match serde_json::from_str(&text) {
            Ok(value) => Ok(RemoteResponse::Parsed(value)),
            Err(_) => Ok(RemoteResponse::Raw(text)),
        }
    }

    async fn get(&self, route: &str) -> Result<Value, BridgeError> {
        Ok(self
            .call(Method::GET, route, None, DEFAULT_TIMEOUT)
            .await?
            .into_value())
    }

    async fn post(&self, route: &str, body: Value) -> Result<Value, BridgeError> {
        Ok(self
            .call(Method::POST, route, Some(&body), DEFAULT_TIMEOUT)
            .await?
            .into_value())
    }

    // ---- typed helpers over the fixed route namespace ----

    pub async fn health(&self) -> Result<Value, BridgeError> {
        self.get("/health").await
    }

    pub async fn project_info(&self) -> Result<Value, BridgeError> {
        self.get("/project/info").await
    }

    pub async fn scene_list(&self) -> Result<Value, BridgeError> {
        self.get("/scene/list").await
    }

    pub async fn spawn(&self, body: Value) -> Result<Value, BridgeError> {
        self.post("/scene/spawn", body).await
    }

    pub async fn transform(&self, body: Value) -> Result<Value, BridgeError> {
        self.post("/scene/transform", body).await
    }

    pub async fn delete_actor(&self, name: &str) -> Result<Value, BridgeError> {
        self.post("/scene/delete", json!({ "name": name })).await
    }

    pub async fn get_actor(&self, name: &str) -> Result<Value, BridgeError> {
        self.post("/scene/get", json!({ "name": name })).await
    }

    pub async fn set_property(
        &self,
        name: &str,
        property: &str,
        value: &str,
    ) -> Result<Value, BridgeError> {
        self.post(
            "/scene/set-property",
            json!({ "name": name, "property": property, "value": value }),
        )
        .await
    }

    /// Relay an artifact reference for import. The editor reads the file
    /// itself; only the path crosses the wire. Uses the long budget.
    pub async fn import_asset(
        &self,
        file_path: &str,
        asset_name: Option<&str>,
        destination: &str,
        scale: Option<f64>,
    ) -> Result<Value, BridgeError> {
        let mut body = json!({
            "file_path": file_path,
            "destination": destination,
        });
        if let Some(name) = asset_name {
            body["asset_name"] = json!(name);
        }
        if let Some(scale) = scale {
            body["scale"] = json!(scale);
        }
        Ok(self
            .call(Method::POST, "/asset/import", Some(&body), IMPORT_TIMEOUT)
            .await?
            .into_value())
    }

    pub async fn create_material(&self, body: Value) -> Result<Value, BridgeError> {
        self.post("/material/create", body).await
    }

    pub async fn viewport_screenshot(&self, body: Value) -> Result<Value, BridgeError> {
        self.post("/viewport/screenshot", body).await
    }

    pub async fn set_camera(&self, body: Value) -> Result<Value, BridgeError> {
        self.post("/viewport/camera/set", body).await
    }

    pub async fn exec_command(&self, command: &str) -> Result<Value, BridgeError> {
        self.post("/exec", json!({ "command": command })).await
    }
}
