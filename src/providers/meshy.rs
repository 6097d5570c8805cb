// Meshy text-to-3D client
//
// Submit-and-poll: create a preview task, poll until a terminal status,
// extract the downloadable model URL. Exhausting the poll budget is its
// own failure, distinct from a provider-reported FAILED.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::BridgeError;

const MESHY_BASE_URL: &str = "https://api.meshy.ai/v2/text-to-3d";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Seconds between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Maximum status-check attempts before the task is declared failed.
pub const POLL_BUDGET: u32 = 60;

/// Terminal result of a successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedModel {
    pub task_id: String,
    pub model_url: String,
    pub status: String,
}

pub struct MeshyClient {
    client: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    poll_budget: u32,
}

impl MeshyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create Meshy client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: MESHY_BASE_URL.to_string(),
            poll_interval: POLL_INTERVAL,
            poll_budget: POLL_BUDGET,
        })
    }

    /// Override endpoint and poll pacing (tests).
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[doc(hidden)]
    pub fn with_poll(mut self, interval: Duration, budget: u32) -> Self {
        self.poll_interval = interval;
        self.poll_budget = budget;
        self
    }

    /// Submit a prompt and poll to a terminal status.
    pub async fn generate(&self, prompt: &str, style: &str) -> Result<GeneratedModel, BridgeError> {
        let task_id = self.submit(prompt, style).await?;
        info!(%task_id, "Meshy task submitted, polling");

        let mut last_status = "UNKNOWN".to_string();
        for attempt in 0..self.poll_budget {
            tokio::time::sleep(self.poll_interval).await;
            let payload = self.poll(&task_id).await?;
            last_status = payload["status"]
                .as_str()
                .unwrap_or("UNKNOWN")
                .to_ascii_uppercase();
            debug!(%task_id, attempt, %last_status, "Meshy poll");

            match last_status.as_str() {
                "SUCCEEDED" => {
                    let model_url = extract_model_url(&payload).ok_or_else(|| {
                        BridgeError::Provider(format!(
                            "task {} succeeded but returned no model url",
                            task_id
                        ))
                    })?;
                    return Ok(GeneratedModel {
                        task_id,
                        model_url,
                        status: last_status,
                    });
                }
                "FAILED" => {
                    return Err(BridgeError::Provider(format!(
                        "task {} reported status FAILED",
                        task_id
                    )));
                }
                _ => continue,
            }
        }

        Err(BridgeError::Provider(format!(
            "task {} reached no terminal status after {} polls (last status: {})",
            task_id, self.poll_budget, last_status
        )))
    }

    async fn submit(&self, prompt: &str, style: &str) -> Result<String, BridgeError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "mode": "preview", "prompt": prompt, "art_style": style }))
            .send()
            .await
            .map_err(|err| BridgeError::Provider(format!("submit failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Provider(format!(
                "submit failed: HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| BridgeError::Provider(format!("submit returned bad JSON: {}", err)))?;

        // The task id field has moved between API revisions.
        ["result", "id", "task_id"]
            .iter()
            .find_map(|key| payload[key].as_str())
            .map(str::to_string)
            .ok_or_else(|| BridgeError::Provider(format!("no task id in response: {}", payload)))
    }

    async fn poll(&self, task_id: &str) -> Result<Value, BridgeError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, task_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| BridgeError::Provider(format!("poll failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Provider(format!(
                "poll failed: HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|err| BridgeError::Provider(format!("poll returned bad JSON: {}", err)))
    }
}

fn extract_model_url(payload: &Value) -> Option<String> {
    let urls = &payload["model_urls"];
    ["glb", "obj", "fbx"]
        .iter()
        .find_map(|key| urls[key].as_str())
        .map(str::to_string)
}
