// model_search - Sketchfab catalog search

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::errors::BridgeError;
use crate::tools::registry::Tool;
use crate::tools::types::{ParamKind, ToolInputSchema, ToolOutput};

use super::{opt_f64, req_str};

const SKETCHFAB_SEARCH_URL: &str = "https://api.sketchfab.com/v3/search";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_MAX_RESULTS: u32 = 10;

pub struct ModelSearchTool {
    client: Client,
    base_url: String,
}

impl ModelSearchTool {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .context("Failed to create search client")?;
        Ok(Self {
            client,
            base_url: SKETCHFAB_SEARCH_URL.to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Tool for ModelSearchTool {
    fn name(&self) -> &str {
        "model_search"
    }

    fn description(&self) -> &str {
        "Search Sketchfab for downloadable 3D models, sorted by popularity. Returns names, \
         viewer URLs and mesh stats. Use model_download with a direct file URL to fetch one."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .required("query", ParamKind::String, "Search query (e.g. \"sci-fi helmet\")")
            .optional(
                "max_results",
                ParamKind::Number,
                "Maximum results to return (default: 10)",
            )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let query = req_str(&input, "query")?;
        let max_results = opt_f64(&input, "max_results")
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("type", "models"),
                ("q", query.as_str()),
                ("downloadable", "true"),
                ("sort_by", "-likeCount"),
                ("count", &max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|err| BridgeError::Provider(format!("Sketchfab search failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Provider(format!(
                "Sketchfab search failed: HTTP {}",
                status.as_u16()
            ))
            .into());
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| BridgeError::Provider(format!("Sketchfab returned bad JSON: {}", err)))?;

        let results = match payload["results"].as_array() {
            Some(results) => results,
            None => {
                return Ok(ToolOutput::error(json!({
                    "error": "no results field in Sketchfab response",
                    "category": "provider",
                    "raw": payload,
                })))
            }
        };

        let models: Vec<Value> = results
            .iter()
            .map(|model| {
                json!({
                    "name": model["name"],
                    "url": model["viewerUrl"],
                    "author": model["user"]["displayName"],
                    "likes": model["likeCount"],
                    "faces": model["faceCount"],
                    "vertices": model["vertexCount"],
                    "license": model["license"]["label"],
                })
            })
            .collect();

        Ok(ToolOutput::ok(json!({
            "query": query,
            "count": models.len(),
            "models": models,
        })))
    }
}
