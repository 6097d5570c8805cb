// HTTP surface for the tool catalog
//
// Three routes: a health probe, the catalog listing, and invocation by
// name. Invocation always answers 200 with the uniform envelope; transport
// status codes are reserved for the transport itself.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::tools::ToolRegistry;

struct AppState {
    registry: ToolRegistry,
}

pub struct BridgeServer {
    config: ServerConfig,
    registry: ToolRegistry,
}

impl BridgeServer {
    pub fn new(config: ServerConfig, registry: ToolRegistry) -> Self {
        Self { config, registry }
    }

    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.bind_address))?;

        let app = create_router(Arc::new(AppState {
            registry: self.registry,
        }))
        .layer(axum::extract::DefaultBodyLimit::max(4 * 1024 * 1024))
        .layer(TraceLayer::new_for_http());

        info!("Starting bridge server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/tools", get(handle_list_tools))
        .route("/tools/:name", post(handle_invoke))
        .with_state(state)
}

async fn handle_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "nova-bridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "tools": state.registry.definitions() }))
}

async fn handle_invoke(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let params = body.map(|Json(value)| value).unwrap_or(Value::Null);
    let result = state.registry.invoke(&name, params).await;
    Json(json!({
        "content": result.content,
        "details": result.details,
        "is_error": result.is_error,
    }))
}
