// Tool registry and invocation boundary
//
// Registration happens once at startup; a duplicate name is a programming
// error and panics there. invoke() validates input before the handler runs
// and converts every outcome, including handler faults, into the uniform
// envelope - nothing escapes this boundary.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::errors::BridgeError;
use crate::tools::types::{ToolDefinition, ToolInputSchema, ToolOutput, ToolResult};

/// A named, schema-validated unit of work exposed to the calling agent.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> ToolInputSchema;
    async fn execute(&self, input: Value) -> Result<ToolOutput>;
}

/// Process-wide mapping from operation name to schema + handler.
/// Additive only; immutable after startup.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            panic!("duplicate tool registration: {}", name);
        }
        self.order.push(name.clone());
        self.tools.insert(name, Arc::from(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Catalog of definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema().to_json(),
            })
            .collect()
    }

    /// Validate and run one tool, normalizing every outcome into the
    /// envelope. Schema rejection happens before the handler runs, so
    /// invalid input triggers no side effect.
    #[instrument(skip(self, params), fields(tool = %name))]
    pub async fn invoke(&self, name: &str, params: Value) -> ToolResult {
        let tool = match self.get(name) {
            Some(tool) => tool,
            None => {
                warn!("Unknown tool requested");
                return ToolResult::from_error(format!("unknown tool '{}'", name), "schema");
            }
        };

        if let Err(err) = tool.input_schema().validate(&params) {
            warn!("Schema validation failed: {}", err);
            return ToolResult::from_error(err.to_string(), err.category());
        }

        info!("Executing tool");
        match tool.execute(params).await {
            Ok(output) => ToolResult::from_output(output),
            Err(err) => {
                error!("Tool execution failed: {:#}", err);
                let category = err
                    .downcast_ref::<BridgeError>()
                    .map(BridgeError::category)
                    .unwrap_or("internal");
                ToolResult::from_error(format!("{:#}", err), category)
            }
        }
    }
}
