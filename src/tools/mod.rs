// Tool system
//
// Exposes every bridge operation as a named, schema-validated tool with a
// uniform result envelope.

pub mod implementations;
pub mod registry;
pub mod types;

pub use implementations::build_registry;
pub use registry::{Tool, ToolRegistry};
pub use types::{ParamKind, ParamSpec, ToolDefinition, ToolInputSchema, ToolOutput, ToolResult};
