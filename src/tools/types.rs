// Core types for the tool system
//
// Input schemas are declared as a tagged parameter list and validated at the
// registry boundary before any handler code runs. Unknown extra parameters
// are ignored for forward compatibility.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::errors::BridgeError;

/// Kinds a tool parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    StringArray,
    Object,
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::StringArray => "array",
            ParamKind::Object => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::StringArray => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            ParamKind::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

/// Declared input schema: an ordered parameter list.
#[derive(Debug, Clone, Default)]
pub struct ToolInputSchema {
    params: Vec<(String, ParamSpec)>,
}

impl ToolInputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.param(name, kind, true, description)
    }

    pub fn optional(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.param(name, kind, false, description)
    }

    fn param(mut self, name: &str, kind: ParamKind, required: bool, description: &str) -> Self {
        self.params.push((
            name.to_string(),
            ParamSpec {
                kind,
                required,
                description: description.to_string(),
            },
        ));
        self
    }

    /// JSON-Schema-shaped catalog representation.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, spec) in &self.params {
            let mut prop = json!({
                "type": spec.kind.json_type(),
                "description": spec.description,
            });
            if spec.kind == ParamKind::StringArray {
                prop["items"] = json!({ "type": "string" });
            }
            properties.insert(name.clone(), prop);
            if spec.required {
                required.push(name.clone());
            }
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": required,
        })
    }

    /// Validate raw params against the declared schema.
    ///
    /// Missing required parameter or kind mismatch is a SchemaError. Unknown
    /// extra parameters pass through untouched.
    pub fn validate(&self, input: &Value) -> Result<(), BridgeError> {
        let object = match input {
            Value::Object(map) => map,
            Value::Null => {
                if let Some((name, _)) = self.params.iter().find(|(_, spec)| spec.required) {
                    return Err(BridgeError::Schema(format!(
                        "missing required parameter '{}'",
                        name
                    )));
                }
                return Ok(());
            }
            _ => {
                return Err(BridgeError::Schema(
                    "parameters must be a JSON object".to_string(),
                ))
            }
        };

        for (name, spec) in &self.params {
            match object.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(BridgeError::Schema(format!(
                            "missing required parameter '{}'",
                            name
                        )));
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(BridgeError::Schema(format!(
                            "parameter '{}' must be a {}",
                            name,
                            spec.kind.json_type()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Catalog entry for one registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// What a handler returns: a structured payload plus a flag marking
/// handler-level failure (the envelope still carries partial progress).
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub details: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(details: Value) -> Self {
        Self {
            details,
            is_error: false,
        }
    }

    pub fn error(details: Value) -> Self {
        Self {
            details,
            is_error: true,
        }
    }
}

/// Uniform envelope every invocation resolves to, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Human-readable rendering of the payload
    pub content: String,
    /// Structured payload
    pub details: Value,
    pub is_error: bool,
}

impl ToolResult {
    pub fn from_output(output: ToolOutput) -> Self {
        let content = serde_json::to_string_pretty(&output.details)
            .unwrap_or_else(|_| output.details.to_string());
        Self {
            content,
            details: output.details,
            is_error: output.is_error,
        }
    }

    pub fn from_error(message: String, category: &str) -> Self {
        Self {
            content: message.clone(),
            details: json!({ "error": message, "category": category }),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ToolInputSchema {
        ToolInputSchema::new()
            .required("url", ParamKind::String, "URL to fetch")
            .optional("scale", ParamKind::Number, "Uniform scale factor")
            .optional("args", ParamKind::StringArray, "Extra args")
            .optional("import", ParamKind::Boolean, "Import after download")
    }

    #[test]
    fn test_validate_accepts_well_formed_input() {
        let input = json!({ "url": "https://x", "scale": 2.5, "args": ["a"], "import": true });
        assert!(schema().validate(&input).is_ok());
    }

    #[test]
    fn test_validate_missing_required_is_schema_error() {
        let err = schema().validate(&json!({ "scale": 1.0 })).unwrap_err();
        assert!(matches!(err, BridgeError::Schema(_)));
        assert!(err.to_string().contains("'url'"));
    }

    #[test]
    fn test_validate_kind_mismatch_is_schema_error() {
        let err = schema()
            .validate(&json!({ "url": "https://x", "scale": "big" }))
            .unwrap_err();
        assert!(err.to_string().contains("'scale'"));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_validate_string_array_rejects_mixed_items() {
        let err = schema()
            .validate(&json!({ "url": "https://x", "args": ["a", 1] }))
            .unwrap_err();
        assert!(err.to_string().contains("'args'"));
    }

    #[test]
    fn test_validate_ignores_unknown_extras() {
        let input = json!({ "url": "https://x", "future_flag": 42 });
        assert!(schema().validate(&input).is_ok());
    }

    #[test]
    fn test_validate_null_optional_is_absent() {
        let input = json!({ "url": "https://x", "scale": null });
        assert!(schema().validate(&input).is_ok());
    }

    #[test]
    fn test_validate_null_input_with_only_optionals() {
        let only_optional = ToolInputSchema::new().optional("x", ParamKind::String, "x");
        assert!(only_optional.validate(&Value::Null).is_ok());
        assert!(schema().validate(&Value::Null).is_err());
    }

    #[test]
    fn test_to_json_shape() {
        let value = schema().to_json();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["url"]["type"], "string");
        assert_eq!(value["properties"]["args"]["items"]["type"], "string");
        assert_eq!(value["required"], json!(["url"]));
    }

    #[test]
    fn test_result_from_error_envelope() {
        let result = ToolResult::from_error("boom".to_string(), "download");
        assert!(result.is_error);
        assert_eq!(result.details["error"], "boom");
        assert_eq!(result.details["category"], "download");
    }

    #[test]
    fn test_result_from_output_renders_content() {
        let result = ToolResult::from_output(ToolOutput::ok(json!({ "status": "ok" })));
        assert!(!result.is_error);
        assert!(result.content.contains("\"status\""));
    }
}
