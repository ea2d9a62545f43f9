// ABOUTME: Tool abstractions: catalog specs, argument conventions, and normalized results
// ABOUTME: Defines the polymorphic Tool trait the orchestrator dispatches against

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use calq_sandbox::{DisplayData, ExecutionRecord};

use crate::error::DispatchError;

/// Schema of one named tool parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
}

/// JSON-Schema-shaped object-parameter description. This exact shape is
/// the wire contract with the model client and must not drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, ParameterSpec>,
    pub required: Vec<String>,
}

/// Tool declaration advertised to the model. Immutable once the catalog
/// is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters {
                schema_type: "object".to_string(),
                properties: BTreeMap::new(),
                required: Vec::new(),
            },
        }
    }

    /// Declare a named parameter
    pub fn parameter(
        mut self,
        name: &str,
        param_type: &str,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameters.properties.insert(
            name.to_string(),
            ParameterSpec {
                param_type: param_type.to_string(),
                description: description.to_string(),
            },
        );
        if required {
            self.parameters.required.push(name.to_string());
        }
        self
    }
}

/// How a tool's argument payload is shaped on the wire.
///
/// Selected per tool registration: most providers send a JSON-encoded
/// argument object, while legacy code-interpreter tools pass the code
/// itself as the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentConvention {
    Structured,
    RawString,
}

/// Argument payload after convention-aware extraction
#[derive(Debug, Clone)]
pub enum ToolPayload {
    Structured(serde_json::Map<String, Value>),
    Raw(String),
}

impl ToolPayload {
    /// Fetch a required string argument. For raw-convention payloads the
    /// whole payload is the value.
    pub fn str_field(&self, name: &str) -> std::result::Result<&str, DispatchError> {
        match self {
            ToolPayload::Raw(value) => Ok(value),
            ToolPayload::Structured(map) => map
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| DispatchError::MissingArgument(name.to_string())),
        }
    }
}

/// Normalized result of one tool invocation, serialized as JSON text
/// into the answering tool message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: String,
    #[serde(default)]
    pub display_data: Vec<DisplayData>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn from_output(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    /// Error result formatted as `<ErrorKind>: <message>`
    pub fn from_error(kind: &str, message: impl std::fmt::Display) -> Self {
        Self {
            error: Some(format!("{}: {}", kind, message)),
            ..Self::default()
        }
    }

    /// Serialize for the tool message content field
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"output":"","display_data":[],"error":"SerializationError: {}"}}"#, e))
    }
}

impl From<ExecutionRecord> for ToolResult {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            output: record.output,
            display_data: record.display_data,
            error: record.error,
        }
    }
}

/// A named capability the model can invoke.
///
/// Implementations are registered in a [`ToolRegistry`](crate::registry::ToolRegistry)
/// and dispatched by name; the orchestrator is agnostic to which
/// concrete tools exist.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Catalog declaration advertised to the model
    fn spec(&self) -> ToolSpec;

    /// Argument extraction convention for this registration
    fn convention(&self) -> ArgumentConvention {
        ArgumentConvention::Structured
    }

    /// Run the tool. Dispatch-level failures are recoverable: the
    /// orchestrator converts them into error results and the loop
    /// continues.
    async fn invoke(&self, payload: ToolPayload) -> std::result::Result<ToolResult, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn spec_serializes_to_catalog_wire_shape() {
        let spec = ToolSpec::new("get_current_weather", "Get the weather of a city")
            .parameter("city", "string", "The city name, e.g. San Francisco", true)
            .parameter("date", "string", "The date of the weather", true);

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "name": "get_current_weather",
                "description": "Get the weather of a city",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "city": {"type": "string", "description": "The city name, e.g. San Francisco"},
                        "date": {"type": "string", "description": "The date of the weather"}
                    },
                    "required": ["city", "date"]
                }
            })
        );
    }

    #[test]
    fn optional_parameters_stay_out_of_required() {
        let spec = ToolSpec::new("search", "Search the corpus")
            .parameter("query", "string", "Search query", true)
            .parameter("limit", "integer", "Max results", false);

        assert_eq!(spec.parameters.required, vec!["query".to_string()]);
        assert_eq!(spec.parameters.properties.len(), 2);
    }

    #[test]
    fn tool_result_round_trips_through_wire_format() {
        let mut bundle = DisplayData::new();
        bundle.insert("image/png".to_string(), json!("aGVsbG8="));
        let result = ToolResult {
            output: "done".to_string(),
            display_data: vec![bundle],
            error: Some("ValueError: bad input".to_string()),
        };

        let parsed: ToolResult = serde_json::from_str(&result.to_wire()).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn error_result_is_kind_prefixed() {
        let result = ToolResult::from_error("DispatchError", "tool not found: foo");
        assert_eq!(
            result.error.as_deref(),
            Some("DispatchError: tool not found: foo")
        );
        assert!(result.output.is_empty());
    }

    #[test]
    fn structured_payload_extracts_named_field() {
        let mut map = serde_json::Map::new();
        map.insert("code".to_string(), json!("x = 1"));
        let payload = ToolPayload::Structured(map);
        assert_eq!(payload.str_field("code").unwrap(), "x = 1");
    }

    #[test]
    fn missing_field_is_a_dispatch_error() {
        let payload = ToolPayload::Structured(serde_json::Map::new());
        assert!(matches!(
            payload.str_field("code"),
            Err(DispatchError::MissingArgument(_))
        ));
    }

    #[test]
    fn raw_payload_is_the_whole_value() {
        let payload = ToolPayload::Raw("print('hi')".to_string());
        assert_eq!(payload.str_field("code").unwrap(), "print('hi')");
    }
}
