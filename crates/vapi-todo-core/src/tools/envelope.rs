//! Tool-call request and response envelopes.
//!
//! Request: `{"message": {"toolCalls": [{"id", "function": {"name", "arguments"}}]}}`
//! Response: `{"results": [{"toolCallId", "result"}]}`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub message: Message,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(rename = "toolCalls")]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: RawArguments,
}

/// Arguments arrive either as an object or as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawArguments {
    Object(Map<String, Value>),
    Encoded(String),
}

impl Default for RawArguments {
    fn default() -> Self {
        RawArguments::Object(Map::new())
    }
}

impl ToolRequest {
    /// Parse a request body. Empty, `null` and `{}` bodies are rejected
    /// before the envelope shape is checked.
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::EmptyPayload);
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedEnvelope(e.to_string()))?;
        match &value {
            Value::Null => return Err(ValidationError::EmptyPayload),
            Value::Object(map) if map.is_empty() => return Err(ValidationError::EmptyPayload),
            _ => {}
        }
        serde_json::from_value(value).map_err(|e| ValidationError::MalformedEnvelope(e.to_string()))
    }

    /// First tool call named `name`.
    pub fn find(&self, name: &str) -> Result<&ToolCall, ValidationError> {
        self.message
            .tool_calls
            .iter()
            .find(|call| call.function.name == name)
            .ok_or_else(|| ValidationError::ToolCallNotFound(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub results: Vec<ToolResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    #[serde(rename = "toolCallId")]
    pub tool_call_id: String,
    pub result: Value,
}

impl ToolResponse {
    pub fn single(tool_call_id: impl Into<String>, result: Value) -> Self {
        Self {
            results: vec![ToolResult {
                tool_call_id: tool_call_id.into(),
                result,
            }],
        }
    }
}
