//! Tool wire types: what the backend asks for and what it gets back.
//!
//! The tool trait and the registry live in `crossclaw-tools`, next to the
//! puzzle state they operate on.

use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::message::MessageToolCall;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Decode the raw argument string the backend produced.
    ///
    /// An empty string is treated as `{}` since several backends omit
    /// arguments for parameterless tools.
    pub fn from_message(tc: &MessageToolCall) -> std::result::Result<Self, ToolError> {
        let raw = tc.arguments.trim();
        let arguments = if raw.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| {
                ToolError::InvalidArguments(format!("arguments for '{}' are not valid JSON: {e}", tc.name))
            })?
        };
        Ok(Self {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments,
        })
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// Human-readable summary
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
            data: Some(data),
        }
    }

    /// A failed result with structured data (the operation ran but said no).
    pub fn failed(output: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            call_id: String::new(),
            success: false,
            output: output.into(),
            data: Some(data),
        }
    }

    /// A failed result built from a tool error.
    pub fn from_error(call_id: impl Into<String>, error: &ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: error.to_string(),
            data: Some(serde_json::json!({ "error": error.kind() })),
        }
    }

    /// The content string sent back to the backend: the structured data with
    /// `success` and `message` folded in.
    pub fn to_content(&self) -> String {
        let mut object = match &self.data {
            Some(serde_json::Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("data".into(), other.clone());
                map
            }
            None => serde_json::Map::new(),
        };
        object.insert("success".into(), serde_json::Value::Bool(self.success));
        object.insert("message".into(), serde_json::Value::String(self.output.clone()));
        serde_json::Value::Object(object).to_string()
    }

    /// The machine-readable error kind, if this result carries one.
    pub fn error_kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("error")?.as_str()
    }
}
