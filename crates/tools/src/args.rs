//! Argument decoding shared by the crossword tools.

use crossclaw_core::error::ToolError;
use crossclaw_puzzle::{ClueId, Direction};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// The clue identity every clue-scoped tool takes.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClueArgs {
    pub clue_number: u32,
    pub direction: Direction,
}

impl ClueArgs {
    pub fn id(&self) -> ClueId {
        ClueId::new(self.clue_number, self.direction)
    }
}

/// Decode tool arguments, mapping any schema failure to `InvalidArguments`.
pub fn decode<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool}: {e}")))
}

/// JSON Schema properties for `clue_number` and `direction`.
pub fn clue_properties() -> serde_json::Map<String, serde_json::Value> {
    let mut props = serde_json::Map::new();
    props.insert(
        "clue_number".into(),
        serde_json::json!({ "type": "integer", "description": "The clue number" }),
    );
    props.insert(
        "direction".into(),
        serde_json::json!({
            "type": "string",
            "enum": ["across", "down"],
            "description": "Whether the clue runs across or down"
        }),
    );
    props
}

/// Object schema over the clue properties plus `extra`, all listed required
/// except those named in `optional`.
pub fn clue_schema(extra: &[(&str, serde_json::Value)], optional: &[&str]) -> serde_json::Value {
    let mut props = clue_properties();
    for (name, schema) in extra {
        props.insert((*name).to_string(), schema.clone());
    }
    let required: Vec<&String> = props.keys().filter(|k| !optional.contains(&k.as_str())).collect();
    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}
