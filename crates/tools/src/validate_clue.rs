//! validate_clue: check one clue against its reference answer.

use crate::args::{ClueArgs, clue_schema, decode};
use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ToolError;
use crossclaw_core::tool::ToolResult;

pub struct ValidateClueTool;

#[async_trait]
impl Tool for ValidateClueTool {
    fn name(&self) -> &str {
        "validate_clue"
    }

    fn description(&self) -> &str {
        "Check whether the letters currently on a clue's cells are the correct answer."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        clue_schema(&[], &[])
    }

    async fn execute(&self, state: &mut SolveState, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ClueArgs = decode(self.name(), arguments)?;
        let id = args.id();
        let valid = state.puzzle.validate_clue_chars(id)?;
        let current = state.puzzle.current_answer(id)?;

        let output = if valid {
            format!("{id} '{current}' is correct")
        } else {
            format!("{id} '{current}' is not correct")
        };
        Ok(ToolResult::ok(
            output,
            serde_json::json!({
                "clue_number": id.number,
                "direction": id.direction,
                "current": current,
                "valid": valid,
            }),
        ))
    }
}
