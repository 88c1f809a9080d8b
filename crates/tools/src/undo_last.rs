//! undo_last: revert the most recent write.

use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ToolError;
use crossclaw_core::tool::ToolResult;

pub struct UndoLastTool;

#[async_trait]
impl Tool for UndoLastTool {
    fn name(&self) -> &str {
        "undo_last"
    }

    fn description(&self) -> &str {
        "Undo the most recent set_answer, restoring the cells it changed. \
         Previously tried answers stay blocked."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, state: &mut SolveState, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let id = state.puzzle.undo()?;
        let current = state.puzzle.current_answer(id)?;
        Ok(ToolResult::ok(
            format!("Undid last write to {id}, now '{current}'"),
            serde_json::json!({
                "clue_number": id.number,
                "direction": id.direction,
                "current": current,
                "remaining_history": state.puzzle.history_len(),
            }),
        ))
    }
}
