//! validate_all: aggregate correctness of the whole grid.

use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ToolError;
use crossclaw_core::tool::ToolResult;

pub struct ValidateAllTool;

#[async_trait]
impl Tool for ValidateAllTool {
    fn name(&self) -> &str {
        "validate_all"
    }

    fn description(&self) -> &str {
        "Check whether the whole puzzle is solved correctly and report how many clues are filled."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, state: &mut SolveState, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let puzzle = &state.puzzle;
        let all_valid = puzzle.validate_all();
        let filled = puzzle.filled_count();
        let total = puzzle.total_clues();

        let output = if all_valid {
            "Puzzle solved: every clue is correct".to_string()
        } else {
            format!("Not solved yet: {filled}/{total} clues filled")
        };
        Ok(ToolResult::ok(
            output,
            serde_json::json!({
                "all_valid": all_valid,
                "filled": filled,
                "total": total,
            }),
        ))
    }
}
