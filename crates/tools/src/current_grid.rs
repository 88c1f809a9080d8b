//! get_current_grid: rendered grid plus answered/unanswered clue lists.

use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ToolError;
use crossclaw_core::tool::ToolResult;

pub struct CurrentGridTool;

#[async_trait]
impl Tool for CurrentGridTool {
    fn name(&self) -> &str {
        "get_current_grid"
    }

    fn description(&self) -> &str {
        "Show the grid ('_' = empty, '#' = blocked) and which clues are filled or still open."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, state: &mut SolveState, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let puzzle = &state.puzzle;
        let grid = puzzle.render();
        let solved: Vec<String> = puzzle.answered_ids().iter().map(ToString::to_string).collect();
        let unsolved: Vec<String> = puzzle.unanswered_ids().iter().map(ToString::to_string).collect();

        Ok(ToolResult::ok(
            format!("{}/{} clues filled\n{grid}", solved.len(), puzzle.total_clues()),
            serde_json::json!({
                "grid": grid,
                "solved": solved,
                "unsolved": unsolved,
                "filled": puzzle.filled_count(),
                "total": puzzle.total_clues(),
            }),
        ))
    }
}
