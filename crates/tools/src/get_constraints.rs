//! get_constraints: letters already fixed on a clue by crossing clues.

use crate::args::{ClueArgs, clue_schema, decode};
use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ToolError;
use crossclaw_core::tool::ToolResult;

pub struct GetConstraintsTool;

#[async_trait]
impl Tool for GetConstraintsTool {
    fn name(&self) -> &str {
        "get_constraints"
    }

    fn description(&self) -> &str {
        "Get the letters already known for a clue's cells, keyed by zero-based position."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        clue_schema(&[], &[])
    }

    async fn execute(&self, state: &mut SolveState, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ClueArgs = decode(self.name(), arguments)?;
        let id = args.id();
        let constraints = state.puzzle.constraints(id)?;
        let pattern = state.puzzle.pattern(id)?;
        let length = state.puzzle.clue(id)?.length;

        Ok(ToolResult::ok(
            format!("{id} pattern {pattern} ({} of {length} letters known)", constraints.len()),
            serde_json::json!({
                "clue_number": id.number,
                "direction": id.direction,
                "length": length,
                "pattern": pattern,
                "constraints": constraints,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CAT, state};

    #[tokio::test]
    async fn lists_crossing_letters() {
        let mut state = state();
        state.puzzle.set_clue_chars(CAT, &['C', 'A', 'T']).unwrap();
        let args = serde_json::json!({"clue_number": 1, "direction": "down"});
        let result = GetConstraintsTool.execute(&mut state, args).await.unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["constraints"]["0"], "C");
        assert_eq!(data["pattern"], "C__");
        assert_eq!(data["length"], 3);
    }
}
