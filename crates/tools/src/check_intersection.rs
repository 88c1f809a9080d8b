//! check_intersection: compare a proposal with crossing letters, without writing.

use crate::args::{ClueArgs, clue_schema, decode};
use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ToolError;
use crossclaw_core::tool::ToolResult;
use serde::Deserialize;

pub struct CheckIntersectionTool;

#[derive(Deserialize)]
struct Args {
    #[serde(flatten)]
    clue: ClueArgs,
    proposed_answer: String,
}

#[async_trait]
impl Tool for CheckIntersectionTool {
    fn name(&self) -> &str {
        "check_intersection"
    }

    fn description(&self) -> &str {
        "Check if a proposed answer is compatible with letters already placed by intersecting clues. \
         Use this BEFORE set_answer to avoid conflicts."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        clue_schema(
            &[(
                "proposed_answer",
                serde_json::json!({ "type": "string", "description": "The answer to check" }),
            )],
            &[],
        )
    }

    async fn execute(&self, state: &mut SolveState, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = decode(self.name(), arguments)?;
        let id = args.clue.id();
        let proposed = args.proposed_answer.trim().to_uppercase();
        let report = state.puzzle.check_compatibility(id, &proposed)?;

        let output = if report.compatible {
            format!("'{proposed}' is compatible with {id}")
        } else if let Some(reason) = &report.reason {
            format!("'{proposed}' conflicts: {reason}")
        } else {
            let details: Vec<String> = report
                .conflicts
                .iter()
                .map(|c| format!("position {} needs '{}' not '{}'", c.position, c.required_letter, c.proposed_letter))
                .collect();
            format!("'{proposed}' conflicts: {}", details.join(", "))
        };

        let mut data = serde_json::to_value(&report).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })?;
        data["clue_number"] = serde_json::json!(id.number);
        data["direction"] = serde_json::json!(id.direction);
        data["proposed_answer"] = serde_json::json!(proposed);
        Ok(ToolResult::ok(output, data))
    }
}
