//! set_answer: write an answer into the grid, once per (clue, answer).

use crate::args::{ClueArgs, clue_schema, decode};
use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::{PuzzleError, ToolError};
use crossclaw_core::tool::ToolResult;
use serde::Deserialize;

pub struct SetAnswerTool;

#[derive(Deserialize)]
struct Args {
    #[serde(flatten)]
    clue: ClueArgs,
    answer: String,
}

#[async_trait]
impl Tool for SetAnswerTool {
    fn name(&self) -> &str {
        "set_answer"
    }

    fn description(&self) -> &str {
        "Write an answer for a clue into the grid. Overwrites letters on the clue's cells. \
         Each answer can only be tried once per clue."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        clue_schema(
            &[(
                "answer",
                serde_json::json!({ "type": "string", "description": "The answer, one letter per cell" }),
            )],
            &[],
        )
    }

    async fn execute(&self, state: &mut SolveState, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = decode(self.name(), arguments)?;
        let id = args.clue.id();
        state.puzzle.clue(id)?;

        let answer = args.answer.trim().to_uppercase();
        if let Some(letter) = answer.chars().find(|c| !c.is_alphabetic()) {
            return Err(PuzzleError::InvalidLetter {
                clue: id.to_string(),
                letter,
            }
            .into());
        }
        // Recorded before the write so rejected lengths are remembered too
        if !state.record_attempt(id, &answer) {
            return Err(ToolError::DuplicateAttempt {
                clue: id.to_string(),
                answer,
            });
        }

        let chars: Vec<char> = answer.chars().collect();
        state.puzzle.set_clue_chars(id, &chars)?;

        Ok(ToolResult::ok(
            format!("Set {id} to '{answer}'"),
            serde_json::json!({
                "clue_number": id.number,
                "direction": id.direction,
                "answer": answer,
                "filled": state.puzzle.filled_count(),
                "total": state.puzzle.total_clues(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CAT, COW, state};

    fn args(number: u32, direction: &str, answer: &str) -> serde_json::Value {
        serde_json::json!({"clue_number": number, "direction": direction, "answer": answer})
    }

    #[tokio::test]
    async fn writes_normalised_answer() {
        let mut state = state();
        let result = SetAnswerTool.execute(&mut state, args(1, "across", " cat ")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.data.as_ref().unwrap()["answer"], "CAT");
        assert_eq!(state.puzzle.current_answer(CAT).unwrap(), "CAT");
    }

    #[tokio::test]
    async fn duplicate_attempt_is_rejected_without_mutation() {
        let mut state = state();
        SetAnswerTool.execute(&mut state, args(1, "down", "BOW")).await.unwrap();
        state.puzzle.undo().unwrap();

        let err = SetAnswerTool.execute(&mut state, args(1, "down", "bow")).await.unwrap_err();
        assert!(matches!(err, ToolError::DuplicateAttempt { .. }));
        assert_eq!(state.puzzle.current_answer(COW).unwrap(), "___");
        assert_eq!(state.puzzle.history_len(), 0);
    }

    #[tokio::test]
    async fn length_mismatch_is_remembered() {
        let mut state = state();
        let err = SetAnswerTool.execute(&mut state, args(1, "across", "CATS")).await.unwrap_err();
        assert_eq!(err.kind(), "length_mismatch");
        assert!(state.has_attempted(CAT, "CATS"));
        let again = SetAnswerTool.execute(&mut state, args(1, "across", "CATS")).await.unwrap_err();
        assert_eq!(again.kind(), "duplicate_attempt");
    }

    #[tokio::test]
    async fn spaced_answer_is_rejected_without_mutation() {
        let mut state = state();
        let err = SetAnswerTool.execute(&mut state, args(1, "across", "C T")).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_letter");
        assert!(!state.has_attempted(CAT, "C T"));
        assert_eq!(state.puzzle.current_answer(CAT).unwrap(), "___");
        assert_eq!(state.puzzle.history_len(), 0);
        assert_eq!(state.puzzle.filled_count(), 0);

        let err = SetAnswerTool.execute(&mut state, args(1, "across", "C_T")).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_letter");
        assert!(state.puzzle.constraints(COW).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_clue_is_not_recorded() {
        let mut state = state();
        let err = SetAnswerTool.execute(&mut state, args(7, "across", "CAT")).await.unwrap_err();
        assert_eq!(err.kind(), "clue_not_found");
    }
}
