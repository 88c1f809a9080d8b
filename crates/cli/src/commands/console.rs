//! Plain progress lines for a terminal.

use crossclaw_agent::{PhaseTransition, SolveListener, SolveOutcome, ToolExecution};
use crossclaw_puzzle::Puzzle;

pub struct ConsoleListener;

impl SolveListener for ConsoleListener {
    fn on_session_started(&self, puzzle: &Puzzle) {
        println!("Solving \"{}\" ({} clues)", puzzle.title(), puzzle.total_clues());
    }

    fn on_tool_executed(&self, execution: &ToolExecution<'_>) {
        println!("{}", tool_line(execution));
    }

    fn on_phase_changed(&self, transition: PhaseTransition, iteration: u32) {
        println!("[{:>3}] phase {} -> {}", iteration + 1, transition.from, transition.to);
    }
}

pub fn tool_line(execution: &ToolExecution<'_>) -> String {
    let status = if execution.result.success { "ok " } else { "err" };
    format!(
        "[{:>3}] {status} {}: {} ({}/{})",
        execution.iteration + 1,
        execution.call.name,
        execution.result.output,
        execution.puzzle.filled_count(),
        execution.puzzle.total_clues()
    )
}

pub fn summary_line(outcome: &SolveOutcome) -> String {
    let stats = format!(
        "{} iterations, {} tool calls, {}/{} clues filled ({:.1}%), {:.1}s",
        outcome.iterations,
        outcome.tool_calls,
        outcome.filled,
        outcome.total,
        outcome.fill_ratio * 100.0,
        outcome.elapsed.as_secs_f64()
    );
    if outcome.success {
        format!("Solved: {stats}")
    } else {
        format!("Not solved ({}): {stats}", outcome.termination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossclaw_agent::Termination;
    use crossclaw_core::tool::{ToolCall, ToolResult};
    use std::time::Duration;

    fn outcome(termination: Termination) -> SolveOutcome {
        SolveOutcome {
            success: termination == Termination::Solved,
            iterations: 400,
            tool_calls: 812,
            filled: 3,
            total: 4,
            fill_ratio: 0.75,
            elapsed: Duration::from_millis(1500),
            termination,
        }
    }

    #[test]
    fn summary_reports_bounded_failure() {
        let line = summary_line(&outcome(Termination::IterationBudget));
        assert_eq!(
            line,
            "Not solved (iteration budget exhausted): 400 iterations, 812 tool calls, 3/4 clues filled (75.0%), 1.5s"
        );
        assert!(summary_line(&outcome(Termination::Solved)).starts_with("Solved: "));
    }

    #[test]
    fn tool_line_shows_status_and_fill() {
        let puzzle = Puzzle::from_json(
            r#"{"width": 3, "height": 1, "clues": [
                {"number": 1, "direction": "across", "text": "Feline", "row": 0, "col": 0, "answer": "CAT"}
            ]}"#,
        )
        .unwrap();
        let call = ToolCall {
            id: "c1".into(),
            name: "undo_last".into(),
            arguments: serde_json::json!({}),
        };
        let result = ToolResult::failed("Nothing to undo", serde_json::json!({"error": "empty_history"}));
        let line = tool_line(&ToolExecution {
            iteration: 6,
            call: &call,
            result: &result,
            puzzle: &puzzle,
            duration: Duration::ZERO,
        });
        assert_eq!(line, "[  7] err undo_last: Nothing to undo (0/1)");
    }
}
