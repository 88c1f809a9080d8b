//! Observer interface for the solving loop.
//!
//! Listeners are registered on the solver and called synchronously, in
//! registration order, from inside the loop. They must not block.

use crate::phase::PhaseTransition;
use crate::solver::SolveOutcome;
use crossclaw_core::tool::{ToolCall, ToolResult};
use crossclaw_puzzle::Puzzle;
use std::time::Duration;

/// One executed tool call, with the puzzle as it stands afterwards.
pub struct ToolExecution<'a> {
    /// Zero-based loop iteration the call belongs to
    pub iteration: u32,
    pub call: &'a ToolCall,
    pub result: &'a ToolResult,
    pub puzzle: &'a Puzzle,
    pub duration: Duration,
}

pub trait SolveListener: Send + Sync {
    fn on_session_started(&self, _puzzle: &Puzzle) {}

    /// Called after every tool call, including rejected ones.
    fn on_tool_executed(&self, _execution: &ToolExecution<'_>) {}

    fn on_phase_changed(&self, _transition: PhaseTransition, _iteration: u32) {}

    fn on_session_finished(&self, _outcome: &SolveOutcome, _puzzle: &Puzzle) {}
}
