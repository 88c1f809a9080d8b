//! Tool dispatcher: routes named calls to the crossword tools.
//!
//! Every outcome, including unknown tools and malformed arguments, comes back
//! as a [`ToolResult`] so the orchestrator can hand it to the backend and let
//! the agent correct itself.

use crate::registry::ToolRegistry;
use crate::state::{CandidateBackend, SolveState};
use crate::{
    candidates::GenerateCandidatesTool, check_intersection::CheckIntersectionTool,
    current_grid::CurrentGridTool, get_constraints::GetConstraintsTool,
    set_answer::SetAnswerTool, undo_last::UndoLastTool, validate_all::ValidateAllTool,
    validate_clue::ValidateClueTool,
};
use crossclaw_core::error::ToolError;
use crossclaw_core::provider::ToolDefinition;
use crossclaw_core::tool::{ToolCall, ToolResult};
use crossclaw_puzzle::Puzzle;
use tracing::debug;

/// The eight crossword tools, in catalogue order.
pub fn crossword_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SetAnswerTool));
    registry.register(Box::new(ValidateClueTool));
    registry.register(Box::new(ValidateAllTool));
    registry.register(Box::new(CheckIntersectionTool));
    registry.register(Box::new(GetConstraintsTool));
    registry.register(Box::new(UndoLastTool));
    registry.register(Box::new(CurrentGridTool));
    registry.register(Box::new(GenerateCandidatesTool));
    registry
}

/// Owns one session's puzzle state and executes tool calls against it.
pub struct ToolDispatcher {
    registry: ToolRegistry,
    state: SolveState,
    call_count: u64,
}

impl ToolDispatcher {
    pub fn new(puzzle: Puzzle) -> Self {
        Self {
            registry: crossword_registry(),
            state: SolveState::new(puzzle),
            call_count: 0,
        }
    }

    /// Enable `generate_candidates` against the given backend.
    pub fn with_candidate_backend(mut self, backend: CandidateBackend) -> Self {
        self.state.candidates = Some(backend);
        self
    }

    /// Tool catalogue for the backend.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call. Never fails; errors become error-flagged results.
    pub async fn dispatch(&mut self, call: &ToolCall) -> ToolResult {
        self.call_count += 1;
        let outcome = match self.registry.get(&call.name) {
            Some(tool) => tool.execute(&mut self.state, call.arguments.clone()).await,
            None => Err(ToolError::NotFound(call.name.clone())),
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => ToolResult::from_error(&call.id, &e),
        };
        result.call_id = call.id.clone();

        debug!(
            tool = %call.name,
            call = self.call_count,
            success = result.success,
            "Tool dispatched"
        );
        result
    }

    /// Count and report a call that could not even be decoded.
    pub fn reject(&mut self, call_id: &str, tool_name: &str, error: ToolError) -> ToolResult {
        self.call_count += 1;
        debug!(tool = %tool_name, call = self.call_count, error = %error, "Tool call rejected");
        ToolResult::from_error(call_id, &error)
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.state.puzzle
    }

    pub fn state(&self) -> &SolveState {
        &self.state
    }

    /// Monotonic count of every call routed through this dispatcher.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn into_puzzle(self) -> Puzzle {
        self.state.puzzle
    }
}
