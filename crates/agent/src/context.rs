//! Interaction context: system framing, puzzle description, and compression.

use crate::phase::SolverPhase;
use crossclaw_core::message::Conversation;
use crossclaw_puzzle::{ClueId, Puzzle};

const ROLE_FRAMING: &str = "You are an expert crossword solver working through a puzzle with tools. \
You cannot see the grid except through tool results.";

const TOOL_DISCIPLINE: &str = "Rules:
- Always use tools; the puzzle only changes through set_answer and undo_last.
- Before set_answer, call check_intersection to make sure the answer agrees with crossing letters.
- After set_answer, call validate_clue to confirm it.
- An answer you already tried for a clue is rejected; pick a different one.
- Stop only when validate_all reports the whole puzzle is correct.";

/// Build the system message for a phase.
pub fn system_prompt(phase: SolverPhase) -> String {
    format!(
        "{ROLE_FRAMING}\n\n{TOOL_DISCIPLINE}\n\nCurrent phase: {}\n{}",
        phase.as_str(),
        phase.strategy()
    )
}

/// The opening user message: dimensions plus the clue lists.
pub fn puzzle_description(puzzle: &Puzzle) -> String {
    format!(
        "Solve this {}x{} crossword \"{}\" ({} clues).\n\n{}",
        puzzle.grid().width(),
        puzzle.grid().height(),
        puzzle.title(),
        puzzle.total_clues(),
        puzzle.clue_listing()
    )
}

fn join_ids(ids: &[ClueId]) -> String {
    if ids.is_empty() {
        return "none".into();
    }
    ids.iter().map(ClueId::to_string).collect::<Vec<_>>().join(", ")
}

/// Status digest that replaces verbatim history on compression.
pub fn status_digest(puzzle: &Puzzle) -> String {
    format!(
        "Progress so far: {}/{} clues filled.\nFilled: {}\nRemaining: {}\n\nCurrent grid:\n{}\n\n\
         Continue solving the remaining clues with the tools.",
        puzzle.filled_count(),
        puzzle.total_clues(),
        join_ids(&puzzle.answered_ids()),
        join_ids(&puzzle.unanswered_ids()),
        puzzle.render()
    )
}

/// Sent when the backend replies without calling a tool.
pub fn silence_reminder(puzzle: &Puzzle) -> String {
    let remaining = puzzle.unanswered_ids();
    if remaining.is_empty() {
        return "Every clue is filled but validate_all does not pass yet. Use validate_clue to find \
                wrong answers and fix them with undo_last and set_answer."
            .into();
    }
    format!(
        "The puzzle is not solved yet. {} clues remain: {}. Keep going with the tools.",
        remaining.len(),
        join_ids(&remaining)
    )
}

/// Periodic collapse of the conversation into a status digest.
#[derive(Debug, Clone, Copy)]
pub struct ContextCompressor {
    every: u32,
    threshold: usize,
}

impl ContextCompressor {
    pub fn new(every: u32, threshold: usize) -> Self {
        Self {
            every: every.max(1),
            threshold,
        }
    }

    /// `iteration` is zero-based.
    pub fn should_compress(&self, iteration: u32, messages: usize) -> bool {
        iteration > 0 && iteration % self.every == 0 && messages >= self.threshold
    }

    /// Collapse to `[system, digest]`. Returns the number of messages dropped.
    pub fn compress(&self, conversation: &mut Conversation, puzzle: &Puzzle) -> usize {
        let before = conversation.len();
        conversation.collapse(status_digest(puzzle));
        before.saturating_sub(conversation.len())
    }
}

impl Default for ContextCompressor {
    fn default() -> Self {
        Self::new(15, 50)
    }
}
