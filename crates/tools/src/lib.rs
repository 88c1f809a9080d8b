//! Crossword tools for CrossClaw.
//!
//! The tool dispatcher exposes eight named operations over a session's
//! puzzle state. Tools validate and shape results; the puzzle engine does the
//! actual bookkeeping. Answers already tried for a clue are remembered for the
//! life of the session and refused the second time.

pub mod args;
pub mod candidates;
pub mod check_intersection;
pub mod current_grid;
pub mod dispatcher;
pub mod get_constraints;
pub mod registry;
pub mod set_answer;
pub mod state;
pub mod undo_last;
pub mod validate_all;
pub mod validate_clue;

#[cfg(test)]
pub(crate) mod testutil;

pub use dispatcher::{ToolDispatcher, crossword_registry};
pub use registry::{Tool, ToolRegistry};
pub use state::{CandidateBackend, SolveState};
