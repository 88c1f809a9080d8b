//! The solving loop: the heart of CrossClaw.
//!
//! Each iteration follows the same cycle:
//!
//! 1. **Re-evaluate the phase** from fill progress and reframe the strategy
//! 2. **Compress** the context periodically into a status digest
//! 3. **Call the backend** with the conversation and the tool catalogue
//! 4. **Execute tools** in order, feeding each result back
//! 5. **Check** whether the whole puzzle validates
//!
//! The loop ends when the puzzle validates, the backend stays unavailable
//! after retries, or the iteration budget runs out. Only the first counts as
//! success; none of them is an error.

pub mod context;
pub mod feed;
pub mod listener;
pub mod phase;
pub mod session;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::ContextCompressor;
pub use feed::{EventFeed, EventLog};
pub use listener::{SolveListener, ToolExecution};
pub use phase::{PhaseTracker, PhaseTransition, SolverPhase};
pub use session::{SessionId, SessionInfo, SessionRegistry, SessionStatus};
pub use solver::{CrosswordSolver, SolveOutcome, Termination};
