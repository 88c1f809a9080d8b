//! Solving phases and the stall-driven state machine that moves between them.
//!
//! The phase only changes the strategy text the backend sees. Tools and the
//! loop's termination rules are the same in every phase.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverPhase {
    ConstrainedSolving,
    CandidateGeneration,
    ConstraintPropagation,
    Backtracking,
}

impl SolverPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConstrainedSolving => "constrained_solving",
            Self::CandidateGeneration => "candidate_generation",
            Self::ConstraintPropagation => "constraint_propagation",
            Self::Backtracking => "backtracking",
        }
    }

    /// Strategy guidance placed in the system message while in this phase.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::ConstrainedSolving => {
                "Solve the clues you are most confident about first. Prefer clues with \
                 letters already fixed by crossings: call get_constraints, verify with \
                 check_intersection, then set_answer and validate_clue."
            }
            Self::CandidateGeneration => {
                "Progress has stalled. For open clues, call generate_candidates to get \
                 options that fit the known letters, check each with check_intersection, \
                 and commit the best one."
            }
            Self::ConstraintPropagation => {
                "New letters are on the grid. Revisit every clue that crosses a recent \
                 answer, read its pattern with get_constraints and fill the ones the new \
                 letters make obvious."
            }
            Self::Backtracking => {
                "Some placed answers are probably wrong. Use validate_clue on filled clues, \
                 undo_last for ones that fail, and try different answers. Answers you \
                 already tried are rejected."
            }
        }
    }
}

impl fmt::Display for SolverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phase change produced by [`PhaseTracker::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: SolverPhase,
    pub to: SolverPhase,
}

/// Tracks progress across iterations and decides the current phase.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    phase: SolverPhase,
    stall: u32,
    last_filled: usize,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// A tracker whose progress baseline is an already partly filled grid.
    pub fn starting_at(filled: usize) -> Self {
        Self {
            phase: SolverPhase::ConstrainedSolving,
            stall: 0,
            last_filled: filled,
        }
    }

    pub fn phase(&self) -> SolverPhase {
        self.phase
    }

    /// Consecutive evaluations without progress in the current phase.
    pub fn stall(&self) -> u32 {
        self.stall
    }

    /// Feed the filled-clue count after a completed backend turn.
    ///
    /// The stall counter restarts whenever the phase changes, so each phase
    /// gets its full patience before the next move.
    pub fn evaluate(&mut self, filled: usize) -> Option<PhaseTransition> {
        let progress = filled > self.last_filled;
        let gained = filled.saturating_sub(self.last_filled);
        self.last_filled = filled;
        if progress {
            self.stall = 0;
        } else {
            self.stall += 1;
        }

        let next = match self.phase {
            SolverPhase::ConstrainedSolving if self.stall >= 5 => SolverPhase::CandidateGeneration,
            SolverPhase::CandidateGeneration if progress => SolverPhase::ConstraintPropagation,
            SolverPhase::CandidateGeneration if self.stall >= 10 => SolverPhase::Backtracking,
            SolverPhase::ConstraintPropagation if self.stall >= 5 => SolverPhase::Backtracking,
            SolverPhase::ConstraintPropagation if gained > 2 => SolverPhase::ConstrainedSolving,
            SolverPhase::Backtracking if progress || self.stall >= 8 => SolverPhase::CandidateGeneration,
            current => current,
        };

        if next == self.phase {
            return None;
        }
        let transition = PhaseTransition { from: self.phase, to: next };
        self.phase = next;
        self.stall = 0;
        Some(transition)
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
