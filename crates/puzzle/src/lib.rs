//! # CrossClaw Puzzle
//!
//! The crossword state engine: a shared grid of cells, clues that reference
//! positions into it, and the write/undo/validate operations the solver's
//! tools are built on.
//!
//! Intersections need no separate consistency check. Both clues read the
//! same cell, so a letter written through one is what the other sees.

pub mod engine;
pub mod model;
pub mod render;
pub mod source;

pub use engine::{BLANK, Compatibility, canonical_letter, Conflict, Puzzle, UndoRecord};
pub use model::{Cell, Clue, ClueId, Direction, Grid, Position};
pub use render::BLOCKED;
pub use source::{ClueSource, PuzzleSource};
