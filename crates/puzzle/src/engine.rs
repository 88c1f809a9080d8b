//! Puzzle engine: mutation, undo and validation on top of the model.
//!
//! The engine has exactly one caller (the tool dispatcher of a single
//! session), so it takes `&mut self` and does no locking.

use crate::model::{Clue, ClueId, Grid, Position};
use crossclaw_core::PuzzleError;
use crossclaw_core::event::{CellView, ClueView};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Placeholder for an empty cell in answer strings and renders.
pub const BLANK: char = '_';

/// Upper-case form of a letter, or `None` for anything that isn't one.
///
/// Letters whose upper case spans several chars (`ß`) are kept as written.
pub fn canonical_letter(ch: char) -> Option<char> {
    if !ch.is_alphabetic() {
        return None;
    }
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => Some(single),
        _ => Some(ch),
    }
}

/// Pre-write values of the cells one write touched.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub clue: ClueId,
    pub prior: Vec<(Position, Option<char>)>,
}

/// A letter already on the grid that disagrees with a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Zero-based index within the answer
    pub position: usize,
    pub proposed_letter: char,
    pub required_letter: char,
    pub grid_position: Position,
}

/// Result of comparing a proposed answer against the grid without writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compatibility {
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub conflicts: Vec<Conflict>,
    /// Letters already fixed on the light, keyed by answer index
    pub constraints: BTreeMap<usize, char>,
}

/// A crossword puzzle: the shared grid, its clues and the undo history.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub(crate) title: String,
    pub(crate) grid: Grid,
    pub(crate) clues: Vec<Clue>,
    pub(crate) history: Vec<UndoRecord>,
}

impl Puzzle {
    /// Assemble a puzzle from a blank grid and its clues.
    ///
    /// Every light is marked playable. Geometry is checked by the source
    /// loader; this constructor only requires the clues to fit the grid.
    pub fn new(title: impl Into<String>, mut grid: Grid, clues: Vec<Clue>) -> Result<Self, PuzzleError> {
        for clue in &clues {
            for pos in clue.cells() {
                if !grid.contains(pos) {
                    return Err(PuzzleError::InvalidSource(format!(
                        "clue {} runs off the grid at {pos}",
                        clue.id
                    )));
                }
                grid.mark_playable(pos);
            }
        }
        Ok(Self {
            title: title.into(),
            grid,
            clues,
            history: Vec::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    pub fn clue(&self, id: ClueId) -> Result<&Clue, PuzzleError> {
        self.clues
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| PuzzleError::ClueNotFound(id.to_string()))
    }

    /// Number of pending undo records.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Write `chars` along the clue's light, one letter per cell.
    ///
    /// Overwrites whatever is there, including letters placed by crossing
    /// clues. Pushes exactly one undo record. Non-letters are rejected
    /// before anything is written.
    pub fn set_clue_chars(&mut self, id: ClueId, chars: &[char]) -> Result<(), PuzzleError> {
        let clue = self.clue(id)?;
        if chars.len() != clue.length {
            return Err(PuzzleError::LengthMismatch {
                clue: id.to_string(),
                expected: clue.length,
                actual: chars.len(),
            });
        }
        let letters = chars
            .iter()
            .map(|&ch| {
                canonical_letter(ch).ok_or_else(|| PuzzleError::InvalidLetter {
                    clue: id.to_string(),
                    letter: ch,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let cells = clue.cells();
        let prior = cells.iter().map(|&p| (p, self.grid.value(p))).collect();
        for (&pos, letter) in cells.iter().zip(letters) {
            self.grid.set_value(pos, Some(letter));
        }
        self.history.push(UndoRecord { clue: id, prior });
        debug!(clue = %id, history = self.history.len(), "Clue written");
        Ok(())
    }

    /// Current per-cell values of the light; `None` for empty cells.
    pub fn get_current_clue_chars(&self, id: ClueId) -> Result<Vec<Option<char>>, PuzzleError> {
        let clue = self.clue(id)?;
        Ok(clue.cells().into_iter().map(|p| self.grid.value(p)).collect())
    }

    /// The light as a string, with [`BLANK`] for empty cells.
    pub fn current_answer(&self, id: ClueId) -> Result<String, PuzzleError> {
        Ok(self
            .get_current_clue_chars(id)?
            .into_iter()
            .map(|c| c.unwrap_or(BLANK))
            .collect())
    }

    /// True when the light matches the reference answer exactly.
    pub fn validate_clue_chars(&self, id: ClueId) -> Result<bool, PuzzleError> {
        let clue = self.clue(id)?;
        Ok(self.clue_matches(clue))
    }

    fn clue_matches(&self, clue: &Clue) -> bool {
        clue.cells()
            .into_iter()
            .zip(clue.solution().chars())
            .all(|(pos, expected)| {
                self.grid
                    .value(pos)
                    .is_some_and(|v| canonical_letter(v).unwrap_or(v) == canonical_letter(expected).unwrap_or(expected))
            })
    }

    /// True when every clue validates.
    pub fn validate_all(&self) -> bool {
        self.clues.iter().all(|c| self.clue_matches(c))
    }

    /// Revert the most recent write. Returns the clue that write targeted.
    pub fn undo(&mut self) -> Result<ClueId, PuzzleError> {
        let record = self.history.pop().ok_or(PuzzleError::EmptyHistory)?;
        for (pos, value) in record.prior {
            self.grid.set_value(pos, value);
        }
        debug!(clue = %record.clue, history = self.history.len(), "Write undone");
        Ok(record.clue)
    }

    /// Compare a proposed answer against letters already on the light.
    /// Pure read.
    pub fn check_compatibility(&self, id: ClueId, proposed: &str) -> Result<Compatibility, PuzzleError> {
        let clue = self.clue(id)?;
        let proposed: Vec<char> = proposed.trim().to_uppercase().chars().collect();
        if proposed.len() != clue.length {
            return Ok(Compatibility {
                compatible: false,
                reason: Some(format!(
                    "Length mismatch: answer has {} letters, clue needs {}",
                    proposed.len(),
                    clue.length
                )),
                conflicts: Vec::new(),
                constraints: BTreeMap::new(),
            });
        }

        let mut conflicts = Vec::new();
        let mut constraints = BTreeMap::new();
        for (i, pos) in clue.cells().into_iter().enumerate() {
            if let Some(current) = self.grid.value(pos) {
                constraints.insert(i, current);
                if proposed[i] != current {
                    conflicts.push(Conflict {
                        position: i,
                        proposed_letter: proposed[i],
                        required_letter: current,
                        grid_position: pos,
                    });
                }
            }
        }
        Ok(Compatibility {
            compatible: conflicts.is_empty(),
            reason: None,
            conflicts,
            constraints,
        })
    }

    /// Known letters on the light, keyed by answer index.
    pub fn constraints(&self, id: ClueId) -> Result<BTreeMap<usize, char>, PuzzleError> {
        Ok(self
            .get_current_clue_chars(id)?
            .into_iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (i, c)))
            .collect())
    }

    /// Pattern string for the light, e.g. `C_T`.
    pub fn pattern(&self, id: ClueId) -> Result<String, PuzzleError> {
        self.current_answer(id)
    }

    pub fn is_answered(&self, id: ClueId) -> Result<bool, PuzzleError> {
        Ok(self.clue(id)?.is_answered(&self.grid))
    }

    /// Number of clues whose light is completely filled.
    pub fn filled_count(&self) -> usize {
        self.clues.iter().filter(|c| c.is_answered(&self.grid)).count()
    }

    pub fn total_clues(&self) -> usize {
        self.clues.len()
    }

    pub fn fill_ratio(&self) -> f64 {
        if self.clues.is_empty() {
            return 1.0;
        }
        self.filled_count() as f64 / self.clues.len() as f64
    }

    pub fn answered_ids(&self) -> Vec<ClueId> {
        self.clues
            .iter()
            .filter(|c| c.is_answered(&self.grid))
            .map(|c| c.id)
            .collect()
    }

    pub fn unanswered_ids(&self) -> Vec<ClueId> {
        self.clues
            .iter()
            .filter(|c| !c.is_answered(&self.grid))
            .map(|c| c.id)
            .collect()
    }

    /// Observer snapshot of the grid.
    pub fn cell_views(&self) -> Vec<Vec<CellView>> {
        self.grid
            .rows()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| CellView {
                        row,
                        col,
                        value: cell.value,
                        active: cell.playable,
                    })
                    .collect()
            })
            .collect()
    }

    /// Observer snapshot of the clues.
    pub fn clue_views(&self) -> Vec<ClueView> {
        self.clues
            .iter()
            .map(|c| ClueView {
                number: c.id.number,
                direction: c.id.direction.to_string(),
                text: c.text.clone(),
                length: c.length,
                answered: c.is_answered(&self.grid),
            })
            .collect()
    }
}
