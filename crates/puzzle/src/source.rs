//! Puzzle source format: the JSON document a puzzle is loaded from.
//!
//! ```json
//! {
//!   "title": "Farmyard",
//!   "width": 3,
//!   "height": 3,
//!   "clues": [
//!     {"number": 1, "direction": "across", "text": "Feline pet",
//!      "row": 0, "col": 0, "length": 3, "answer": "CAT"}
//!   ]
//! }
//! ```

use crate::engine::Puzzle;
use crate::model::{Clue, ClueId, Direction, Grid, Position};
use crossclaw_core::PuzzleError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// A whole puzzle as stored on disk, reference answers included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleSource {
    #[serde(default = "default_title")]
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub clues: Vec<ClueSource>,
}

fn default_title() -> String {
    "Untitled".into()
}

/// One clue entry of a [`PuzzleSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClueSource {
    pub number: u32,
    pub direction: Direction,
    pub text: String,
    pub row: usize,
    pub col: usize,
    /// Optional; checked against the answer when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    pub answer: String,
}

impl PuzzleSource {
    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        serde_json::from_str(json).map_err(|e| PuzzleError::InvalidSource(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PuzzleError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PuzzleError::InvalidSource(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Check the geometry and produce a blank working puzzle.
    pub fn build(&self) -> Result<Puzzle, PuzzleError> {
        if self.width == 0 || self.height == 0 {
            return Err(PuzzleError::InvalidSource("grid dimensions must be non-zero".into()));
        }
        if self.clues.is_empty() {
            return Err(PuzzleError::InvalidSource("puzzle has no clues".into()));
        }

        let mut seen = HashSet::new();
        let mut letters: HashMap<Position, (char, ClueId)> = HashMap::new();
        let mut clues = Vec::with_capacity(self.clues.len());

        for entry in &self.clues {
            let id = ClueId::new(entry.number, entry.direction);
            if !seen.insert(id) {
                return Err(PuzzleError::InvalidSource(format!("duplicate clue {id}")));
            }

            let clue = Clue::new(id, entry.text.clone(), Position::new(entry.row, entry.col), &entry.answer);
            if clue.length == 0 {
                return Err(PuzzleError::InvalidSource(format!("clue {id} has an empty answer")));
            }
            if let Some(declared) = entry.length
                && declared != clue.length
            {
                return Err(PuzzleError::InvalidSource(format!(
                    "clue {id} declares length {declared} but its answer has {}",
                    clue.length
                )));
            }

            for (pos, letter) in clue.cells().into_iter().zip(clue.solution().chars()) {
                if pos.row >= self.height || pos.col >= self.width {
                    return Err(PuzzleError::InvalidSource(format!("clue {id} runs off the grid at {pos}")));
                }
                if let Some((other_letter, other_id)) = letters.insert(pos, (letter, id))
                    && other_letter != letter
                {
                    return Err(PuzzleError::InvalidSource(format!(
                        "clues {other_id} and {id} disagree at {pos}: '{other_letter}' vs '{letter}'"
                    )));
                }
            }
            clues.push(clue);
        }

        clues.sort_by_key(|c| (c.id.direction, c.id.number));
        let puzzle = Puzzle::new(self.title.clone(), Grid::new(self.width, self.height), clues)?;
        info!(
            title = %self.title,
            width = self.width,
            height = self.height,
            clues = puzzle.total_clues(),
            "Puzzle loaded"
        );
        Ok(puzzle)
    }
}

impl Puzzle {
    /// Parse and build a puzzle from its JSON source.
    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        PuzzleSource::from_json(json)?.build()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PuzzleError> {
        PuzzleSource::from_path(path)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(number: u32, direction: Direction, row: usize, col: usize, answer: &str) -> ClueSource {
        ClueSource {
            number,
            direction,
            text: format!("clue {number}"),
            row,
            col,
            length: None,
            answer: answer.into(),
        }
    }

    fn source(clues: Vec<ClueSource>) -> PuzzleSource {
        PuzzleSource { title: "t".into(), width: 3, height: 3, clues }
    }

    #[test]
    fn builds_blank_puzzle() {
        let p = source(vec![
            entry(1, Direction::Across, 0, 0, "cat"),
            entry(1, Direction::Down, 0, 0, "cow"),
        ])
        .build()
        .unwrap();
        assert_eq!(p.total_clues(), 2);
        assert_eq!(p.filled_count(), 0);
        assert_eq!(p.history_len(), 0);
        // Across clues are ordered first
        assert_eq!(p.clues()[0].id, ClueId::across(1));
    }

    #[test]
    fn rejects_off_grid_clue() {
        let err = source(vec![entry(1, Direction::Across, 0, 1, "CAT")]).build().unwrap_err();
        assert!(matches!(err, PuzzleError::InvalidSource(msg) if msg.contains("off the grid")));
    }

    #[test]
    fn rejects_inconsistent_intersection() {
        let err = source(vec![
            entry(1, Direction::Across, 0, 0, "CAT"),
            entry(1, Direction::Down, 0, 0, "BOW"),
        ])
        .build()
        .unwrap_err();
        assert!(matches!(err, PuzzleError::InvalidSource(msg) if msg.contains("disagree")));
    }

    #[test]
    fn rejects_duplicates_and_declared_length_mismatch() {
        let dup = source(vec![
            entry(1, Direction::Across, 0, 0, "CAT"),
            entry(1, Direction::Across, 1, 0, "DOG"),
        ]);
        assert!(dup.build().is_err());

        let mut wrong = entry(1, Direction::Across, 0, 0, "CAT");
        wrong.length = Some(4);
        assert!(source(vec![wrong]).build().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"width": 3, "height": 1, "clues": [{{"number": 1, "direction": "across", "text": "Feline", "row": 0, "col": 0, "length": 3, "answer": "CAT"}}]}}"#
        )
        .unwrap();
        let p = Puzzle::from_path(file.path()).unwrap();
        assert_eq!(p.title(), "Untitled");
        assert_eq!(p.clue(ClueId::across(1)).unwrap().length, 3);
    }

    #[test]
    fn bad_json_is_invalid_source() {
        assert!(matches!(Puzzle::from_json("{"), Err(PuzzleError::InvalidSource(_))));
    }
}
