//! Text rendering for display collaborators. Pure reads.

use crate::engine::{BLANK, Puzzle};
use crate::model::{Direction, Grid};
use std::fmt::{self, Write};

/// Marker for non-playable squares.
pub const BLOCKED: char = '#';

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            let line: Vec<String> = row
                .iter()
                .map(|cell| match (cell.playable, cell.value) {
                    (false, _) => BLOCKED.to_string(),
                    (true, Some(ch)) => ch.to_string(),
                    (true, None) => BLANK.to_string(),
                })
                .collect();
            f.write_str(&line.join(" "))?;
        }
        Ok(())
    }
}

impl Puzzle {
    /// Rendered grid, one row per line.
    pub fn render(&self) -> String {
        self.grid().to_string()
    }

    /// Clue lists grouped by direction, with lengths and current fill.
    pub fn clue_listing(&self) -> String {
        let mut out = String::new();
        for direction in [Direction::Across, Direction::Down] {
            let _ = writeln!(out, "{}:", direction.as_str().to_uppercase());
            for clue in self.clues().iter().filter(|c| c.id.direction == direction) {
                let current = self.current_answer(clue.id).unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {}. {} ({} letters) [{}]",
                    clue.id.number, clue.text, clue.length, current
                );
            }
        }
        out
    }
}
