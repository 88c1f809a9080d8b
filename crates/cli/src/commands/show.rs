//! `crossclaw show`: print a puzzle without solving it.

use crossclaw_puzzle::Puzzle;
use std::path::Path;

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let puzzle = Puzzle::from_path(path)?;
    print!("{}", describe(&puzzle));
    Ok(())
}

fn describe(puzzle: &Puzzle) -> String {
    format!(
        "{} ({}x{}, {} clues)\n\n{}\n\n{}",
        puzzle.title(),
        puzzle.grid().width(),
        puzzle.grid().height(),
        puzzle.total_clues(),
        puzzle.render(),
        puzzle.clue_listing()
    )
}
