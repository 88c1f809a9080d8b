//! Grid/clue data model: cells, clues, and their geometric relationship.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The direction a clue runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Across => "across",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clue identity: number plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClueId {
    pub number: u32,
    pub direction: Direction,
}

impl ClueId {
    pub fn new(number: u32, direction: Direction) -> Self {
        Self { number, direction }
    }

    pub fn across(number: u32) -> Self {
        Self::new(number, Direction::Across)
    }

    pub fn down(number: u32) -> Self {
        Self::new(number, Direction::Down)
    }
}

impl fmt::Display for ClueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, self.direction)
    }
}

/// A grid coordinate, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A single grid square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    /// Current letter, always upper-case
    pub value: Option<char>,
    /// Blocked squares belong to no clue and never hold a letter
    pub playable: bool,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

/// The shared 2-D cell storage. Dimensions are fixed at construction.
///
/// Clues never hold cells of their own; they reference positions here, so a
/// letter written through one clue is immediately visible through any
/// crossing clue.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid of blocked cells. Clues mark their lights playable.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.width + pos.col)
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn value(&self, pos: Position) -> Option<char> {
        self.cell(pos).and_then(|c| c.value)
    }

    pub(crate) fn set_value(&mut self, pos: Position, value: Option<char>) {
        if let Some(i) = self.index(pos) {
            self.cells[i].value = value;
        }
    }

    pub(crate) fn mark_playable(&mut self, pos: Position) {
        if let Some(i) = self.index(pos) {
            self.cells[i].playable = true;
        }
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }
}

/// A clue and the light it occupies.
#[derive(Debug, Clone)]
pub struct Clue {
    pub id: ClueId,
    pub text: String,
    pub length: usize,
    pub start: Position,
    /// Upper-cased reference answer; only read by validation.
    solution: String,
}

impl Clue {
    pub fn new(id: ClueId, text: impl Into<String>, start: Position, solution: &str) -> Self {
        let solution = solution.trim().to_uppercase();
        Self {
            id,
            text: text.into(),
            length: solution.chars().count(),
            start,
            solution,
        }
    }

    /// Positions of the light, in answer order.
    pub fn cells(&self) -> Vec<Position> {
        (0..self.length)
            .map(|i| match self.id.direction {
                Direction::Across => Position::new(self.start.row, self.start.col + i),
                Direction::Down => Position::new(self.start.row + i, self.start.col),
            })
            .collect()
    }

    /// Index of `pos` within this clue's light, if it lies on it.
    pub fn offset_of(&self, pos: Position) -> Option<usize> {
        let (fixed, moving, start_fixed, start_moving) = match self.id.direction {
            Direction::Across => (pos.row, pos.col, self.start.row, self.start.col),
            Direction::Down => (pos.col, pos.row, self.start.col, self.start.row),
        };
        (fixed == start_fixed && moving >= start_moving && moving - start_moving < self.length)
            .then(|| moving - start_moving)
    }

    /// True when every cell of the light holds a letter.
    pub fn is_answered(&self, grid: &Grid) -> bool {
        self.cells().into_iter().all(|p| grid.value(p).is_some())
    }

    pub(crate) fn solution(&self) -> &str {
        &self.solution
    }
}
