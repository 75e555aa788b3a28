//! Board coordinates and leap move sets.
//!
//! A move set is an ordered list of relative offsets. The order matters: it is
//! the order in which the search tries successors, and the tie-break order
//! when the Warnsdorf heuristic reorders them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A cell on the board, 0-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check whether the cell lies on a `rows` x `cols` board
    pub fn is_within(self, rows: usize, cols: usize) -> bool {
        self.row < rows && self.col < cols
    }

    /// Row-major index on a board with `cols` columns
    pub fn index(self, cols: usize) -> usize {
        self.row * cols + self.col
    }

    pub fn from_index(index: usize, cols: usize) -> Self {
        Self {
            row: index / cols,
            col: index % cols,
        }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for Cell {
    type Err = ConfigError;

    /// Parse `"row,col"`, whitespace around either number allowed
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidCell(s.to_string());
        let (row, col) = s.split_once(',').ok_or_else(invalid)?;
        let row = row.trim().parse().map_err(|_| invalid())?;
        let col = col.trim().parse().map_err(|_| invalid())?;
        Ok(Self { row, col })
    }
}

/// A relative leap (row delta, column delta)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub dr: i32,
    pub dc: i32,
}

impl Offset {
    pub const fn new(dr: i32, dc: i32) -> Self {
        Self { dr, dc }
    }

    /// Apply the offset to `cell`, returning the target if it stays on the board
    pub fn apply(self, cell: Cell, rows: usize, cols: usize) -> Option<Cell> {
        let row = cell.row as i64 + self.dr as i64;
        let col = cell.col as i64 + self.dc as i64;
        if row < 0 || col < 0 || row >= rows as i64 || col >= cols as i64 {
            return None;
        }
        Some(Cell::new(row as usize, col as usize))
    }
}

const STANDARD_OFFSETS: [Offset; 8] = [
    Offset::new(2, 2),
    Offset::new(-2, 2),
    Offset::new(2, -2),
    Offset::new(-2, -2),
    Offset::new(0, 3),
    Offset::new(0, -3),
    Offset::new(3, 0),
    Offset::new(-3, 0),
];

const KNIGHT_OFFSETS: [Offset; 8] = [
    Offset::new(1, 2),
    Offset::new(2, 1),
    Offset::new(2, -1),
    Offset::new(1, -2),
    Offset::new(-1, -2),
    Offset::new(-2, -1),
    Offset::new(-2, 1),
    Offset::new(-1, 2),
];

/// Ordered, immutable collection of distinct leap offsets
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Offset>", into = "Vec<Offset>")]
pub struct MoveSet {
    offsets: Vec<Offset>,
}

impl MoveSet {
    /// Repeated offsets are dropped, keeping the first occurrence
    pub fn new(offsets: Vec<Offset>) -> Self {
        let mut distinct = Vec::with_capacity(offsets.len());
        for offset in offsets {
            if !distinct.contains(&offset) {
                distinct.push(offset);
            }
        }
        Self { offsets: distinct }
    }

    /// Two-step diagonals and three-step orthogonals
    pub fn standard() -> Self {
        Self::new(STANDARD_OFFSETS.to_vec())
    }

    pub fn knight() -> Self {
        Self::new(KNIGHT_OFFSETS.to_vec())
    }

    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// All on-board targets reachable from `cell`, in declared order,
    /// regardless of visitation state
    pub fn targets(&self, cell: Cell, rows: usize, cols: usize) -> impl Iterator<Item = Cell> + '_ {
        self.offsets
            .iter()
            .filter_map(move |offset| offset.apply(cell, rows, cols))
    }

    /// Check whether a single leap connects `from` to `to`
    pub fn connects(&self, from: Cell, to: Cell) -> bool {
        let dr = to.row as i64 - from.row as i64;
        let dc = to.col as i64 - from.col as i64;
        self.offsets
            .iter()
            .any(|o| o.dr as i64 == dr && o.dc as i64 == dc)
    }
}

impl From<Vec<Offset>> for MoveSet {
    fn from(offsets: Vec<Offset>) -> Self {
        Self::new(offsets)
    }
}

impl From<MoveSet> for Vec<Offset> {
    fn from(moves: MoveSet) -> Self {
        moves.offsets
    }
}

impl FromStr for MoveSet {
    type Err = ConfigError;

    /// Parse `"dr,dc;dr,dc;..."`. The empty string is the empty move set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidMoveSet(s.to_string());
        let mut offsets = Vec::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (dr, dc) = part.split_once(',').ok_or_else(invalid)?;
            let dr = dr.trim().parse().map_err(|_| invalid())?;
            let dc = dc.trim().parse().map_err(|_| invalid())?;
            offsets.push(Offset::new(dr, dc));
        }
        Ok(Self::new(offsets))
    }
}
