//! Mutable board state for the search.
//!
//! Each cell carries the 1-based order in which it was visited, or 0 when
//! unvisited. The visited cells always form a simple path labelled
//! `1..step`, and every mutation can be undone exactly, which is what lets
//! the solver explore depth-first on a single board.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{ConfigError, Result};
use crate::moves::{Cell, MoveSet};

/// Candidate successors of a cell. Leap sets rarely exceed eight offsets.
pub type Moves = SmallVec<[Cell; 8]>;

const UNVISITED: usize = 0;

/// Grid state: visitation labels plus the next label to assign
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    moves: MoveSet,
    /// Row-major labels, 0 = unvisited
    labels: Vec<usize>,
    step: usize,
}

impl Board {
    pub fn new(rows: usize, cols: usize, moves: MoveSet) -> Result<Self> {
        let size = checked_size(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            moves,
            labels: vec![UNVISITED; size],
            step: 1,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn move_set(&self) -> &MoveSet {
        &self.moves
    }

    /// Total number of cells
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// The label the next visited cell will receive
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_valid_cell(&self, cell: Cell) -> bool {
        cell.is_within(self.rows, self.cols)
    }

    /// Label of a cell, `None` when off the board
    pub fn label(&self, cell: Cell) -> Option<usize> {
        if !self.is_valid_cell(cell) {
            return None;
        }
        Some(self.labels[cell.index(self.cols)])
    }

    pub fn is_visited(&self, cell: Cell) -> bool {
        self.label(cell).is_some_and(|label| label != UNVISITED)
    }

    pub(crate) fn is_visited_index(&self, index: usize) -> bool {
        self.labels[index] != UNVISITED
    }

    /// Check that no cell has been visited
    pub fn is_uninitialized(&self) -> bool {
        self.labels.iter().all(|&label| label == UNVISITED)
    }

    /// Locate the cell carrying `value`
    pub fn find_value(&self, value: usize) -> Option<Cell> {
        if value == UNVISITED {
            return None;
        }
        self.labels
            .iter()
            .position(|&label| label == value)
            .map(|index| Cell::from_index(index, self.cols))
    }

    /// Unvisited on-board cells one leap away from `cell`, in declared order
    pub fn available_moves(&self, cell: Cell) -> Moves {
        if !self.is_valid_cell(cell) {
            return Moves::new();
        }
        self.moves
            .targets(cell, self.rows, self.cols)
            .filter(|&target| !self.is_visited(target))
            .collect()
    }

    /// Reset every cell to unvisited
    pub fn clear(&mut self) {
        self.labels.fill(UNVISITED);
        self.step = 1;
    }

    /// Reset the board and make `cell` the first cell of the path.
    ///
    /// Fails only when `cell` is off the board, in which case the board is
    /// left cleared.
    pub fn anchor(&mut self, cell: Cell) -> bool {
        self.clear();
        if !self.is_valid_cell(cell) {
            return false;
        }
        self.labels[cell.index(self.cols)] = self.step;
        self.step += 1;
        true
    }

    /// Extend the path from its last cell `from` to the unvisited leap target `to`
    pub fn extend(&mut self, from: Cell, to: Cell) -> bool {
        if !self.is_valid_cell(from) || !self.is_valid_cell(to) {
            return false;
        }
        if self.step < 2 || self.labels[from.index(self.cols)] != self.step - 1 {
            return false;
        }
        if self.is_visited(to) || !self.moves.connects(from, to) {
            return false;
        }
        self.labels[to.index(self.cols)] = self.step;
        self.step += 1;
        true
    }

    /// Undo the most recent `anchor` or `extend`; `cell` must be the last cell
    pub fn retract(&mut self, cell: Cell) -> bool {
        if self.step < 2 || self.label(cell) != Some(self.step - 1) {
            return false;
        }
        self.labels[cell.index(self.cols)] = UNVISITED;
        self.step -= 1;
        true
    }

    /// Check whether every cell has been labelled
    pub fn is_complete(&self) -> bool {
        self.step > self.size()
    }
}

/// Number of cells on a `rows` x `cols` board, rejecting empty or
/// unaddressable dimensions
fn checked_size(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .filter(|&size| size > 0)
        .ok_or(ConfigError::InvalidDimensions { rows, cols })
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = LabelGrid {
            labels: &self.labels,
            cols: self.cols,
        };
        fmt::Display::fmt(&grid, f)
    }
}

/// Lay out a path as a label grid, the same format `Board` displays with.
/// Cells the path does not reach are shown as `.`.
pub fn render_path(rows: usize, cols: usize, path: &[Cell]) -> Result<String> {
    let mut labels = vec![UNVISITED; checked_size(rows, cols)?];
    for (i, cell) in path.iter().enumerate() {
        if cell.is_within(rows, cols) {
            labels[cell.index(cols)] = i + 1;
        }
    }
    Ok(LabelGrid {
        labels: &labels,
        cols,
    }
    .to_string())
}

/// Row-major labels laid out one board row per line
struct LabelGrid<'a> {
    labels: &'a [usize],
    cols: usize,
}

impl fmt::Display for LabelGrid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels.len().to_string().len();
        for row in self.labels.chunks(self.cols) {
            let line: Vec<String> = row
                .iter()
                .map(|&label| match label {
                    UNVISITED => format!("{:>width$}", "."),
                    n => format!("{:>width$}", n),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
