//! Configuration errors reported before any search work begins.

use thiserror::Error;

use crate::moves::Cell;

/// Anything wrong with a search request. Running out of paths is never an
/// error; only malformed input is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid board dimensions {rows}x{cols}: both must be positive and the cell count must fit in usize")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("{role} cell {cell} is outside the {rows}x{cols} board")]
    CellOutOfBounds {
        role: &'static str,
        cell: Cell,
        rows: usize,
        cols: usize,
    },
    #[error("invalid cell '{0}': expected 'row,col'")]
    InvalidCell(String),
    #[error("invalid move set '{0}': expected 'dr,dc;dr,dc;...'")]
    InvalidMoveSet(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
