//! Hamiltonian path enumeration over leap-move grid graphs.
//!
//! A move set of relative offsets induces a directed graph on an R x C
//! board. This crate finds one, several or all simple paths that visit every
//! cell exactly once, optionally anchored to a start and/or end cell, using
//! depth-first backtracking with an optional Warnsdorf move ordering.

pub mod board;
pub mod error;
pub mod graph;
pub mod moves;
pub mod ordering;
pub mod solver;

// Re-export main types
pub use board::{render_path, Board, Moves};
pub use error::{ConfigError, Result};
pub use graph::{EdgeExport, GraphExport, MoveGraph, NodeExport};
pub use moves::{Cell, MoveSet, Offset};
pub use ordering::MoveOrdering;
pub use solver::{count_paths_per_cell, CellPathCount, Path, Solver, SolverConfig, SolverResult};
