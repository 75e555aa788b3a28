//! Precomputed move graph for a fixed board size and move set.
//!
//! Nodes are row-major cell indices. The graph is built once from the board's
//! own move rule and never changes afterwards, so the solver can look up
//! successors without redoing offset arithmetic at every node.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::Result;
use crate::moves::{Cell, MoveSet};

/// Directed adjacency over cell indices
#[derive(Debug, Clone)]
pub struct MoveGraph {
    rows: usize,
    cols: usize,
    /// `successors[u]` in the move set's declared order
    successors: Vec<Vec<usize>>,
}

/// A node as handed to an external graph store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExport {
    pub index: usize,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub from: usize,
    pub to: usize,
}

/// Node and edge lists for materializing the graph out of process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub rows: usize,
    pub cols: usize,
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

impl MoveGraph {
    pub fn build(rows: usize, cols: usize, moves: &MoveSet) -> Result<Self> {
        let board = Board::new(rows, cols, moves.clone())?;
        Ok(Self::from_board(&board))
    }

    /// Build from the move rule of `board`, ignoring its current labels
    pub fn from_board(board: &Board) -> Self {
        let mut fresh = board.clone();
        fresh.clear();

        let cols = fresh.cols();
        let successors = (0..fresh.size())
            .map(|index| {
                fresh
                    .available_moves(Cell::from_index(index, cols))
                    .iter()
                    .map(|target| target.index(cols))
                    .collect()
            })
            .collect();

        Self {
            rows: fresh.rows(),
            cols,
            successors,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    pub fn index_of(&self, cell: Cell) -> usize {
        cell.index(self.cols)
    }

    pub fn cell_of(&self, index: usize) -> Cell {
        Cell::from_index(index, self.cols)
    }

    /// Legal successors of a node; empty for an out-of-range index
    pub fn successors(&self, index: usize) -> &[usize] {
        self.successors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, index: usize) -> usize {
        self.successors(index).len()
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.successors(from).contains(&to)
    }

    /// Every directed edge `(from, to)`, grouped by source node
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    /// Dense 0/1 adjacency matrix
    pub fn adjacency_matrix(&self) -> Vec<Vec<u8>> {
        let n = self.node_count();
        let mut matrix = vec![vec![0u8; n]; n];
        for (from, to) in self.edges() {
            matrix[from][to] = 1;
        }
        matrix
    }

    pub fn export(&self) -> GraphExport {
        let nodes = (0..self.node_count())
            .map(|index| {
                let cell = self.cell_of(index);
                NodeExport {
                    index,
                    row: cell.row,
                    col: cell.col,
                }
            })
            .collect();
        let edges = self
            .edges()
            .map(|(from, to)| EdgeExport { from, to })
            .collect();
        GraphExport {
            rows: self.rows,
            cols: self.cols,
            nodes,
            edges,
        }
    }
}
