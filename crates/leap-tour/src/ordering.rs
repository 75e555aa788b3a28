//! Successor ordering for the search.
//!
//! Ordering never changes which paths exist, only the order in which they
//! are found. Warnsdorf's rule moves into the most constrained cell first,
//! which cuts dead-end backtracking sharply on leap-move boards.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::graph::MoveGraph;
use crate::moves::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveOrdering {
    /// The move set's declaration order
    Declared,
    /// Fewest onward moves first, ties in declaration order
    #[default]
    Warnsdorf,
}

impl MoveOrdering {
    pub fn from_heuristic_flag(use_heuristic: bool) -> Self {
        if use_heuristic {
            MoveOrdering::Warnsdorf
        } else {
            MoveOrdering::Declared
        }
    }
}

/// Number of unvisited successors of `cell` on the current board
pub fn onward_degree(graph: &MoveGraph, board: &Board, cell: Cell) -> usize {
    graph
        .successors(graph.index_of(cell))
        .iter()
        .filter(|&&next| !board.is_visited_index(next))
        .count()
}

/// Reorder `moves` in place. The sort is stable so equal degrees keep the
/// declared order.
pub fn order_moves(graph: &MoveGraph, board: &Board, moves: &mut [Cell], ordering: MoveOrdering) {
    match ordering {
        MoveOrdering::Declared => {}
        MoveOrdering::Warnsdorf => {
            moves.sort_by_cached_key(|&cell| onward_degree(graph, board, cell));
        }
    }
}
