//! Backtracking search for Hamiltonian paths on a leap-move board.
//!
//! One board is mutated in place for the whole search: every successful
//! `extend` is matched by a `retract` on every exit path, including early
//! exit once the requested number of paths has been found, on cancellation
//! and on timeout. The board is therefore clean again when `solve` returns.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::board::{Board, Moves};
use crate::error::{ConfigError, Result};
use crate::graph::MoveGraph;
use crate::moves::{Cell, MoveSet};
use crate::ordering::{order_moves, MoveOrdering};

/// An ordered sequence of distinct cells, one per board cell
pub type Path = Vec<Cell>;

/// How often (in expanded nodes) the deadline is polled
const DEADLINE_POLL_INTERVAL: usize = 1024;

/// Configuration for a single search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Required first cell; every cell is tried when unset
    pub start: Option<Cell>,
    /// Required last cell; every cell is tried when unset
    pub end: Option<Cell>,
    /// Stop after this many paths; unbounded when unset
    pub limit: Option<usize>,
    pub ordering: MoveOrdering,
    /// Give up after this long, returning what was found so far
    pub timeout: Option<Duration>,
}

impl SolverConfig {
    pub fn with_start(mut self, start: Cell) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Cell) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn use_heuristic(mut self, use_heuristic: bool) -> Self {
        self.ordering = MoveOrdering::from_heuristic_flag(use_heuristic);
        self
    }
}

/// Result of a search
#[derive(Debug, Clone, Default)]
pub struct SolverResult {
    /// Paths in discovery order
    pub paths: Vec<Path>,
    /// Whether every candidate (start, end) pair was fully explored
    pub search_exhausted: bool,
    /// Stopped by the cancel flag
    pub cancelled: bool,
    /// Stopped by the timeout
    pub timed_out: bool,
    /// Number of (start, end) pairs the search was started on
    pub pairs_tried: usize,
    /// Number of search nodes expanded
    pub nodes_expanded: usize,
    pub time_elapsed_ms: u64,
}

/// Why a search stopped before exhausting its space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    LimitReached,
    Cancelled,
    TimedOut,
}

/// Number of paths starting from one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPathCount {
    pub cell: Cell,
    pub paths: usize,
    pub search_exhausted: bool,
}

/// Hamiltonian path solver for one board size and move set
#[derive(Debug, Clone)]
pub struct Solver {
    board: Board,
    graph: Arc<MoveGraph>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Solver {
    pub fn new(rows: usize, cols: usize, moves: MoveSet) -> Result<Self> {
        let board = Board::new(rows, cols, moves)?;
        let graph = Arc::new(MoveGraph::from_board(&board));
        Ok(Self {
            board,
            graph,
            cancel: None,
        })
    }

    /// Stop searching as soon as `flag` becomes true
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn graph(&self) -> &MoveGraph {
        &self.graph
    }

    /// Search for paths with ordering on and no timeout
    pub fn solve_paths(
        &mut self,
        start: Option<Cell>,
        end: Option<Cell>,
        n: Option<usize>,
    ) -> Result<Vec<Path>> {
        let config = SolverConfig {
            start,
            end,
            limit: n,
            ..SolverConfig::default()
        };
        Ok(self.solve(&config)?.paths)
    }

    /// Enumerate paths matching `config`.
    ///
    /// Out-of-bounds anchors are rejected before any search work. Finding
    /// nothing is not an error: the result simply has no paths.
    pub fn solve(&mut self, config: &SolverConfig) -> Result<SolverResult> {
        self.validate_anchor("start", config.start)?;
        self.validate_anchor("end", config.end)?;

        let start_time = Instant::now();
        let deadline = config.timeout.map(|timeout| start_time + timeout);

        let all_cells: Vec<Cell> = (0..self.graph.node_count())
            .map(|index| self.graph.cell_of(index))
            .collect();
        let starts = config.start.map_or_else(|| all_cells.clone(), |s| vec![s]);
        let ends = config.end.map_or_else(|| all_cells.clone(), |e| vec![e]);
        let size = self.board.size();

        let mut search = Search {
            board: &mut self.board,
            graph: &self.graph,
            ordering: config.ordering,
            limit: config.limit,
            cancel: self.cancel.as_deref(),
            deadline,
            path: Vec::with_capacity(size),
            paths: Vec::new(),
            nodes_expanded: 0,
        };
        let mut pairs_tried = 0;
        let mut halt = (config.limit == Some(0)).then_some(Halt::LimitReached);

        'pairs: for &start in &starts {
            for &end in &ends {
                if halt.is_some() {
                    break 'pairs;
                }
                if start == end && size > 1 {
                    continue;
                }
                if let ControlFlow::Break(reason) = search.poll_interrupt(true) {
                    halt = Some(reason);
                    break 'pairs;
                }

                pairs_tried += 1;
                debug!(start = %start, end = %end, found = search.paths.len(), "trying endpoint pair");

                if let ControlFlow::Break(reason) = search.run_pair(start, end) {
                    halt = Some(reason);
                    break 'pairs;
                }
            }
        }

        let result = SolverResult {
            search_exhausted: halt.is_none(),
            cancelled: halt == Some(Halt::Cancelled),
            timed_out: halt == Some(Halt::TimedOut),
            nodes_expanded: search.nodes_expanded,
            paths: search.paths,
            pairs_tried,
            time_elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            rows = self.board.rows(),
            cols = self.board.cols(),
            paths = result.paths.len(),
            pairs = result.pairs_tried,
            nodes = result.nodes_expanded,
            exhausted = result.search_exhausted,
            elapsed_ms = result.time_elapsed_ms,
            "search finished"
        );

        Ok(result)
    }

    fn validate_anchor(&self, role: &'static str, cell: Option<Cell>) -> Result<()> {
        match cell {
            Some(cell) if !self.board.is_valid_cell(cell) => Err(ConfigError::CellOutOfBounds {
                role,
                cell,
                rows: self.board.rows(),
                cols: self.board.cols(),
            }),
            _ => Ok(()),
        }
    }
}

/// Mutable state of one running search
struct Search<'a> {
    board: &'a mut Board,
    graph: &'a MoveGraph,
    ordering: MoveOrdering,
    limit: Option<usize>,
    cancel: Option<&'a AtomicBool>,
    deadline: Option<Instant>,
    /// Cells of the current partial path, in lockstep with `board`
    path: Vec<Cell>,
    paths: Vec<Path>,
    nodes_expanded: usize,
}

/// One level of the explicit DFS stack: a cell on the current path and the
/// ordered successors still to try from it
struct Frame {
    cell: Cell,
    moves: Moves,
    next: usize,
}

impl Search<'_> {
    /// Search every path from `start` that finishes on `end`.
    ///
    /// The depth-first walk keeps its own stack of frames, one per cell on
    /// the path, so board size is bounded by heap rather than thread stack.
    fn run_pair(&mut self, start: Cell, end: Cell) -> ControlFlow<Halt> {
        if !self.board.anchor(start) {
            return ControlFlow::Continue(());
        }
        self.path.clear();
        self.path.push(start);

        let mut stack: Vec<Frame> = Vec::with_capacity(self.board.size());
        let mut flow = self.enter(start, &mut stack);

        while flow.is_continue() {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let current = frame.cell;
            let final_step = self.board.step() == self.board.size();

            let mut advanced = None;
            while let Some(&next) = frame.moves.get(frame.next) {
                frame.next += 1;
                // The last cell of the path must be the requested end
                if final_step && next != end {
                    continue;
                }
                if self.board.extend(current, next) {
                    advanced = Some(next);
                    break;
                }
            }

            match advanced {
                Some(next) => {
                    self.path.push(next);
                    flow = self.enter(next, &mut stack);
                }
                None => self.leave(&mut stack),
            }
        }

        // Unwind whatever is left after an early stop
        while !stack.is_empty() {
            self.leave(&mut stack);
        }
        debug_assert!(self.board.is_uninitialized());
        flow
    }

    /// Push a frame for the freshly visited `cell`, recording the path if it
    /// covers the board
    fn enter(&mut self, cell: Cell, stack: &mut Vec<Frame>) -> ControlFlow<Halt> {
        stack.push(Frame {
            cell,
            moves: Moves::new(),
            next: 0,
        });
        self.poll_interrupt(false)?;
        self.nodes_expanded += 1;

        if self.board.is_complete() {
            trace!(path_len = self.path.len(), "path found");
            self.paths.push(self.path.clone());
            if self.limit.is_some_and(|limit| self.paths.len() >= limit) {
                return ControlFlow::Break(Halt::LimitReached);
            }
            return ControlFlow::Continue(());
        }

        let mut moves: Moves = self
            .graph
            .successors(self.graph.index_of(cell))
            .iter()
            .filter(|&&next| !self.board.is_visited_index(next))
            .map(|&next| self.graph.cell_of(next))
            .collect();
        order_moves(self.graph, &*self.board, &mut moves, self.ordering);
        if let Some(frame) = stack.last_mut() {
            frame.moves = moves;
        }
        ControlFlow::Continue(())
    }

    /// Pop the top frame and undo its visit
    fn leave(&mut self, stack: &mut Vec<Frame>) {
        if let Some(frame) = stack.pop() {
            self.path.pop();
            self.board.retract(frame.cell);
        }
    }

    /// Check the cancel flag, and the deadline when `force` is set or on the
    /// polling interval
    fn poll_interrupt(&self, force: bool) -> ControlFlow<Halt> {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return ControlFlow::Break(Halt::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if (force || self.nodes_expanded % DEADLINE_POLL_INTERVAL == 0)
                && Instant::now() >= deadline
            {
                return ControlFlow::Break(Halt::TimedOut);
            }
        }
        ControlFlow::Continue(())
    }
}

/// Count the paths starting from every cell, one independent search per cell
/// spread over the rayon pool. `config.start` is ignored; the other fields
/// apply to each per-cell search. Counts come back in row-major cell order.
pub fn count_paths_per_cell(
    rows: usize,
    cols: usize,
    moves: &MoveSet,
    config: &SolverConfig,
) -> Result<Vec<CellPathCount>> {
    let template = Solver::new(rows, cols, moves.clone())?;
    template.validate_anchor("end", config.end)?;

    (0..template.board().size())
        .into_par_iter()
        .map(|index| {
            let cell = Cell::from_index(index, cols);
            let mut solver = template.clone();
            let request = SolverConfig {
                start: Some(cell),
                ..config.clone()
            };
            let result = solver.solve(&request)?;
            Ok(CellPathCount {
                cell,
                paths: result.paths.len(),
                search_exhausted: result.search_exhausted,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_valid_path(path: &[Cell], rows: usize, cols: usize, moves: &MoveSet) {
        assert_eq!(path.len(), rows * cols);
        let distinct: HashSet<&Cell> = path.iter().collect();
        assert_eq!(distinct.len(), rows * cols);
        assert!(path.iter().all(|cell| cell.is_within(rows, cols)));
        for pair in path.windows(2) {
            assert!(
                moves.connects(pair[0], pair[1]),
                "{} -> {} is not a leap",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_no_legal_moves_yields_nothing() {
        let mut solver = Solver::new(2, 2, MoveSet::standard()).unwrap();
        let result = solver.solve(&SolverConfig::default()).unwrap();
        assert!(result.paths.is_empty());
        assert!(result.search_exhausted);
        assert_eq!(result.pairs_tried, 12);
    }

    #[test]
    fn test_single_cell_board() {
        let mut solver = Solver::new(1, 1, MoveSet::standard()).unwrap();
        let paths = solver.solve_paths(None, None, None).unwrap();
        assert_eq!(paths, vec![vec![Cell::new(0, 0)]]);
    }

    #[test]
    fn test_standard_five_by_five_from_center() {
        let moves = MoveSet::standard();
        let mut solver = Solver::new(5, 5, moves.clone()).unwrap();
        let config = SolverConfig::default().with_start(Cell::new(2, 2)).with_limit(1);
        let result = solver.solve(&config).unwrap();

        assert_eq!(result.paths.len(), 1);
        assert!(!result.search_exhausted);
        let path = &result.paths[0];
        assert_eq!(path[0], Cell::new(2, 2));
        assert_valid_path(path, 5, 5, &moves);
        assert!(solver.board().is_uninitialized());
    }

    #[test]
    fn test_unreachable_pair_yields_nothing() {
        // (1,1) has no leaps at all on a 3x3 board
        let mut solver = Solver::new(3, 3, MoveSet::standard()).unwrap();
        let config = SolverConfig::default()
            .with_start(Cell::new(0, 0))
            .with_end(Cell::new(2, 2));
        let result = solver.solve(&config).unwrap();
        assert!(result.paths.is_empty());
        assert!(result.search_exhausted);
        assert_eq!(result.pairs_tried, 1);
    }

    #[test]
    fn test_same_start_and_end_is_skipped() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let config = SolverConfig::default()
            .with_start(Cell::new(0, 0))
            .with_end(Cell::new(0, 0));
        let result = solver.solve(&config).unwrap();
        assert!(result.paths.is_empty());
        assert_eq!(result.pairs_tried, 0);
        assert!(result.search_exhausted);
    }

    #[test]
    fn test_out_of_bounds_anchor_is_rejected() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let err = solver
            .solve(&SolverConfig::default().with_start(Cell::new(3, 0)))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::CellOutOfBounds {
                role: "start",
                cell: Cell::new(3, 0),
                rows: 3,
                cols: 4
            }
        );
        assert!(solver
            .solve(&SolverConfig::default().with_end(Cell::new(0, 4)))
            .is_err());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Solver::new(0, 5, MoveSet::standard()),
            Err(ConfigError::InvalidDimensions { rows: 0, cols: 5 })
        ));
    }

    #[test]
    fn test_every_path_is_hamiltonian() {
        let moves = MoveSet::knight();
        let mut solver = Solver::new(3, 4, moves.clone()).unwrap();
        let result = solver.solve(&SolverConfig::default()).unwrap();
        assert!(!result.paths.is_empty());
        for path in &result.paths {
            assert_valid_path(path, 3, 4, &moves);
        }
        let distinct: HashSet<&Path> = result.paths.iter().collect();
        assert_eq!(distinct.len(), result.paths.len());
    }

    #[test]
    fn test_repeated_offsets_do_not_duplicate_paths() {
        let mut plain = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let moves: MoveSet = "1,2;1,2;2,1;2,-1;1,-2;-1,-2;-2,-1;-2,1;-1,2;2,1"
            .parse()
            .unwrap();
        assert_eq!(moves, MoveSet::knight());
        let mut repeated = Solver::new(3, 4, moves).unwrap();

        let expected = plain.solve_paths(None, None, None).unwrap();
        let paths = repeated.solve_paths(None, None, None).unwrap();
        assert_eq!(paths.len(), 16);
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_long_path_does_not_exhaust_thread_stack() {
        let cols = 50_000;
        let moves: MoveSet = "0,1".parse().unwrap();
        let mut solver = Solver::new(1, cols, moves.clone()).unwrap();
        let result = solver
            .solve(
                &SolverConfig::default()
                    .with_start(Cell::new(0, 0))
                    .with_end(Cell::new(0, cols - 1))
                    .with_limit(1),
            )
            .unwrap();

        assert_eq!(result.paths.len(), 1);
        assert_valid_path(&result.paths[0], 1, cols, &moves);
        assert_eq!(result.nodes_expanded, cols);
        assert!(solver.board().is_uninitialized());
    }

    #[test]
    fn test_long_path_on_worker_threads() {
        // Every start walks to the right edge, so total work is quadratic in `cols`
        let cols = 4_000;
        let config = SolverConfig::default().with_end(Cell::new(0, cols - 1));
        let counts = count_paths_per_cell(1, cols, &"0,1".parse().unwrap(), &config).unwrap();
        assert_eq!(counts[0].paths, 1);
        assert!(counts[1..].iter().all(|c| c.paths == 0));
    }

    #[test]
    fn test_limit_one_returns_at_most_one() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let paths = solver.solve_paths(None, None, Some(1)).unwrap();
        assert_eq!(paths.len(), 1);

        let mut empty = Solver::new(3, 3, MoveSet::standard()).unwrap();
        assert!(empty.solve_paths(None, None, Some(1)).unwrap().is_empty());
    }

    #[test]
    fn test_limit_zero_searches_nothing() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let result = solver.solve(&SolverConfig::default().with_limit(0)).unwrap();
        assert!(result.paths.is_empty());
        assert_eq!(result.pairs_tried, 0);
        assert!(!result.search_exhausted);
    }

    #[test]
    fn test_heuristic_changes_order_not_paths() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let start = Cell::new(0, 0);

        let with = solver
            .solve(&SolverConfig::default().with_start(start).use_heuristic(true))
            .unwrap();
        let without = solver
            .solve(&SolverConfig::default().with_start(start).use_heuristic(false))
            .unwrap();

        let with: HashSet<Path> = with.paths.into_iter().collect();
        let without: HashSet<Path> = without.paths.into_iter().collect();
        assert!(!with.is_empty());
        assert_eq!(with, without);
    }

    #[test]
    fn test_anchors_are_respected() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        let start = Cell::new(0, 0);
        let end = Cell::new(2, 3);

        for path in solver.solve_paths(Some(start), None, None).unwrap() {
            assert_eq!(path[0], start);
        }
        for path in solver.solve_paths(None, Some(end), None).unwrap() {
            assert_eq!(path[path.len() - 1], end);
        }
        for path in solver.solve_paths(Some(start), Some(end), None).unwrap() {
            assert_eq!((path[0], path[path.len() - 1]), (start, end));
        }
    }

    #[test]
    fn test_board_is_clean_after_early_exit() {
        let mut solver = Solver::new(3, 4, MoveSet::knight()).unwrap();
        solver.solve_paths(None, None, Some(2)).unwrap();
        assert!(solver.board().is_uninitialized());
        assert_eq!(solver.board().step(), 1);
    }

    #[test]
    fn test_cancel_flag_stops_search() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut solver = Solver::new(5, 5, MoveSet::standard())
            .unwrap()
            .with_cancel_flag(flag.clone());
        let result = solver.solve(&SolverConfig::default()).unwrap();
        assert!(result.cancelled);
        assert!(!result.search_exhausted);
        assert!(result.paths.is_empty());
        assert_eq!(result.pairs_tried, 0);

        flag.store(false, Ordering::Relaxed);
        let result = solver
            .solve(&SolverConfig::default().with_start(Cell::new(2, 2)).with_limit(1))
            .unwrap();
        assert_eq!(result.paths.len(), 1);
    }

    #[test]
    fn test_zero_timeout_stops_search() {
        let mut solver = Solver::new(5, 5, MoveSet::standard()).unwrap();
        let result = solver
            .solve(&SolverConfig::default().with_timeout(Duration::ZERO))
            .unwrap();
        assert!(result.timed_out);
        assert!(!result.search_exhausted);
        assert_eq!(result.pairs_tried, 0);
        assert!(solver.board().is_uninitialized());
    }

    #[test]
    fn test_count_paths_per_cell_matches_sequential() {
        let moves = MoveSet::knight();
        let counts = count_paths_per_cell(3, 4, &moves, &SolverConfig::default()).unwrap();
        assert_eq!(counts.len(), 12);

        let mut solver = Solver::new(3, 4, moves).unwrap();
        let mut total = 0;
        for (index, count) in counts.iter().enumerate() {
            assert_eq!(count.cell, Cell::from_index(index, 4));
            assert!(count.search_exhausted);
            let expected = solver.solve_paths(Some(count.cell), None, None).unwrap();
            assert_eq!(count.paths, expected.len());
            total += count.paths;
        }
        assert_eq!(total, solver.solve_paths(None, None, None).unwrap().len());
    }

    #[test]
    fn test_count_paths_rejects_bad_end() {
        let config = SolverConfig::default().with_end(Cell::new(9, 9));
        assert!(count_paths_per_cell(3, 4, &MoveSet::knight(), &config).is_err());
        assert!(count_paths_per_cell(0, 4, &MoveSet::knight(), &SolverConfig::default()).is_err());
    }
}
