//! CLI entry point for the leap tour solver.
//!
//! Usage:
//!   leap-tour solve [board options] [--start r,c] [--end r,c] [--limit n]
//!   leap-tour graph [board options]
//!   leap-tour count [board options] [--limit n]
//!
//! Board options:
//!   --rows <n>              Number of rows (default: 5)
//!   --cols <n>              Number of columns (default: 5)
//!   --preset <name>         Built-in move set: standard | knight (default: standard)
//!   --moves <list>          Custom move set as "dr,dc;dr,dc;..." (overrides --preset)
//!
//! Exit status: 0 when at least one path was found (or for `graph`),
//! 1 when none was found, 2 on invalid input.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use leap_tour::{
    count_paths_per_cell, render_path, Cell, CellPathCount, ConfigError, MoveGraph, MoveSet,
    Path, Solver, SolverConfig, SolverResult,
};

#[derive(Parser)]
#[command(name = "leap-tour")]
#[command(about = "Enumerate Hamiltonian paths over leap-move grid graphs")]
#[command(version)]
struct Cli {
    /// Log search progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find Hamiltonian paths
    Solve {
        #[command(flatten)]
        board: BoardArgs,

        /// Required first cell as "row,col"
        #[arg(long)]
        start: Option<Cell>,

        /// Required last cell as "row,col"
        #[arg(long)]
        end: Option<Cell>,

        /// Stop after this many paths
        #[arg(long)]
        limit: Option<usize>,

        /// Try moves in declared order instead of Warnsdorf order
        #[arg(long)]
        no_heuristic: bool,

        /// Maximum search time in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the move graph as a node/edge list
    Graph {
        #[command(flatten)]
        board: BoardArgs,
    },

    /// Count the paths starting from every cell
    Count {
        #[command(flatten)]
        board: BoardArgs,

        /// Stop each per-cell search after this many paths
        #[arg(long)]
        limit: Option<usize>,

        /// Maximum search time per cell in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Args)]
struct BoardArgs {
    /// Number of rows
    #[arg(long, default_value = "5")]
    rows: usize,

    /// Number of columns
    #[arg(long, default_value = "5")]
    cols: usize,

    /// Built-in move set
    #[arg(long, value_enum, default_value = "standard")]
    preset: Preset,

    /// Custom move set as "dr,dc;dr,dc;..."
    #[arg(long, allow_hyphen_values = true)]
    moves: Option<MoveSet>,
}

impl BoardArgs {
    fn move_set(&self) -> MoveSet {
        match (&self.moves, self.preset) {
            (Some(moves), _) => moves.clone(),
            (None, Preset::Standard) => MoveSet::standard(),
            (None, Preset::Knight) => MoveSet::knight(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    Knight,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Board,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format for a solve run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    rows: usize,
    cols: usize,
    paths_found: usize,
    search_exhausted: bool,
    cancelled: bool,
    timed_out: bool,
    pairs_tried: usize,
    nodes_expanded: usize,
    time_elapsed_ms: u64,
    paths: Vec<Path>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountOutput {
    rows: usize,
    cols: usize,
    total_paths: usize,
    cells: Vec<CellPathCount>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Solve {
            board,
            start,
            end,
            limit,
            no_heuristic,
            timeout,
            format,
        } => {
            let config = SolverConfig {
                start,
                end,
                limit,
                timeout: timeout.map(Duration::from_secs),
                ..SolverConfig::default()
            }
            .use_heuristic(!no_heuristic);

            let mut solver = Solver::new(board.rows, board.cols, board.move_set())?;
            let result = solver.solve(&config)?;

            match format {
                OutputFormat::Json => {
                    let output = format_result(board.rows, board.cols, &result);
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Board => {
                    for (i, path) in result.paths.iter().enumerate() {
                        if i > 0 {
                            println!();
                        }
                        print!("{}", render_path(board.rows, board.cols, path)?);
                    }
                }
            }

            Ok(exit_code(!result.paths.is_empty()))
        }

        Commands::Graph { board } => {
            let graph = MoveGraph::build(board.rows, board.cols, &board.move_set())?;
            println!("{}", serde_json::to_string_pretty(&graph.export())?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Count {
            board,
            limit,
            timeout,
        } => {
            let config = SolverConfig {
                limit,
                timeout: timeout.map(Duration::from_secs),
                ..SolverConfig::default()
            };
            let cells = count_paths_per_cell(board.rows, board.cols, &board.move_set(), &config)?;
            let total_paths = cells.iter().map(|c| c.paths).sum();

            let output = CountOutput {
                rows: board.rows,
                cols: board.cols,
                total_paths,
                cells,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);

            Ok(exit_code(total_paths > 0))
        }
    }
}

fn exit_code(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn format_result(rows: usize, cols: usize, result: &SolverResult) -> SolveOutput {
    SolveOutput {
        rows,
        cols,
        paths_found: result.paths.len(),
        search_exhausted: result.search_exhausted,
        cancelled: result.cancelled,
        timed_out: result.timed_out,
        pairs_tried: result.pairs_tried,
        nodes_expanded: result.nodes_expanded,
        time_elapsed_ms: result.time_elapsed_ms,
        paths: result.paths.clone(),
    }
}
