//! # Motel CLI Module
//!
//! This module implements the CLI interface for Motel.
//!
//! ## Available Commands
//!
//! - `ingest` - Load a pre-parsed graph file into a document store
//! - `status` - Show document store status
//! - `extract-neighborhoods` - Write one neighborhood motif per positive vertex
//! - `evaluate` - Evaluate motifs over a dataset into a sparse image
//! - `analyze` - Run active learning over ensembles and write result CSV
//! - `curve` - Write an ensemble's precision-recall curve as CSV

mod commands;

use clap::{Parser, Subcommand};
use motel_core::{EnsembleKind, MotelError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Motel - motif-based point selection over document graphs
///
/// Motifs select points from attributed document graphs; ensembles of motifs
/// are refined by active learning.
#[derive(Parser, Debug)]
#[command(name = "motel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a pre-parsed graph file into a document store
    Ingest {
        /// Path to the graph JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Document store to write (":memory:" for a dry run)
        #[arg(short = 'D', long)]
        database: PathBuf,
    },

    /// Show document store status
    Status {
        /// Document store to inspect
        #[arg(short = 'D', long)]
        database: PathBuf,
    },

    /// Write one neighborhood motif per positively labeled vertex
    ExtractNeighborhoods {
        /// Document store to read
        input: PathBuf,

        /// Output JSONL file
        output: PathBuf,

        /// Accumulated edge-weight bound (defaults to the configured distance)
        #[arg(short, long)]
        distance: Option<f64>,
    },

    /// Evaluate motifs over every document of a dataset
    Evaluate {
        /// Motif JSONL file
        motifs: PathBuf,

        /// Dataset JSONL file
        data: PathBuf,

        /// Output sparse image file
        #[arg(short, long, default_value = "image.jsonl")]
        output: PathBuf,
    },

    /// Run active learning over ensembles and write result CSV
    Analyze {
        /// Sparse image file
        image: PathBuf,

        /// Dataset JSONL file (supplies ground truth and splits)
        data: PathBuf,

        /// Output CSV file
        output: PathBuf,

        /// Ensembles to run (comma-separated; all when omitted)
        #[arg(short, long = "ensemble", value_delimiter = ',')]
        ensembles: Vec<EnsembleKind>,

        /// Number of active-learning steps
        #[arg(short, long, default_value_t = motel_core::active::DEFAULT_STEPS)]
        steps: u32,

        /// Classification thresholds scored at each step (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        thresholds: Vec<f64>,

        /// F-beta weight
        #[arg(short, long, default_value_t = motel_core::active::DEFAULT_BETA)]
        beta: f64,

        /// Weighted-vote learning rate (defaults to the configured rate)
        #[arg(long)]
        learning_rate: Option<f64>,

        /// Weighted-vote per-step decay
        #[arg(long, default_value_t = 1.0)]
        decay: f64,

        /// Weighted-vote scale of positive observations
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },

    /// Write an ensemble's precision-recall curve as CSV
    Curve {
        /// Sparse image file
        image: PathBuf,

        /// Dataset JSONL file (supplies ground truth)
        data: PathBuf,

        /// Output CSV file
        output: PathBuf,

        /// Ensemble to rank with
        #[arg(short, long, default_value = "majority-vote")]
        ensemble: EnsembleKind,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), MotelError> {
    let config = load_config(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Ingest { file, database } => cmd_ingest(&database, &file, json_mode),
        Commands::Status { database } => cmd_status(&database, json_mode),
        Commands::ExtractNeighborhoods {
            input,
            output,
            distance,
        } => cmd_extract_neighborhoods(&config, &input, &output, distance, json_mode),
        Commands::Evaluate {
            motifs,
            data,
            output,
        } => cmd_evaluate(&motifs, &data, &output, json_mode),
        Commands::Analyze {
            image,
            data,
            output,
            ensembles,
            steps,
            thresholds,
            beta,
            learning_rate,
            decay,
            scale,
        } => {
            let run = motel_core::ActiveLearning {
                steps,
                thresholds,
                beta,
                update: motel_core::UpdateParams {
                    learning_rate,
                    decay,
                    step: 0,
                    scale,
                },
            };
            cmd_analyze(&config, &image, &data, &output, &ensembles, &run, json_mode)
        }
        Commands::Curve {
            image,
            data,
            output,
            ensemble,
        } => cmd_curve(&config, &image, &data, &output, ensemble, json_mode),
    }
}
