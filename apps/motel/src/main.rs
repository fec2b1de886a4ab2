//! # Motel
//!
//! The command-line binary for the Motel motif engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │          apps/motel (THE BINARY)          │
//! │                                           │
//! │  ┌─────────┐  ┌──────────┐  ┌──────────┐  │
//! │  │  CLI    │  │  config  │  │  CSV     │  │
//! │  │ (clap)  │  │  (toml)  │  │ (csv)    │  │
//! │  └────┬────┘  └────┬─────┘  └────┬─────┘  │
//! │       └────────────┼─────────────┘        │
//! │                    ▼                      │
//! │            ┌───────────────┐              │
//! │            │  motel-core   │              │
//! │            │ (THE LOGIC)   │              │
//! │            └───────────────┘              │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! motel ingest -f sentence.json -D docs/0001.redb
//! motel extract-neighborhoods docs/0001.redb hoods.jsonl
//! motel evaluate motifs.jsonl dataset.jsonl -o image.jsonl
//! motel analyze image.jsonl dataset.jsonl results.csv -e weighted-vote
//! ```

use clap::Parser;
use motel::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // MOTEL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("MOTEL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "motel=debug,motel_core=debug"
    } else if cli.quiet {
        "motel=warn,motel_core=warn"
    } else {
        "motel=info,motel_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
