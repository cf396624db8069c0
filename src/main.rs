//! # Main — CLI Entry Point
//!
//! Routes subcommands to the mining loop and service helpers. Shared
//! concerns: environment loading, structured logging, config validation.
//!
//! ## Subcommands
//!
//! - `mine`: run the racing loop forever (fetch, search, submit, retask).
//! - `solve`: solve one puzzle input locally and print the result.
//! - `current`: print the service's current puzzle input.
//!
//! ## Global Options
//!
//! - `--server` / `FLEECE_SERVER`: coin service base URL.
//! - `--owner-key` / `FLEECE_OWNER`: credential embedded in every message.
//! - `--prefix`: digest prefix a candidate must hit.
//! - `--workers`: pool size (one candidate-space partition each).
//! - `--poll-ms`: bounded wait between puzzle freshness checks.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use fleecehunt::config::{
    MinerConfig, DEFAULT_OWNER_KEY, DEFAULT_POLL_MS, DEFAULT_POOL_SIZE, DEFAULT_REPORT_SECS,
    DEFAULT_SERVER, DEFAULT_SOLUTION_PREFIX,
};
use fleecehunt::progress::Progress;
use fleecehunt::service::{CoinService, HttpCoinService};
use fleecehunt::supervisor::Supervisor;
use fleecehunt::worker;

#[derive(Parser)]
#[command(name = "fleecehunt", about = "Race to extend the coin service's hash chain")]
struct Cli {
    /// Coin service base URL
    #[arg(long, env = "FLEECE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Owner key embedded in every candidate message
    #[arg(long, env = "FLEECE_OWNER", default_value = DEFAULT_OWNER_KEY)]
    owner_key: String,

    /// Digest prefix a candidate must start with to count as solved
    #[arg(long, default_value = DEFAULT_SOLUTION_PREFIX)]
    prefix: String,

    /// Number of search workers (one partition of the candidate space each)
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
    workers: usize,

    /// Bounded wait between puzzle freshness checks, in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_MS)]
    poll_ms: u64,

    /// Interval between progress reports, in seconds
    #[arg(long, default_value_t = DEFAULT_REPORT_SECS)]
    report_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mining loop: fetch, search, submit, retask, forever
    Mine,
    /// Solve one puzzle input locally and print `message|digest` (no submission)
    Solve {
        /// Puzzle input to extend
        #[arg(long)]
        input: String,
    },
    /// Print the service's current puzzle input
    Current,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Structured logging: LOG_FORMAT=json for machine collection, human-readable stderr otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let config = MinerConfig {
        server: cli.server,
        owner_key: cli.owner_key,
        solution_prefix: cli.prefix,
        pool_size: cli.workers,
        poll_interval: Duration::from_millis(cli.poll_ms),
        report_interval: Duration::from_secs(cli.report_secs),
    };
    config.validate()?;

    match cli.command {
        Commands::Mine => {
            let progress = Progress::new();
            let _reporter = progress.start_reporter(config.report_interval);
            let service = HttpCoinService::new(&config.server);
            let mut supervisor = Supervisor::new(config, service, progress);
            supervisor.run()
        }
        Commands::Solve { input } => {
            let progress = Progress::new();
            let solution = worker::solve_blocking(&config, &input, &progress)?;
            println!("{}|{}", solution.message, solution.digest);
            Ok(())
        }
        Commands::Current => {
            let service = HttpCoinService::new(&config.server);
            println!("{}", service.fetch_current()?);
            Ok(())
        }
    }
}
