//! Arena simulation runner.
//!
//! Spawns creatures into a bounded world, runs the mover, resolver and
//! reporter threads for a fixed time, then prints the survivors and saves
//! the final state.
//!
//! # Usage
//!
//! ```bash
//! # Ask for the session length interactively
//! arena
//!
//! # Fully specified run
//! arena --duration 20 --seed 42 --population 80 --log-dir logs --summary-json run.json
//! ```
//!
//! Events go to stdout, diagnostics to stderr.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_core::config::{ArenaConfig, DEFAULT_SESSION_SECS};
use arena_headless::{
    prompt::prompt_duration,
    runner::{self, RunOptions, DEFAULT_SAVE_FILE},
    sinks::ConsoleOptions,
};

#[derive(Parser)]
#[command(name = "arena")]
#[command(about = "Multi-threaded arena combat simulation")]
#[command(version)]
struct Cli {
    /// Session length in seconds (prompted for when omitted)
    #[arg(short, long)]
    duration: Option<u64>,

    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for population and worker RNGs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of creatures to spawn (ignored with --scenario)
    #[arg(short, long)]
    population: Option<usize>,

    /// Load creatures from a scenario file instead of spawning randomly
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Where to save the final state
    #[arg(long, default_value = DEFAULT_SAVE_FILE)]
    save: PathBuf,

    /// Directory for combat, movement and event logs
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Do not write log files
    #[arg(long)]
    no_file_log: bool,

    /// Print every movement
    #[arg(long)]
    show_movement: bool,

    /// Do not print the arena map on reporter ticks
    #[arg(long)]
    no_grid: bool,

    /// Write the session report as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the event stream.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("Fatal error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(population) = cli.population {
        config.population = population;
    }

    let duration_secs = match cli.duration {
        Some(0) => DEFAULT_SESSION_SECS,
        Some(secs) => secs,
        None => prompt_duration(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let options = RunOptions {
        config,
        duration: Duration::from_secs(duration_secs),
        scenario: cli.scenario,
        save_path: Some(cli.save),
        log_dir: (!cli.no_file_log).then_some(cli.log_dir),
        console: Some(ConsoleOptions {
            show_movement: cli.show_movement,
            show_grid: !cli.no_grid,
            ..ConsoleOptions::default()
        }),
        summary_json: cli.summary_json,
    };

    print!("{}", runner::banner(&options));
    let outcome = runner::run(&options)?;
    print!("{}", runner::final_summary(&outcome, &options));
    Ok(())
}
