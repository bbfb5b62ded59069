//! Headless session runner.
//!
//! Wires configuration, sinks, population (random or from a scenario file)
//! and a [`Session`] together, then finalizes: survivors are listed, the
//! final state is saved and an optional JSON summary is written.
//! Finalization failures are logged and reported in [`RunOutcome`] but never
//! turn a finished session into an error.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arena_core::config::ArenaConfig;
use arena_core::entity::EntityView;
use arena_core::error::ArenaError;
use arena_core::events::{SinkSet, TracingSink};
use arena_core::registry::EntityRegistry;
use arena_core::scheduler::{Session, SessionReport};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::ascii_grid::{render_stats, render_survivors};
use crate::scenario::{self, ScenarioError};
use crate::sinks::{ConsoleOptions, ConsoleSink, FileSink};

/// Default final-state file.
pub const DEFAULT_SAVE_FILE: &str = "final_state.txt";

/// Errors that stop a run before it finishes.
#[derive(Error, Debug)]
pub enum RunError {
    /// Configuration or session failure.
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// The initial scenario could not be loaded.
    #[error("Failed to load scenario {path}: {source}")]
    Scenario {
        /// Scenario path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ScenarioError,
    },
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// World, population, kinds, timing and seed.
    pub config: ArenaConfig,
    /// Session length.
    pub duration: Duration,
    /// Load entities from this file instead of random population.
    pub scenario: Option<PathBuf>,
    /// Where to save the final state.
    pub save_path: Option<PathBuf>,
    /// Directory for the log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Console output; `None` disables it.
    pub console: Option<ConsoleOptions>,
    /// Write the session report as JSON here.
    pub summary_json: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: ArenaConfig::default(),
            duration: Duration::from_secs(arena_core::config::DEFAULT_SESSION_SECS),
            scenario: None,
            save_path: Some(PathBuf::from(DEFAULT_SAVE_FILE)),
            log_dir: Some(PathBuf::from(".")),
            console: Some(ConsoleOptions::default()),
            summary_json: None,
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Session counters and statistics.
    pub report: SessionReport,
    /// Living entities at the end.
    pub survivors: Vec<EntityView>,
    /// Entities written to the save file, if it was written.
    pub saved: Option<usize>,
    /// Finalization problems that were caught.
    pub warnings: Vec<String>,
}

/// Run one complete session.
pub fn run(options: &RunOptions) -> Result<RunOutcome, RunError> {
    let config = &options.config;
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut warnings = Vec::new();

    let mut sinks = SinkSet::new().with(Arc::new(TracingSink));
    if let Some(console) = &options.console {
        sinks.add(Arc::new(ConsoleSink::stdout(ConsoleOptions {
            bounds: config.world,
            ..console.clone()
        })));
    }
    if let Some(dir) = &options.log_dir {
        match FileSink::open(dir) {
            Ok(file_sink) => sinks.add(Arc::new(file_sink)),
            Err(err) => {
                warn!(dir = %dir.display(), %err, "file logging disabled");
                warnings.push(format!("file logging disabled: {err}"));
            }
        }
    }

    let registry = Arc::new(EntityRegistry::from_config(config, Arc::new(sinks)));
    match &options.scenario {
        Some(path) => {
            scenario::load(&registry, path).map_err(|source| RunError::Scenario {
                path: path.clone(),
                source,
            })?;
        }
        None => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(1);
            registry.populate(config.population, &mut rng)?;
        }
    }

    let report = Session::new(Arc::clone(&registry), config.timing, Some(seed))
        .run_for(options.duration)?;

    let survivors: Vec<EntityView> = registry.snapshot().into_iter().filter(|v| v.alive).collect();

    let saved = options
        .save_path
        .as_deref()
        .and_then(|path| match scenario::save(&registry, path) {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to save final state");
                warnings.push(format!("failed to save final state: {err}"));
                None
            }
        });

    let outcome = RunOutcome {
        report,
        survivors,
        saved,
        warnings,
    };
    let outcome = match &options.summary_json {
        Some(path) => write_summary(outcome, path),
        None => outcome,
    };
    info!(
        survivors = outcome.survivors.len(),
        warnings = outcome.warnings.len(),
        "run finished"
    );
    Ok(outcome)
}

fn write_summary(mut outcome: RunOutcome, path: &Path) -> RunOutcome {
    let written = serde_json::to_string_pretty(&outcome.report)
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(err) = written {
        warn!(path = %path.display(), %err, "failed to write summary");
        outcome
            .warnings
            .push(format!("failed to write summary: {err}"));
    }
    outcome
}

/// Opening banner.
#[must_use]
pub fn banner(options: &RunOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "╔══════════════════════════════════════╗");
    let _ = writeln!(out, "║            ARENA SIMULATION          ║");
    let _ = writeln!(out, "║      multi-threaded combat sandbox   ║");
    let _ = writeln!(out, "╚══════════════════════════════════════╝");
    match &options.scenario {
        Some(path) => {
            let _ = writeln!(out, "Loading creatures from {}", path.display());
        }
        None => {
            let _ = writeln!(
                out,
                "Spawning {} creatures at random positions",
                options.config.population
            );
        }
    }
    let _ = writeln!(out, "Session length: {} seconds", options.duration.as_secs());
    out
}

/// Closing summary: statistics, survivors and where the state went.
#[must_use]
pub fn final_summary(outcome: &RunOutcome, options: &RunOptions) -> String {
    let report = &outcome.report;
    let mut out = String::new();
    let _ = writeln!(out, "\n╔══════════════════════════════════════╗");
    let _ = writeln!(out, "║           SESSION FINISHED           ║");
    let _ = writeln!(out, "╚══════════════════════════════════════╝");
    let _ = writeln!(out, "Started with: {}", report.initial.alive);
    let _ = writeln!(out, "Survivors:    {}", report.final_stats.alive);
    let _ = writeln!(
        out,
        "Destroyed:    {}",
        report.initial.alive.saturating_sub(report.final_stats.alive)
    );
    let _ = writeln!(
        out,
        "Battles: {}  No contest: {}  Stale: {}  Unresolved: {}",
        report.battles, report.no_contests, report.stale, report.unresolved
    );
    out.push_str(&render_stats(&report.final_stats));
    let _ = writeln!(out, "Survivors:");
    out.push_str(&render_survivors(&outcome.survivors));
    match (outcome.saved, &options.save_path) {
        (Some(count), Some(path)) => {
            let _ = writeln!(out, "\nFinal state ({count} creatures) saved to {}", path.display());
        }
        (None, Some(_)) => {
            let _ = writeln!(out, "\nFinal state could not be saved");
        }
        _ => {}
    }
    for warning in &outcome.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    let _ = writeln!(out, "Seed: {}", report.seed);
    out
}
