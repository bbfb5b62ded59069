//! Terminal front end for the arena simulation.
//!
//! Everything around a [`arena_core::scheduler::Session`] that touches the
//! outside world lives here:
//!
//! - [`sinks`]: console and log-file event sinks
//! - [`ascii_grid`]: the 50×20 arena map and statistics table
//! - [`scenario`]: plain-text save/load of entity lists
//! - [`prompt`]: interactive session-length prompt
//! - [`runner`]: one complete run from options to final summary
//!
//! # Example
//!
//! ```bash
//! # Prompt for a duration, then run with 50 random creatures
//! cargo run -p arena_headless
//!
//! # Ten seconds, reproducible population, no map
//! cargo run -p arena_headless -- --duration 10 --seed 7 --no-grid
//!
//! # Resume from a saved state
//! cargo run -p arena_headless -- --duration 10 --scenario final_state.txt
//! ```

pub mod ascii_grid;
pub mod prompt;
pub mod runner;
pub mod scenario;
pub mod sinks;

pub use ascii_grid::{render_grid, render_stats, GridConfig};
pub use runner::{run, RunError, RunOptions, RunOutcome};
pub use scenario::{ScenarioEntry, ScenarioError};
pub use sinks::{ConsoleOptions, ConsoleSink, FileSink};
