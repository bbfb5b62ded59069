//! Error types for the arena simulation.

use thiserror::Error;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Top-level error type for all arena simulation errors.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// A position lies outside the world bounds.
    #[error("Position ({x}, {y}) is outside the world bounds")]
    OutOfBounds {
        /// Requested X coordinate.
        x: f64,
        /// Requested Y coordinate.
        y: f64,
    },

    /// An entity kind or direction token could not be recognized.
    #[error("Unknown kind or direction: {0:?}")]
    UnknownKind(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// A session worker thread panicked.
    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),
}
