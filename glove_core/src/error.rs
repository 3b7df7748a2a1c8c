//! Failures that can reach a caller of the timer library.
//!
//! Timing itself never fails. Errors come from the edges: reading the config
//! file, writing an exported log, launching the speech program, or handing
//! back a continue token that no longer matches the paused run.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Log could not be rendered as JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Log could not be written as CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Config file exists but does not parse
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Speech program missing or failed to start. Callers inside a run log
    /// this and carry on.
    #[error("Narration error: {0}")]
    Narration(String),

    /// Stale, foreign or unexpected continue token
    #[error("Continue error: {0}")]
    Continue(String),
}
