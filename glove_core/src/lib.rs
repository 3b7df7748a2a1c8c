#![forbid(unsafe_code)]

//! Core domain model and sequencing engine for the glove dipping timer.
//!
//! This crate provides:
//! - Domain types (steps, rotation blocks, log entries)
//! - The fixed eleven-step dipping sequence and its Dip 2 cascade
//! - The sequencer (automatic and manual timing, event stream)
//! - The session run log with CSV/JSON export
//! - Narration and configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod plan;
pub mod clock;
pub mod events;
pub mod sequencer;
pub mod run_log;
pub mod narration;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, Durations};
pub use plan::{Plan, Unit};
pub use clock::{Clock, SystemClock, VirtualClock};
pub use events::{EventSink, NullSink, RecordingSink, SequenceEvent};
pub use sequencer::{ContinueToken, RunStatus, Sequencer};
pub use run_log::RunLog;
pub use narration::{CommandNarrator, Narration, NarrationSettings, Narrator};
