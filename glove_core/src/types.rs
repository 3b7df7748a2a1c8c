//! Core domain types for the glove dipping timer.
//!
//! This module defines the fundamental types used throughout the system:
//! - Timed steps and rotation blocks
//! - Run log entries
//! - Sections and timing modes

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Step Types
// ============================================================================

/// A single named, independently timed activity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub seconds: u32,
}

impl StepConfig {
    pub fn new(name: impl Into<String>, seconds: u32) -> Self {
        Self {
            name: name.into(),
            seconds,
        }
    }

    /// A step only runs when it has a non-zero duration
    pub fn is_active(&self) -> bool {
        self.seconds > 0
    }
}

/// A grouped step made of repeated turns of fixed duration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub title: String,
    pub per_turn_seconds: u32,
    pub turns: u32,
}

impl RotationConfig {
    pub fn new(title: impl Into<String>, per_turn_seconds: u32, turns: u32) -> Self {
        Self {
            title: title.into(),
            per_turn_seconds,
            turns,
        }
    }

    /// Both factors must be positive; either one at zero skips the whole block.
    pub fn is_active(&self) -> bool {
        self.per_turn_seconds > 0 && self.turns > 0
    }

    /// Aggregate duration logged for the block
    ///
    /// Computed in `u64` so the product of two `u32` factors is always exact.
    pub fn total_seconds(&self) -> u64 {
        if self.is_active() {
            u64::from(self.per_turn_seconds) * u64::from(self.turns)
        } else {
            0
        }
    }
}

// ============================================================================
// Run Log Types
// ============================================================================

/// One row of the run log
///
/// Field names serialize as the export column headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "Step")]
    pub step: String,
    #[serde(rename = "Time (s)")]
    pub seconds: u64,
}

impl LogEntry {
    pub fn new(step: impl Into<String>, seconds: u64) -> Self {
        Self {
            step: step.into(),
            seconds,
        }
    }

    pub fn skipped(step: impl Into<String>) -> Self {
        Self::new(step, 0)
    }
}

// ============================================================================
// Section and Mode Types
// ============================================================================

/// The four entry points an operator can trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    PreDip,
    Dip,
    Dip2,
    All,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::PreDip => "Pre-Dip",
            Section::Dip => "Dip",
            Section::Dip2 => "Dip 2",
            Section::All => "All",
        }
    }

    /// Parse the names accepted on the command line and in a session
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().replace(&['_', ' '][..], "-").as_str() {
            "pre-dip" | "predip" | "pre" => Some(Section::PreDip),
            "dip" | "dip-1" | "dip1" => Some(Section::Dip),
            "dip-2" | "dip2" => Some(Section::Dip2),
            "all" => Some(Section::All),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How timed units advance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Timing advances by itself through the clock
    Automatic,
    /// Timing advances only on an explicit continue signal
    Manual,
}

impl Mode {
    pub fn from_automatic(automatic: bool) -> Self {
        if automatic {
            Mode::Automatic
        } else {
            Mode::Manual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_requires_both_factors() {
        assert_eq!(RotationConfig::new("Rotation", 2, 4).total_seconds(), 8);
        assert_eq!(RotationConfig::new("Rotation", 0, 4).total_seconds(), 0);
        assert_eq!(RotationConfig::new("Rotation", 2, 0).total_seconds(), 0);
        assert!(!RotationConfig::new("Rotation", 0, 0).is_active());
    }

    #[test]
    fn test_rotation_total_does_not_cap_at_u32() {
        let rotation = RotationConfig::new("Rotation", u32::MAX, 3);
        assert_eq!(rotation.total_seconds(), 3 * u64::from(u32::MAX));

        let largest = RotationConfig::new("Rotation", u32::MAX, u32::MAX);
        assert_eq!(
            largest.total_seconds(),
            u64::from(u32::MAX) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_section_parse_aliases() {
        assert_eq!(Section::parse("pre-dip"), Some(Section::PreDip));
        assert_eq!(Section::parse("Pre Dip"), Some(Section::PreDip));
        assert_eq!(Section::parse("dip"), Some(Section::Dip));
        assert_eq!(Section::parse("dip_2"), Some(Section::Dip2));
        assert_eq!(Section::parse("ALL"), Some(Section::All));
        assert_eq!(Section::parse("cure"), None);
    }

    #[test]
    fn test_log_entry_serializes_with_export_headers() {
        let json = serde_json::to_string(&LogEntry::new("Coag", 10)).unwrap();
        assert_eq!(json, r#"{"Step":"Coag","Time (s)":10}"#);
    }
}
