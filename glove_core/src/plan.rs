//! The fixed dipping sequence and how each section resolves to runnable units.
//!
//! A [`Plan`] is built fresh from the configured [`Durations`] every time a
//! section is triggered. The Dip 2 cascade is decided here: when Dip 2 is
//! zero, Rotation 2 and Leech 2 become [`Unit::Forced`] entries that are
//! logged at zero without ever running.

use crate::{Durations, LogEntry, RotationConfig, Section, StepConfig};

pub const COAG: &str = "Coag";
pub const COAG_CURE: &str = "Coag Cure";
pub const DIP: &str = "Dip";
pub const ROTATION: &str = "Rotation";
pub const SANDY: &str = "SANDY";
pub const LEECH: &str = "Leech";
pub const CURE: &str = "Cure";
pub const DIP_2: &str = "Dip 2";
pub const ROTATION_2: &str = "Rotation 2";
pub const LEECH_2: &str = "Leech 2";
pub const CURE_2: &str = "Cure 2";

/// Every log row of a full run, in order
pub const SEQUENCE: [&str; 11] = [
    COAG, COAG_CURE, DIP, ROTATION, SANDY, LEECH, CURE, DIP_2, ROTATION_2, LEECH_2, CURE_2,
];

/// One schedulable piece of a section
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    Step(StepConfig),
    Rotation(RotationConfig),
    /// Logged at zero seconds without invoking a runner
    Forced(String),
}

impl Unit {
    pub fn name(&self) -> &str {
        match self {
            Unit::Step(step) => &step.name,
            Unit::Rotation(rotation) => &rotation.title,
            Unit::Forced(name) => name,
        }
    }

    /// The entry this unit contributes to the run log once it finishes
    pub fn log_entry(&self) -> LogEntry {
        match self {
            Unit::Step(step) if step.is_active() => LogEntry::new(&step.name, u64::from(step.seconds)),
            Unit::Step(step) => LogEntry::skipped(&step.name),
            Unit::Rotation(rotation) => {
                LogEntry::new(&rotation.title, rotation.total_seconds())
            }
            Unit::Forced(name) => LogEntry::skipped(name),
        }
    }
}

/// Ordered units for one triggered run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    units: Vec<Unit>,
}

impl Plan {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// Plan with a single timed step
    pub fn step(name: impl Into<String>, seconds: u32) -> Self {
        Self::new(vec![Unit::Step(StepConfig::new(name, seconds))])
    }

    /// Plan with a single rotation block
    pub fn rotation(title: impl Into<String>, per_turn_seconds: u32, turns: u32) -> Self {
        Self::new(vec![Unit::Rotation(RotationConfig::new(
            title,
            per_turn_seconds,
            turns,
        ))])
    }

    /// Resolve a section against the configured durations
    pub fn for_section(section: Section, durations: &Durations) -> Self {
        match section {
            Section::PreDip => Self::new(pre_dip(durations)),
            Section::Dip => Self::new(dip_block(durations)),
            Section::Dip2 => Self::new(dip2_block(durations)),
            Section::All => {
                let mut units = pre_dip(durations);
                units.extend(dip_block(durations));
                units.extend(dip2_block(durations));
                Self::new(units)
            }
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Seconds the plan will log if it runs to the end
    pub fn planned_seconds(&self) -> u64 {
        self.units
            .iter()
            .map(|unit| unit.log_entry().seconds)
            .sum()
    }
}

fn pre_dip(d: &Durations) -> Vec<Unit> {
    vec![
        Unit::Step(StepConfig::new(COAG, d.coag)),
        Unit::Step(StepConfig::new(COAG_CURE, d.coag_cure)),
        Unit::Step(StepConfig::new(DIP, d.dip)),
    ]
}

fn dip_block(d: &Durations) -> Vec<Unit> {
    vec![
        Unit::Rotation(RotationConfig::new(
            ROTATION,
            d.rotation_per_turn,
            d.rotation_turns,
        )),
        Unit::Step(StepConfig::new(SANDY, d.sandy)),
        Unit::Step(StepConfig::new(LEECH, d.leech)),
        Unit::Step(StepConfig::new(CURE, d.cure)),
    ]
}

fn dip2_block(d: &Durations) -> Vec<Unit> {
    let mut units = vec![Unit::Step(StepConfig::new(DIP_2, d.dip2))];
    if d.dip2 > 0 {
        units.push(Unit::Rotation(RotationConfig::new(
            ROTATION_2,
            d.rotation2_per_turn,
            d.rotation2_turns,
        )));
        units.push(Unit::Step(StepConfig::new(LEECH_2, d.leech2)));
    } else {
        units.push(Unit::Forced(ROTATION_2.into()));
        units.push(Unit::Forced(LEECH_2.into()));
    }
    units.push(Unit::Step(StepConfig::new(CURE_2, d.cure2)));
    units
}
