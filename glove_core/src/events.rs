//! Events emitted by the sequencer while a plan runs.
//!
//! Sinks are advisory subscribers (terminal view, narration). Emission has
//! no return value: nothing a sink does can change control flow or the log.

use crate::sequencer::ContinueToken;
use serde::Serialize;

/// Something that happened during a run
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SequenceEvent {
    RunStarted {
        units: usize,
        planned_seconds: u64,
    },
    StepStarted {
        name: String,
        seconds: u32,
    },
    /// One automatic-mode second is about to elapse
    Tick {
        name: String,
        remaining: u32,
        progress: f32,
    },
    StepCompleted {
        name: String,
        seconds: u64,
    },
    StepSkipped {
        name: String,
    },
    RotationStarted {
        title: String,
        turns: u32,
        per_turn_seconds: u32,
    },
    TurnStarted {
        title: String,
        turn: u32,
        turns: u32,
    },
    RotationCompleted {
        title: String,
        seconds: u64,
    },
    RotationSkipped {
        title: String,
    },
    /// Dependent step zeroed because its gating step was skipped
    CascadeSkipped {
        name: String,
    },
    /// Manual mode: waiting for the operator
    AwaitingContinue {
        token: ContinueToken,
        seconds: u32,
    },
    RunFinished {
        entries: usize,
        seconds: u64,
    },
}

/// Subscriber to sequencer events
pub trait EventSink {
    fn emit(&mut self, event: &SequenceEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &SequenceEvent) {
        (**self).emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &SequenceEvent) {
        (**self).emit(event);
    }
}

/// Sink that drops everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &SequenceEvent) {}
}

/// Sink that keeps every event, mainly for tests
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Vec<SequenceEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SequenceEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of tick events recorded for a step
    pub fn ticks_for(&self, name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SequenceEvent::Tick { name: n, .. } if n == name))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SequenceEvent) {
        self.events.push(event.clone());
    }
}

/// Both sinks see every event, left first
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &SequenceEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
