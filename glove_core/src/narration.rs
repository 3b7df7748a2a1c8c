//! Spoken announcements for sequencer events.
//!
//! [`Narration`] subscribes to the event stream and turns starts and
//! completions into short phrases for a [`Narrator`]. Speech is best effort:
//! a failing narrator is logged and ignored, never surfaced to the run.

use crate::config::{clamp_rate, clamp_volume, NarrationConfig};
use crate::{Error, EventSink, Result, SequenceEvent};
use std::process::{Child, Command, Stdio};

pub const TEST_PHRASE: &str = "Voice test is working.";

/// espeak speaking speed at rate 1.0, in words per minute
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Text-to-speech backend
pub trait Narrator {
    /// Stop whatever is currently being spoken
    fn cancel(&mut self) -> Result<()>;

    fn speak(&mut self, text: &str, rate: f32, volume: f32) -> Result<()>;
}

impl<N: Narrator + ?Sized> Narrator for Box<N> {
    fn cancel(&mut self) -> Result<()> {
        (**self).cancel()
    }

    fn speak(&mut self, text: &str, rate: f32, volume: f32) -> Result<()> {
        (**self).speak(text, rate, volume)
    }
}

/// Voice settings applied to every utterance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NarrationSettings {
    pub enabled: bool,
    pub rate: f32,
    pub volume: f32,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 1.0,
            volume: 1.0,
        }
    }
}

impl From<&NarrationConfig> for NarrationSettings {
    fn from(config: &NarrationConfig) -> Self {
        Self {
            enabled: config.enabled,
            rate: clamp_rate(config.rate),
            volume: clamp_volume(config.volume),
        }
    }
}

/// Phrase spoken for an event, if any
///
/// Ticks, turns and skips stay silent.
pub fn phrase_for(event: &SequenceEvent) -> Option<String> {
    match event {
        SequenceEvent::StepStarted { name, seconds } => {
            Some(format!("Starting {} for {} seconds.", name, seconds))
        }
        SequenceEvent::StepCompleted { name, .. } => Some(format!("{} complete.", name)),
        SequenceEvent::RotationStarted {
            title,
            turns,
            per_turn_seconds,
        } => Some(format!(
            "Starting {}. {} turns at {} seconds per turn.",
            title.to_lowercase(),
            turns,
            per_turn_seconds
        )),
        SequenceEvent::RotationCompleted { title, .. } => Some(format!("{} complete.", title)),
        _ => None,
    }
}

/// Event sink that speaks announcements
pub struct Narration<N: Narrator> {
    narrator: N,
    settings: NarrationSettings,
}

impl<N: Narrator> Narration<N> {
    pub fn new(narrator: N, settings: NarrationSettings) -> Self {
        Self { narrator, settings }
    }

    pub fn settings(&self) -> NarrationSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: NarrationSettings) {
        self.settings = NarrationSettings {
            enabled: settings.enabled,
            rate: clamp_rate(settings.rate),
            volume: clamp_volume(settings.volume),
        };
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// Speak the fixed test phrase, even when announcements are disabled
    pub fn test_voice(&mut self) {
        self.say(TEST_PHRASE);
    }

    /// Cancel any in-flight utterance, then speak `text`
    pub fn say(&mut self, text: &str) {
        if let Err(e) = self.narrator.cancel() {
            tracing::warn!("Failed to cancel previous utterance: {}", e);
        }
        match self
            .narrator
            .speak(text, self.settings.rate, self.settings.volume)
        {
            Ok(()) => tracing::debug!("Spoke {:?}", text),
            Err(e) => tracing::warn!("Narration failed for {:?}: {}", text, e),
        }
    }
}

impl<N: Narrator> EventSink for Narration<N> {
    fn emit(&mut self, event: &SequenceEvent) {
        if !self.settings.enabled {
            return;
        }
        if let Some(text) = phrase_for(event) {
            self.say(&text);
        }
    }
}

/// Narrator that speaks through an external program such as `espeak`
///
/// The program is invoked as `PROGRAM -s WPM -a AMPLITUDE TEXT`.
#[derive(Debug)]
pub struct CommandNarrator {
    program: String,
    child: Option<Child>,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed for one utterance
    pub fn args(text: &str, rate: f32, volume: f32) -> Vec<String> {
        let words_per_minute = (BASE_WORDS_PER_MINUTE * clamp_rate(rate)).round() as u32;
        let amplitude = (clamp_volume(volume) * 100.0).round() as u32;
        vec![
            "-s".into(),
            words_per_minute.to_string(),
            "-a".into(),
            amplitude.to_string(),
            text.to_string(),
        ]
    }
}

impl Narrator for CommandNarrator {
    fn cancel(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            if child.try_wait()?.is_none() {
                child.kill()?;
                child.wait()?;
                tracing::debug!("Cancelled in-flight utterance");
            }
        }
        Ok(())
    }

    fn speak(&mut self, text: &str, rate: f32, volume: f32) -> Result<()> {
        let child = Command::new(&self.program)
            .args(Self::args(text, rate, volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Narration(format!("failed to run {}: {}", self.program, e)))?;
        self.child = Some(child);
        Ok(())
    }
}
