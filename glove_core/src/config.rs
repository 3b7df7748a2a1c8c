//! Configuration file support for the glove timer.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/glovetimer/config.toml`.
//! Negative durations are clamped to zero and narration settings are clamped
//! into range, so everything past this boundary can work in unsigned seconds.

use crate::{Error, Mode, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

pub const MIN_NARRATION_RATE: f32 = 0.5;
pub const MAX_NARRATION_RATE: f32 = 2.0;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub durations: Durations,

    #[serde(default)]
    pub mode: ModeConfig,

    #[serde(default)]
    pub narration: NarrationConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Per-step durations in seconds, plus rotation turn counts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Durations {
    #[serde(default = "default_short_step", deserialize_with = "clamped_seconds")]
    pub coag: u32,
    #[serde(default = "default_short_step", deserialize_with = "clamped_seconds")]
    pub coag_cure: u32,
    #[serde(default = "default_short_step", deserialize_with = "clamped_seconds")]
    pub dip: u32,
    #[serde(default = "default_per_turn", deserialize_with = "clamped_seconds")]
    pub rotation_per_turn: u32,
    #[serde(default = "default_turns", deserialize_with = "clamped_seconds")]
    pub rotation_turns: u32,
    #[serde(default = "default_short_step", deserialize_with = "clamped_seconds")]
    pub sandy: u32,
    #[serde(default = "default_short_step", deserialize_with = "clamped_seconds")]
    pub leech: u32,
    #[serde(default = "default_cure", deserialize_with = "clamped_seconds")]
    pub cure: u32,
    #[serde(default, deserialize_with = "clamped_seconds")]
    pub dip2: u32,
    #[serde(default = "default_per_turn", deserialize_with = "clamped_seconds")]
    pub rotation2_per_turn: u32,
    #[serde(default = "default_turns", deserialize_with = "clamped_seconds")]
    pub rotation2_turns: u32,
    #[serde(default = "default_short_step", deserialize_with = "clamped_seconds")]
    pub leech2: u32,
    #[serde(default = "default_cure", deserialize_with = "clamped_seconds")]
    pub cure2: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            coag: default_short_step(),
            coag_cure: default_short_step(),
            dip: default_short_step(),
            rotation_per_turn: default_per_turn(),
            rotation_turns: default_turns(),
            sandy: default_short_step(),
            leech: default_short_step(),
            cure: default_cure(),
            dip2: 0,
            rotation2_per_turn: default_per_turn(),
            rotation2_turns: default_turns(),
            leech2: default_short_step(),
            cure2: default_cure(),
        }
    }
}

/// Timing mode configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeConfig {
    #[serde(default = "default_true")]
    pub automatic: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self { automatic: true }
    }
}

impl ModeConfig {
    pub fn mode(&self) -> Mode {
        Mode::from_automatic(self.automatic)
    }
}

/// Spoken announcement configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NarrationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_rate", deserialize_with = "clamped_rate")]
    pub rate: f32,

    #[serde(default = "default_volume", deserialize_with = "clamped_volume")]
    pub volume: f32,

    /// External text-to-speech program
    #[serde(default = "default_tts_command")]
    pub command: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: default_rate(),
            volume: default_volume(),
            command: default_tts_command(),
        }
    }
}

/// Log export configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    #[serde(default = "default_csv_file")]
    pub csv_file: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_file: default_csv_file(),
        }
    }
}

// Default value functions
fn default_short_step() -> u32 {
    10
}

fn default_per_turn() -> u32 {
    2
}

fn default_turns() -> u32 {
    4
}

fn default_cure() -> u32 {
    2400
}

fn default_true() -> bool {
    true
}

fn default_rate() -> f32 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_tts_command() -> String {
    "espeak".into()
}

fn default_csv_file() -> PathBuf {
    PathBuf::from("glove_timer_log.csv")
}

/// Clamp a narration rate into the supported range
pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        return default_rate();
    }
    rate.clamp(MIN_NARRATION_RATE, MAX_NARRATION_RATE)
}

/// Clamp a narration volume into `[0.0, 1.0]`
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return default_volume();
    }
    volume.clamp(0.0, 1.0)
}

fn clamped_seconds<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, i64::from(u32::MAX)) as u32)
}

fn clamped_rate<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clamp_rate(f32::deserialize(deserializer)?))
}

fn clamped_volume<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clamp_volume(f32::deserialize(deserializer)?))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => {
                let home = std::env::var("HOME").map_err(|_| {
                    Error::Config("HOME environment variable not set".into())
                })?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(base.join("glovetimer").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}
