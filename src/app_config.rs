use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::combiner::{CombineOptions, DEFAULT_GAP_THRESHOLD_MS, DEFAULT_MAX_CHARS};
use crate::speaking_rate::DEFAULT_TARGET_RATE;

/// Application configuration module
/// This module handles loading, validating and saving the settings
/// of the parser, the combiner and the track runner.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Parser settings
    #[serde(default)]
    pub parse: ParseConfig,

    /// Combiner settings
    #[serde(default)]
    pub combine: CombineConfig,

    /// Track runner settings
    #[serde(default)]
    pub tracks: TrackConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Parser configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ParseConfig {
    // @field: Margin in ms moved inward from both ends of every cue
    #[serde(default)]
    pub buffer_ms: i64,
}

/// Combiner configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CombineConfig {
    // @field: Whether merging runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: Target characters per second
    #[serde(default = "default_target_rate")]
    pub target_rate: f64,

    // @field: Gaps at or above this are never bridged
    #[serde(default = "default_gap_threshold_ms")]
    pub gap_threshold_ms: i64,

    // @field: Maximum translated length of a merged entry
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            target_rate: default_target_rate(),
            gap_threshold_ms: default_gap_threshold_ms(),
            max_chars: default_max_chars(),
        }
    }
}

impl CombineConfig {
    /// Combiner options described by this configuration
    pub fn options(&self) -> CombineOptions {
        CombineOptions {
            target_rate: self.target_rate,
            gap_threshold_ms: self.gap_threshold_ms,
            max_chars: self.max_chars,
        }
    }
}

/// Track runner configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrackConfig {
    // @field: Language tracks processed at the same time
    #[serde(default = "default_max_concurrent_tracks")]
    pub max_concurrent_tracks: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tracks: default_max_concurrent_tracks(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_target_rate() -> f64 {
    DEFAULT_TARGET_RATE
}

fn default_gap_threshold_ms() -> i64 {
    DEFAULT_GAP_THRESHOLD_MS
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_max_concurrent_tracks() -> usize {
    4
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.parse.buffer_ms < 0 {
            return Err(anyhow!("parse.buffer_ms must not be negative, got {}", self.parse.buffer_ms));
        }

        self.combine
            .options()
            .validate()
            .map_err(|e| anyhow!("Invalid combine settings: {}", e))?;

        if self.tracks.max_concurrent_tracks == 0 {
            return Err(anyhow!("tracks.max_concurrent_tracks must be at least 1"));
        }

        Ok(())
    }

    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
