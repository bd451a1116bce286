/*!
 * Tests for application configuration
 */

use anyhow::Result;
use subpace::app_config::{Config, LogLevel};
use subpace::combiner::CombineOptions;
use crate::common;

/// Test default values match the combiner defaults
#[test]
fn test_default_config_withNoChanges_shouldMatchCombinerDefaults() {
    let config = Config::default();
    assert_eq!(config.combine.options(), CombineOptions::default());
    assert!(config.combine.enabled);
    assert_eq!(config.parse.buffer_ms, 0);
    assert_eq!(config.tracks.max_concurrent_tracks, 4);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test that a missing file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config, Config::default());

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded, config);
    Ok(())
}

/// Test that saved values survive a reload
#[test]
fn test_save_then_load_withCustomValues_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let mut config = Config::default();
    config.parse.buffer_ms = 80;
    config.combine.max_chars = 96;
    config.combine.enabled = false;
    config.log_level = LogLevel::Trace;
    config.save(&path)?;

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded, config);
    Ok(())
}

/// Test a partial file falls back to defaults per field
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "partial.json",
        r#"{ "combine": { "gap_threshold_ms": 250 }, "tracks": { "max_concurrent_tracks": 2 } }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.combine.gap_threshold_ms, 250);
    assert_eq!(config.combine.max_chars, 200);
    assert_eq!(config.tracks.max_concurrent_tracks, 2);
    assert_eq!(config.log_level, LogLevel::Info);
    Ok(())
}

/// Test malformed JSON is reported
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// Test validation rejects out-of-range values
#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.combine.gap_threshold_ms = -1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.combine.target_rate = -3.0;
    assert!(config.validate().is_err());
}

/// Test log level conversion
#[test]
fn test_log_level_withEachVariant_shouldMapToFilter() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
