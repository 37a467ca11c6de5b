/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::fs;

use crate::common;
use docweave::app_config::{Config, LogLevel};
use docweave::reconstruction::ReconstructionOptions;

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldCreateDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("docweave.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    Ok(())
}

/// Test that values in an existing file are honored
#[test]
fn test_load_or_create_withExistingFile_shouldReadValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "docweave.json",
        r#"{
            "log_level": "warn",
            "segmentation": {"split_sentences": false},
            "reconstruction": {
                "carry_over": {"whole_segment_threshold": 0.75},
                "style_fallbacks": {"Überschrift 1": "Heading 1"},
                "default_style": "Body Text"
            },
            "output": {"force_overwrite": true}
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.log_level, LogLevel::Warn);
    assert!(!config.segmentation.split_sentences);
    assert!(config.reconstruction.carry_over.enabled);
    assert_eq!(config.reconstruction.carry_over.whole_segment_threshold, 0.75);
    assert_eq!(
        config.reconstruction.style_fallbacks.get("Überschrift 1"),
        Some(&"Heading 1".to_string())
    );
    assert_eq!(config.reconstruction.default_style, "Body Text");
    assert!(config.output.force_overwrite);
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that a broken config file is reported rather than replaced
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "docweave.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test that save and reload round-trip every field
#[test]
fn test_save_thenLoad_shouldPreserveConfig() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let mut config = Config::default();
    config.segmentation.extra_abbreviations = vec!["approx.".to_string()];
    config.reconstruction.carry_over.enabled = false;
    config.save(&path)?;

    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

/// Test that reconstruction options follow the carry-over settings
#[test]
fn test_reconstructionOptions_fromConfig_shouldCopyCarryOver() {
    let mut config = Config::default();
    config.reconstruction.carry_over.whole_segment_threshold = 0.9;

    let options = ReconstructionOptions::from(&config.reconstruction);

    assert_eq!(options.carry_over.whole_segment_threshold, 0.9);
    assert!(options.carry_over.enabled);
}
