use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Sentence segmentation settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Export settings
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,

    /// Output file handling
    #[serde(default)]
    pub output: OutputConfig,
}

/// Segmentation configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    // @field: Split paragraphs into sentences (false: one segment per paragraph)
    #[serde(default = "default_true")]
    pub split_sentences: bool,

    // @field: Extra abbreviations that never end a sentence, e.g. "approx."
    #[serde(default)]
    pub extra_abbreviations: Vec<String>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            split_sentences: default_true(),
            extra_abbreviations: Vec::new(),
        }
    }
}

/// Formatting carry-over for untagged edited text
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CarryOverConfig {
    // @field: Apply source formatting to untagged edited text
    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: Formatted share of the source at or above which the whole text is formatted
    #[serde(default = "default_whole_segment_threshold")]
    pub whole_segment_threshold: f64,
}

impl Default for CarryOverConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            whole_segment_threshold: default_whole_segment_threshold(),
        }
    }
}

/// Reconstruction configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReconstructionConfig {
    #[serde(default)]
    pub carry_over: CarryOverConfig,

    // @field: Requested style name → replacement style name
    #[serde(default)]
    pub style_fallbacks: BTreeMap<String, String>,

    // @field: Style used when neither the name nor a fallback resolves
    #[serde(default = "default_style")]
    pub default_style: String,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            carry_over: CarryOverConfig::default(),
            style_fallbacks: BTreeMap::new(),
            default_style: default_style(),
        }
    }
}

/// Output configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct OutputConfig {
    // @field: Replace existing output files without asking
    #[serde(default)]
    pub force_overwrite: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
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
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_whole_segment_threshold() -> f64 {
    0.6
}

fn default_style() -> String {
    "Normal".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let threshold = self.reconstruction.carry_over.whole_segment_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "reconstruction.carry_over.whole_segment_threshold must be between 0 and 1, got {}",
                threshold
            ));
        }

        if self.reconstruction.default_style.trim().is_empty() {
            return Err(anyhow!("reconstruction.default_style must not be empty"));
        }

        if let Some((from, _)) = self
            .reconstruction
            .style_fallbacks
            .iter()
            .find(|(from, to)| from.trim().is_empty() || to.trim().is_empty())
        {
            return Err(anyhow!("Empty style name in style_fallbacks entry '{}'", from));
        }

        Ok(())
    }

    /// Load the configuration file, creating it with defaults if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!(
            "Config file not found at '{}', creating default config.",
            path.display()
        );
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            segmentation: SegmentationConfig::default(),
            reconstruction: ReconstructionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default_shouldValidate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.segmentation.split_sentences);
        assert_eq!(config.reconstruction.carry_over.whole_segment_threshold, 0.6);
        assert_eq!(config.reconstruction.default_style, "Normal");
    }

    #[test]
    fn test_config_deserialize_withEmptyObject_shouldUseDefaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_withPartialSection_shouldFillRest() {
        let json = r#"{"reconstruction": {"carry_over": {"enabled": false}}, "log_level": "debug"}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert!(!config.reconstruction.carry_over.enabled);
        assert_eq!(config.reconstruction.carry_over.whole_segment_threshold, 0.6);
        assert_eq!(config.reconstruction.default_style, "Normal");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_config_validate_withBadThreshold_shouldFail() {
        let mut config = Config::default();
        config.reconstruction.carry_over.whole_segment_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_withEmptyDefaultStyle_shouldFail() {
        let mut config = Config::default();
        config.reconstruction.default_style = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config
            .reconstruction
            .style_fallbacks
            .insert("Titel".to_string(), String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_loadOrCreate_shouldWriteDefaultsThenReload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docweave.json");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_or_create(&path).unwrap();
        assert_eq!(created, loaded);
    }

    #[test]
    fn test_logLevel_toLevelFilter_shouldMap() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
    }
}
