//! Optional YAML settings for the CLI. Flags override file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How results are written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Decimal places for displayed percentages and points.
    pub precision: usize,
    pub format: OutputFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            precision: 2,
            format: OutputFormat::Text,
            log_level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn with_overrides(mut self, format: Option<OutputFormat>, precision: Option<usize>) -> Self {
        if let Some(format) = format {
            self.format = format;
        }
        if let Some(precision) = precision {
            self.precision = precision;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(CliConfig::from_yaml("").unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let cfg = CliConfig::from_yaml("precision: 1\nformat: json\n").unwrap();
        assert_eq!(cfg.precision, 1);
        assert_eq!(cfg.format, OutputFormat::Json);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(CliConfig::from_yaml("format: xml").is_err());
    }

    #[test]
    fn flags_override_file() {
        let cfg = CliConfig::from_yaml("precision: 4\nformat: json")
            .unwrap()
            .with_overrides(Some(OutputFormat::Text), None);
        assert_eq!(cfg.format, OutputFormat::Text);
        assert_eq!(cfg.precision, 4);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CliConfig::load(Path::new("/nonexistent/gradebook.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/gradebook.yaml"));
    }
}
