//! Pipeline configuration
//!
//! Directory layout and cleaning knobs for a full run. Every field has a
//! default, so a config file only needs the values it changes.

use crate::cleaning::IDENTIFYING_COLUMNS;
use crate::error::BadgeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of leading rows searched for the header row
pub const DEFAULT_HEADER_PROBE_ROWS: usize = 10;

/// Settings for the folder-level pipeline stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw survey exports
    pub raw_dir: PathBuf,
    /// Cleaned batches (input to badges and streaks)
    pub cleaned_dir: PathBuf,
    /// Per-batch badge listings
    pub badges_dir: PathBuf,
    /// Cross-batch badge totals file
    pub totals_path: PathBuf,
    /// Final streak table file
    pub streak_path: PathBuf,
    /// Rows searched for the `Status` header in raw exports
    pub header_probe_rows: usize,
    /// Columns stripped during cleaning
    pub identifying_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("Sample Data"),
            cleaned_dir: PathBuf::from("Cleaned data"),
            badges_dir: PathBuf::from("Badges_data"),
            totals_path: PathBuf::from("totalbadgecount.json"),
            streak_path: PathBuf::from("streak_results.json"),
            header_probe_rows: DEFAULT_HEADER_PROBE_ROWS,
            identifying_columns: IDENTIFYING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, BadgeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, BadgeError> {
        let content = fs::read_to_string(path).map_err(|e| BadgeError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), BadgeError> {
        if self.header_probe_rows == 0 {
            return Err(BadgeError::Config(
                "header_probe_rows must be at least 1".to_string(),
            ));
        }
        if self.badges_dir.as_os_str().is_empty() {
            return Err(BadgeError::Config("badges_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"cleaned_dir": "out/clean", "header_probe_rows": 3}"#)
                .unwrap();

        assert_eq!(config.cleaned_dir, PathBuf::from("out/clean"));
        assert_eq!(config.header_probe_rows, 3);
        assert_eq!(config.badges_dir, PathBuf::from("Badges_data"));
        assert_eq!(config.identifying_columns.len(), IDENTIFYING_COLUMNS.len());
    }

    #[test]
    fn test_zero_probe_rows_rejected() {
        let err = PipelineConfig::from_json(r#"{"header_probe_rows": 0}"#).unwrap_err();
        assert!(matches!(err, BadgeError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badgeboard.json");
        fs::write(&path, r#"{"streak_path": "streaks.json"}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.streak_path, PathBuf::from("streaks.json"));
    }
}
