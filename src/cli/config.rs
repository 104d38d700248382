//! TOML configuration file support.
//!
//! Settings for the import command can be kept in a config file instead of
//! being passed as flags every time:
//!
//! ```toml
//! # mzscan.toml
//! [import]
//! store = "temp-file"
//! scratch_dir = "/scratch/mzscan"
//! progress_interval = 1000
//! ```
//!
//! Flags given on the command line take precedence.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use mzscan::store::StoreKind;

/// Root configuration structure for mzscan.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Import-specific settings.
    #[serde(default)]
    pub import: ImportSection,
}

/// Configuration for the import command.
#[derive(Debug, Default, Deserialize)]
pub struct ImportSection {
    /// Data point store backend.
    pub store: Option<StoreKind>,

    /// Directory for disk-backed stores.
    pub scratch_dir: Option<PathBuf>,

    /// Scans between progress log lines.
    pub progress_interval: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [import]
            store = "embedded-db"
            scratch_dir = "/tmp/mzscan"
            progress_interval = 250
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.import.store, Some(StoreKind::EmbeddedDb));
        assert_eq!(config.import.scratch_dir, Some(PathBuf::from("/tmp/mzscan")));
        assert_eq!(config.import.progress_interval, Some(250));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [import]
            store = "temp-file"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.import.store, Some(StoreKind::TempFile));
        assert_eq!(config.import.scratch_dir, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.import.store, None);
    }

    #[test]
    fn test_unknown_store_is_rejected() {
        let toml = r#"
            [import]
            store = "tape"
        "#;
        assert!(Config::from_str(toml).is_err());
    }
}
