//! Configuration parsing and validation.
//!
//! Catalog Indexer is configured through a TOML file (default
//! `./config/catidx.toml`). Every section and key has a default, so an empty
//! file is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! [feed]
//! root = "./feeds"
//! include_globs = ["**/*.xml"]
//! exclude_globs = ["**/archive/**"]
//!
//! [index]
//! name = "new_core"
//! batch_size = 500
//! output = "./out/documents.jsonl"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where feed files are discovered.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            root: default_feed_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_feed_root() -> PathBuf {
    PathBuf::from("./feeds")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.xml".to_string()]
}

/// Target index and how documents are shipped to it.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Document output file; stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            batch_size: default_batch_size(),
            output: None,
        }
    }
}

fn default_index_name() -> String {
    "new_core".to_string()
}
fn default_batch_size() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Built-in defaults, used when no config file exists and the command
    /// was given explicit feed files.
    pub fn minimal() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<()> {
        if self.index.batch_size == 0 {
            anyhow::bail!("index.batch_size must be > 0");
        }
        if self.index.name.trim().is_empty() {
            anyhow::bail!("index.name must not be empty");
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            anyhow::bail!(
                "Unknown logging.level: '{}'. Must be one of {}.",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("catidx.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn empty_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&write(&tmp, "")).unwrap();
        assert_eq!(config.index.name, "new_core");
        assert_eq!(config.index.batch_size, 500);
        assert!(config.index.output.is_none());
        assert_eq!(config.feed.include_globs, vec!["**/*.xml"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_all_sections() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            r#"
[feed]
root = "/data/feeds"
include_globs = ["**/*.pies.xml"]
exclude_globs = ["**/old/**"]
follow_symlinks = true

[index]
name = "parts"
batch_size = 50
output = "docs.jsonl"

[logging]
level = "debug"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.feed.root, PathBuf::from("/data/feeds"));
        assert_eq!(config.feed.exclude_globs, vec!["**/old/**"]);
        assert!(config.feed.follow_symlinks);
        assert_eq!(config.index.name, "parts");
        assert_eq!(config.index.batch_size, 50);
        assert_eq!(config.index.output, Some(PathBuf::from("docs.jsonl")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_zero_batch_size() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(&write(&tmp, "[index]\nbatch_size = 0\n")).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(&write(&tmp, "[logging]\nlevel = \"loud\"\n")).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn missing_file_is_an_error_but_falls_back_when_asked() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.toml");
        assert!(load_config(&path).is_err());
        let config = load_config_or_default(&path).unwrap();
        assert_eq!(config.index.batch_size, 500);
    }
}
