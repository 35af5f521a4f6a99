//! Persisted user settings.
//!
//! Settings are stored in TOML format and supply defaults for the CLI:
//! destination folder, scan filters, rule and journal file locations, and
//! watcher timing.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sorting]
//! default_destination = "/home/me/Documents/Sorted_Files"
//! recursive = true
//! smart_sorting = false
//!
//! [filters]
//! excluded_extensions = [".tmp", ".log", ".cache"]
//! exclude_patterns = ["**/node_modules/**"]
//! min_size = 0
//! max_size = 1073741824
//!
//! [watch]
//! poll_interval_ms = 2000
//! error_backoff_ms = 5000
//! join_timeout_ms = 1000
//! ```

use crate::filter::FilterSpec;
use crate::rules::RuleSet;
use crate::watcher::WatchConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the per-directory settings file.
pub const LOCAL_CONFIG_FILE: &str = ".smartsortrc.toml";

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// IO error while reading or writing configuration.
    #[error("IO error accessing configuration: {0}")]
    IoError(#[from] std::io::Error),
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sorting: SortingSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub watch: WatchSettings,
}

/// Where files go and how they are categorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingSettings {
    /// Destination used when `sort` is run without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_destination: Option<PathBuf>,
    /// Descend into subdirectories while scanning.
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Apply heuristic categorization after scanning.
    #[serde(default)]
    pub smart_sorting: bool,
    /// Custom rules file; defaults to `custom_rules.json` in the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
    /// Undo journal; defaults to `undo_log.json` in the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_file: Option<PathBuf>,
}

impl Default for SortingSettings {
    fn default() -> Self {
        Self {
            default_destination: None,
            recursive: true,
            smart_sorting: false,
            rules_file: None,
            journal_file: None,
        }
    }
}

/// Scan filter defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub min_size: u64,
    /// Upper size bound; unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            excluded_extensions: default_excluded_extensions(),
            exclude_patterns: Vec::new(),
            min_size: 0,
            max_size: None,
        }
    }
}

/// Watcher timing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_excluded_extensions() -> Vec<String> {
    vec![".tmp".to_string(), ".log".to_string(), ".cache".to_string()]
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_error_backoff_ms() -> u64 {
    5000
}

fn default_join_timeout_ms() -> u64 {
    1000
}

/// Directory holding the settings, rules and journal files.
///
/// `$HOME/.config/smartsort`, or the current directory if `HOME` is unset.
pub fn config_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config").join("smartsort"),
        None => PathBuf::from("."),
    }
}

impl Settings {
    /// Load settings, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.smartsortrc.toml` in the current directory
    /// 3. Look for `~/.config/smartsort/config.toml`
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error only if an explicitly provided file cannot be read or
    /// parsed. A discovered file that is invalid is logged and ignored.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let candidates = [
            PathBuf::from(LOCAL_CONFIG_FILE),
            config_dir().join("config.toml"),
        ];
        for candidate in candidates {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(settings) => {
                        debug!("Loaded settings from {}", candidate.display());
                        return Ok(settings);
                    }
                    Err(e) => {
                        warn!("Ignoring {}: {}", candidate.display(), e);
                        return Ok(Self::default());
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Renders the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Writes the settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn rules_path(&self) -> PathBuf {
        self.sorting
            .rules_file
            .clone()
            .unwrap_or_else(|| config_dir().join("custom_rules.json"))
    }

    pub fn journal_path(&self) -> PathBuf {
        self.sorting
            .journal_file
            .clone()
            .unwrap_or_else(|| config_dir().join("undo_log.json"))
    }

    /// Builds a filter spec from the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern is not a valid glob.
    pub fn filter_spec(&self, rules: RuleSet) -> Result<FilterSpec, ConfigError> {
        Ok(FilterSpec::new()
            .with_excluded_extensions(&self.filters.excluded_extensions)
            .with_exclude_patterns(&self.filters.exclude_patterns)?
            .with_min_size(self.filters.min_size)
            .with_max_size(self.filters.max_size.unwrap_or(u64::MAX))
            .with_rules(rules))
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_millis(self.watch.poll_interval_ms),
            error_backoff: Duration::from_millis(self.watch.error_backoff_ms),
            join_timeout: Duration::from_millis(self.watch.join_timeout_ms),
        }
    }
}
