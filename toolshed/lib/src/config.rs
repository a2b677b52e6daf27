//! Declarative configuration for the discovery pipeline.
//!
//! The inclusion filter's deny-lists, the display exclusion tables and the
//! process timeouts are data rather than code. The built-in values live in
//! `defaults.toml` (embedded at compile time); a user file is overlaid on
//! top of them key by key.
//!
//! ## Examples
//!
//! ```
//! use toolshed_lib::ToolshedConfig;
//!
//! let config = ToolshedConfig::from_toml_str(
//!     "[display]\nmax_binaries_per_package = 3\n",
//! ).unwrap();
//!
//! assert_eq!(config.display.max_binaries_per_package, 3);
//! // Keys the document does not mention keep their defaults
//! assert!(!config.filter.os_daemons.is_empty());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolshedError};

const DEFAULTS: &str = include_str!("../defaults.toml");

/// Complete configuration: filter deny-lists, display tables and detection
/// settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolshedConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
}

/// Name-based deny-lists applied to every directory entry during scanning.
///
/// See [`crate::scanner::ToolFilter`] for how each list is matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub cache_dirs: Vec<String>,
    pub trace_extensions: Vec<String>,
    pub non_production_substrings: Vec<String>,
    pub service_suffixes: Vec<String>,
    pub service_allow_list: Vec<String>,
    pub os_daemons: Vec<String>,
    pub internal_prefixes: Vec<String>,
    pub internal_helpers: Vec<String>,
}

/// Tables used when deciding which linked tools are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Packages providing more binaries than this are treated as libraries.
    pub max_binaries_per_package: usize,
    /// Packages whose binaries are never listed as user-facing tools.
    pub excluded_packages: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_binaries_per_package: 10,
            excluded_packages: Vec::new(),
        }
    }
}

/// Timeouts for external processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    pub command_timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 5,
            probe_timeout_secs: 3,
        }
    }
}

impl DetectionConfig {
    /// Upper bound for a single package manager listing.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Upper bound for a single version/help probe.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for ToolshedConfig {
    /// The built-in configuration from `defaults.toml`.
    fn default() -> Self {
        overlay("").unwrap_or_else(|_| Self {
            filter: FilterConfig::default(),
            display: DisplayConfig::default(),
            detection: DetectionConfig::default(),
        })
    }
}

impl ToolshedConfig {
    /// Overlays a TOML document on the built-in defaults.
    ///
    /// ## Errors
    ///
    /// Returns [`ToolshedError::ConfigParse`] if the document is not valid
    /// TOML or contains unknown keys or wrongly typed values.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        Ok(overlay(document)?)
    }

    /// Reads a TOML file and overlays it on the built-in defaults.
    ///
    /// ## Errors
    ///
    /// Returns [`ToolshedError::Io`] if the file cannot be read and
    /// [`ToolshedError::Config`] if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path)?;
        overlay(&document).map_err(|source| ToolshedError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the effective configuration.
    ///
    /// An explicit `path` must exist. Without one, the per-user file from
    /// [`default_config_path`] is used when present, otherwise the built-in
    /// defaults.
    ///
    /// ## Errors
    ///
    /// Same as [`ToolshedConfig::from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading user configuration");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Location of the per-user configuration file
/// (`<config_dir>/toolshed/config.toml`).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("toolshed").join("config.toml"))
}

fn overlay(document: &str) -> std::result::Result<ToolshedConfig, toml::de::Error> {
    let mut merged: toml::Table = toml::from_str(DEFAULTS)?;
    let user: toml::Table = toml::from_str(document)?;
    merge_tables(&mut merged, user);
    toml::Value::Table(merged).try_into()
}

/// Recursively merges `incoming` into `base`; tables merge, everything else
/// (including arrays) replaces.
fn merge_tables(base: &mut toml::Table, incoming: toml::Table) {
    for (key, value) in incoming {
        if let toml::Value::Table(incoming_table) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming_table);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming_table));
        } else {
            base.insert(key, value);
        }
    }
}
