//! Inclusion filter deciding which executables count as CLI tools.
//!
//! Every list comes from [`FilterConfig`]; nothing platform-specific is
//! hard-coded here. Matching rules, applied to the base filename:
//!
//! | Rule                     | Match                                        |
//! |--------------------------|----------------------------------------------|
//! | reserved                 | `.`, `..` or empty                           |
//! | cache directory          | lowercased name ends with an entry           |
//! | trace script             | lowercased name ends with an extension       |
//! | non-production           | lowercased name contains a substring         |
//! | service                  | lowercased suffix, unless on the allow-list  |
//! | OS daemon                | lowercased exact match                       |
//! | internal prefix          | lowercased prefix                            |
//! | internal helper          | exact, case-sensitive match                  |

use std::collections::HashSet;

use strum::{Display, IntoStaticStr};

use crate::config::{FilterConfig, ToolshedConfig};

/// Why a name was rejected by [`ToolFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    Reserved,
    CacheDir,
    TraceScript,
    NonProduction,
    Service,
    OsDaemon,
    InternalPrefix,
    InternalHelper,
}

/// Name-based filter built from a [`FilterConfig`].
///
/// ## Examples
///
/// ```
/// use toolshed_lib::scanner::{Rejection, ToolFilter};
///
/// let filter = ToolFilter::builtin();
/// assert!(filter.includes("rg"));
/// assert_eq!(filter.rejection("launchd"), Some(Rejection::OsDaemon));
/// assert_eq!(filter.rejection("my_test_runner"), Some(Rejection::NonProduction));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    cache_dirs: Vec<String>,
    trace_extensions: Vec<String>,
    non_production_substrings: Vec<String>,
    service_suffixes: Vec<String>,
    service_allow_list: HashSet<String>,
    os_daemons: HashSet<String>,
    internal_prefixes: Vec<String>,
    internal_helpers: HashSet<String>,
}

impl ToolFilter {
    /// Builds a filter from configuration, lowercasing every list except the
    /// case-sensitive helper names.
    pub fn from_config(config: &FilterConfig) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase())
                .collect()
        };

        Self {
            cache_dirs: lower(&config.cache_dirs),
            trace_extensions: lower(&config.trace_extensions),
            non_production_substrings: lower(&config.non_production_substrings),
            service_suffixes: lower(&config.service_suffixes),
            service_allow_list: lower(&config.service_allow_list).into_iter().collect(),
            os_daemons: lower(&config.os_daemons).into_iter().collect(),
            internal_prefixes: lower(&config.internal_prefixes),
            internal_helpers: config.internal_helpers.iter().cloned().collect(),
        }
    }

    /// Filter from the built-in defaults.
    pub fn builtin() -> Self {
        Self::from_config(&ToolshedConfig::default().filter)
    }

    /// A filter that only rejects reserved names.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Returns true when `name` should be treated as a tool.
    #[must_use]
    pub fn includes(&self, name: &str) -> bool {
        self.rejection(name).is_none()
    }

    /// Returns the first rule that rejects `name`, if any.
    #[must_use]
    pub fn rejection(&self, name: &str) -> Option<Rejection> {
        if name.is_empty() || name == "." || name == ".." {
            return Some(Rejection::Reserved);
        }

        let lower = name.to_lowercase();

        if self.cache_dirs.iter().any(|c| lower.ends_with(c.as_str())) {
            return Some(Rejection::CacheDir);
        }
        if self.trace_extensions.iter().any(|e| lower.ends_with(e.as_str())) {
            return Some(Rejection::TraceScript);
        }
        if self
            .non_production_substrings
            .iter()
            .any(|s| lower.contains(s.as_str()))
        {
            return Some(Rejection::NonProduction);
        }
        if self.service_suffixes.iter().any(|s| lower.ends_with(s.as_str()))
            && !self.service_allow_list.contains(&lower)
        {
            return Some(Rejection::Service);
        }
        if self.os_daemons.contains(&lower) {
            return Some(Rejection::OsDaemon);
        }
        if self
            .internal_prefixes
            .iter()
            .any(|p| lower.starts_with(p.as_str()))
        {
            return Some(Rejection::InternalPrefix);
        }
        if self.internal_helpers.contains(name) {
            return Some(Rejection::InternalHelper);
        }

        None
    }
}
