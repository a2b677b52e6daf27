//! Exportable catalog envelope.

use std::path::PathBuf;

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::model::{PackageSummary, Tool};

/// Everything one run discovered, ready for JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCatalog {
    pub total_tools: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_packages: Option<usize>,
    /// Directories scanned, in search order.
    pub search_paths: Vec<String>,
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<PackageSummary>>,
    /// RFC 3339 generation time.
    pub generated_at: String,
}

/// Assembles a [`ToolCatalog`].
///
/// ## Examples
///
/// ```
/// use toolshed_lib::{CatalogBuilder, Tool};
///
/// let catalog = CatalogBuilder::new(["/usr/local/bin", "/usr/bin"])
///     .build(vec![Tool::new("rg", "/usr/local/bin/rg")]);
///
/// assert_eq!(catalog.total_tools, 1);
/// assert!(catalog.total_packages.is_none());
/// assert_eq!(catalog.search_paths, ["/usr/local/bin", "/usr/bin"]);
/// ```
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    search_paths: Vec<String>,
    packages: Option<Vec<PackageSummary>>,
    generated_at: Option<DateTime<Local>>,
}

impl CatalogBuilder {
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths
                .into_iter()
                .map(|p| p.into().to_string_lossy().into_owned())
                .collect(),
            packages: None,
            generated_at: None,
        }
    }

    /// Attaches package summaries and their count.
    #[must_use]
    pub fn with_packages(mut self, packages: Vec<PackageSummary>) -> Self {
        self.packages = Some(packages);
        self
    }

    /// Fixes the generation time instead of using the current time.
    #[must_use]
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn build(self, tools: Vec<Tool>) -> ToolCatalog {
        let generated_at = self.generated_at.unwrap_or_else(Local::now);

        ToolCatalog {
            total_tools: tools.len(),
            total_packages: self.packages.as_ref().map(Vec::len),
            search_paths: self.search_paths,
            tools,
            packages: self.packages,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
