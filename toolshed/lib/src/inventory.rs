//! One pass of the discovery pipeline: scan, detect packages, link.

use std::path::PathBuf;

use crate::audit::{AuditEngine, AuditResult};
use crate::catalog::{CatalogBuilder, ToolCatalog};
use crate::config::DisplayConfig;
use crate::linker::{packages_with_binaries, user_facing_tool_names, PackageLinker};
use crate::model::{Package, PackageSummary, Tool};
use crate::packages::PackageDetector;
use crate::scanner::{PathScanner, ScanResult};

/// Linked tool occurrences and the packages they were linked against.
///
/// ## Examples
///
/// ```no_run
/// use toolshed_lib::{Inventory, PackageDetector, PathScanner, ToolFilter};
/// use toolshed_lib::config::DetectionConfig;
///
/// let scanner = PathScanner::from_env(ToolFilter::builtin());
/// let detector = PackageDetector::from_config(&DetectionConfig::default());
/// let inventory = Inventory::take(&scanner, Some(&detector));
///
/// println!("{} tools, {} packages", inventory.tools().len(), inventory.packages.len());
/// ```
#[derive(Debug, Clone)]
pub struct Inventory {
    pub search_paths: Vec<PathBuf>,
    /// Every occurrence, linked, in search-path order.
    pub occurrences: ScanResult,
    pub packages: Vec<Package>,
}

impl Inventory {
    /// Scans, optionally detects packages, and links every occurrence.
    ///
    /// Without a detector no package is known and every tool stays
    /// unlinked.
    pub fn take(scanner: &PathScanner, detector: Option<&PackageDetector>) -> Self {
        let scan = scanner.scan();
        let packages = detector.map(PackageDetector::detect_all).unwrap_or_default();

        let occurrences = if packages.is_empty() {
            scan
        } else {
            PackageLinker::new(&packages)
                .link_tools(scan.all())
                .into_iter()
                .collect()
        };

        Self {
            search_paths: scanner.search_paths().to_vec(),
            occurrences,
            packages,
        }
    }

    /// Active tools, one per name.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.occurrences.active()
    }

    /// Packages that provide at least one active tool.
    #[must_use]
    pub fn package_summaries(&self) -> Vec<PackageSummary> {
        packages_with_binaries(&self.packages, &self.tools())
    }

    /// Active tool names worth showing by default.
    #[must_use]
    pub fn user_facing_names(&self, display: &DisplayConfig) -> Vec<String> {
        user_facing_tool_names(&self.tools(), display)
    }

    pub fn audit(&self, engine: &AuditEngine) -> AuditResult {
        engine.audit(self.occurrences.all(), &self.packages)
    }

    /// Catalog of the given tools over this inventory's search paths.
    pub fn catalog(&self, tools: Vec<Tool>, with_packages: bool) -> ToolCatalog {
        let builder = CatalogBuilder::new(self.search_paths.iter());
        let builder = if with_packages {
            builder.with_packages(self.package_summaries())
        } else {
            builder
        };
        builder.build(tools)
    }
}
