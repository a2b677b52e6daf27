//! Core records shared by every stage of the pipeline.
//!
//! - [`Tool`]: an executable found on the search path
//! - [`PackageManager`]: the fixed set of supported package managers
//! - [`Package`]: one unit from a package manager's inventory
//! - [`PackageSummary`]: a package together with the executables it provides
//!
//! All records serialize to JSON with the field names used by the catalog
//! export; optional fields are omitted when empty.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

// ============================================================================
// Tool
// ============================================================================

/// An executable discovered in one of the search directories.
///
/// Created by the scanner, then mutated in place by the linker (package
/// fields) and the metadata collector (version and help text).
///
/// ## Examples
///
/// ```
/// use toolshed_lib::Tool;
///
/// let tool = Tool::new("rg", "/usr/local/bin/rg");
/// assert!(!tool.is_linked());
/// assert!(!tool.is_symlink);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Base filename of the executable.
    pub name: String,
    /// Full path of this occurrence.
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub is_symlink: bool,
    /// Raw, unresolved symlink target text. Only set when `is_symlink` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_to: Option<String>,
    /// Size in bytes of the file the entry resolves to.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<PackageManager>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
}

impl Tool {
    /// Creates a bare tool record with only a name and path.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns true once the linker has attached a package to this tool.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.package_name.is_some()
    }

    /// Attaches the package fields from `package`.
    pub fn link_to(&mut self, package: &Package) {
        self.package_name = Some(package.name.clone());
        self.package_manager = Some(package.manager);
        self.package_version = Some(package.version.clone());
    }

    /// Clears any package association.
    pub fn unlink(&mut self) {
        self.package_name = None;
        self.package_manager = None;
        self.package_version = None;
    }
}

// ============================================================================
// PackageManager
// ============================================================================

/// Package managers the detector knows how to query.
///
/// The declaration order is the order in which backends are consulted and
/// in which their results are merged.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PackageManager {
    /// Node.js global packages.
    Npm,
    /// Python packages.
    Pip,
    /// Homebrew formulae.
    Brew,
    /// Rust binaries installed with `cargo install`.
    Cargo,
    /// Go binaries; there is no registry to query, so this backend is empty.
    Go,
    /// Ruby gems.
    Gem,
}

// ============================================================================
// Package
// ============================================================================

/// A unit reported by a package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub manager: PackageManager,
    /// Executable names provided by this package, attached after linking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Whether the package is installed globally rather than per project/user.
    pub global: bool,
}

impl Package {
    /// Creates a package record without binaries or location.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        manager: PackageManager,
        global: bool,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            manager,
            binaries: Vec::new(),
            location: None,
            global,
        }
    }
}

// ============================================================================
// PackageSummary
// ============================================================================

/// A package that ended up linked to at least one discovered tool.
///
/// Produced by [`crate::linker::packages_with_binaries`] for the catalog
/// export and the `packages` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: String,
    pub version: String,
    pub manager: PackageManager,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub global: bool,
}

impl PackageSummary {
    /// Builds a summary from a package and the tool names linked to it.
    pub fn from_package(package: &Package, binaries: Vec<String>) -> Self {
        Self {
            name: package.name.clone(),
            version: package.version.clone(),
            manager: package.manager,
            binaries,
            location: package.location.clone(),
            global: package.global,
        }
    }
}
