//! Package manager inventories.
//!
//! Each supported manager has a [`PackageBackend`] that runs the manager's
//! listing command through a [`CommandRunner`] and parses the output into
//! [`Package`] records. [`PackageDetector`] runs the backends in parallel and
//! merges their results in [`PackageManager`] declaration order.
//!
//! Detection is best-effort: a manager that is missing, times out or prints
//! something unparseable contributes no packages.
//!
//! ## Examples
//!
//! ```no_run
//! use toolshed_lib::packages::PackageDetector;
//! use toolshed_lib::config::DetectionConfig;
//!
//! let detector = PackageDetector::from_config(&DetectionConfig::default());
//! for package in detector.detect_all() {
//!     println!("{} {} ({})", package.name, package.version, package.manager);
//! }
//! ```

mod brew;
mod cargo;
mod gem;
mod go;
mod npm;
mod pip;

pub use brew::{parse_brew_list, BrewBackend};
pub use cargo::{parse_cargo_install_list, CargoBackend};
pub use gem::{parse_gem_list, GemBackend};
pub use go::GoBackend;
pub use npm::{parse_npm_list, NpmBackend};
pub use pip::{parse_pip_list, PipBackend};

use std::collections::BTreeMap;

use rayon::prelude::*;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::error::{Result, ToolshedError};
use crate::model::{Package, PackageManager};
use crate::process::{CommandOutput, CommandRunner, SystemRunner};

// ============================================================================
// PackageBackend
// ============================================================================

/// One package manager's inventory query.
pub trait PackageBackend: Send + Sync {
    /// The manager this backend reports for.
    fn manager(&self) -> PackageManager;

    /// Lists installed packages.
    ///
    /// ## Errors
    ///
    /// Returns an error when the manager is unavailable, fails, or prints
    /// output that cannot be parsed. Callers treat any error as "no packages".
    fn detect(&self, runner: &dyn CommandRunner) -> Result<Vec<Package>>;
}

/// The backend for `manager`.
pub fn backend_for(manager: PackageManager) -> &'static dyn PackageBackend {
    match manager {
        PackageManager::Npm => &NpmBackend,
        PackageManager::Pip => &PipBackend,
        PackageManager::Brew => &BrewBackend,
        PackageManager::Cargo => &CargoBackend,
        PackageManager::Go => &GoBackend,
        PackageManager::Gem => &GemBackend,
    }
}

/// Runs a listing command and returns its output, or a backend error when
/// the program is missing, timed out, or failed without printing anything.
pub(crate) fn run_listing(
    runner: &dyn CommandRunner,
    manager: PackageManager,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    let output = runner.run(program, args).ok_or_else(|| ToolshedError::Backend {
        manager: manager.into(),
        message: format!("`{program}` is not available or timed out"),
    })?;

    // Some managers exit non-zero on warnings yet still print a full listing.
    if !output.success && output.stdout.trim().is_empty() {
        return Err(ToolshedError::Backend {
            manager: manager.into(),
            message: format!("`{program}` failed: {}", output.stderr.trim()),
        });
    }

    Ok(output)
}

// ============================================================================
// PackageDetector
// ============================================================================

/// Queries a set of package managers.
pub struct PackageDetector {
    runner: Box<dyn CommandRunner>,
    managers: Vec<PackageManager>,
}

impl PackageDetector {
    /// Detector over every supported manager using the given runner.
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
            managers: PackageManager::iter().collect(),
        }
    }

    /// Detector running real processes with the configured timeout.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(SystemRunner::new(config.command_timeout()))
    }

    /// Restricts detection to `managers`, keeping declaration order.
    #[must_use]
    pub fn with_managers(mut self, managers: &[PackageManager]) -> Self {
        self.managers.retain(|m| managers.contains(m));
        self
    }

    /// The managers this detector will query, in merge order.
    #[must_use]
    pub fn managers(&self) -> &[PackageManager] {
        &self.managers
    }

    /// Queries every manager and concatenates their packages in manager
    /// order. Failing managers contribute nothing.
    pub fn detect_all(&self) -> Vec<Package> {
        let runner = self.runner.as_ref();

        let per_manager: Vec<Vec<Package>> = self
            .managers
            .par_iter()
            .map(|&manager| match backend_for(manager).detect(runner) {
                Ok(packages) => {
                    debug!(%manager, count = packages.len(), "detected packages");
                    packages
                }
                Err(e) => {
                    debug!(%manager, error = %e, "package manager skipped");
                    Vec::new()
                }
            })
            .collect();

        let packages: Vec<Package> = per_manager.into_iter().flatten().collect();
        info!(count = packages.len(), "package detection finished");
        packages
    }
}

impl std::fmt::Debug for PackageDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageDetector")
            .field("managers", &self.managers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// First package named exactly `name`.
pub fn find_package_by_name<'a>(packages: &'a [Package], name: &str) -> Option<&'a Package> {
    packages.iter().find(|p| p.name == name)
}

/// Packages grouped by manager, each group in detection order.
pub fn group_by_manager(packages: &[Package]) -> BTreeMap<PackageManager, Vec<&Package>> {
    let mut groups: BTreeMap<PackageManager, Vec<&Package>> = BTreeMap::new();
    for package in packages {
        groups.entry(package.manager).or_default().push(package);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;

    fn runner() -> FakeRunner {
        FakeRunner::new()
            .respond(
                "npm list -g --json --depth=0",
                CommandOutput::ok(r#"{"dependencies":{"vercel":{"version":"33.0.1"}}}"#),
            )
            .respond("brew list --versions", CommandOutput::ok("git 2.43.0\nwget 1.21.4\n"))
            .respond(
                "cargo install --list",
                CommandOutput::ok("ripgrep v14.1.0:\n    rg\n"),
            )
    }

    #[test]
    fn test_detect_all_merges_in_manager_order() {
        let detector = PackageDetector::new(runner());
        let packages = detector.detect_all();

        let names: Vec<(&str, PackageManager)> =
            packages.iter().map(|p| (p.name.as_str(), p.manager)).collect();
        assert_eq!(
            names,
            [
                ("vercel", PackageManager::Npm),
                ("git", PackageManager::Brew),
                ("wget", PackageManager::Brew),
                ("ripgrep", PackageManager::Cargo),
            ]
        );
    }

    #[test]
    fn test_backend_for_every_manager() {
        for manager in PackageManager::iter() {
            assert_eq!(backend_for(manager).manager(), manager);
        }
    }

    #[test]
    fn test_detect_all_with_no_managers_available() {
        let detector = PackageDetector::new(FakeRunner::new());
        assert!(detector.detect_all().is_empty());
    }

    #[test]
    fn test_with_managers_restricts_and_keeps_order() {
        let detector = PackageDetector::new(runner())
            .with_managers(&[PackageManager::Cargo, PackageManager::Npm]);
        assert_eq!(detector.managers(), [PackageManager::Npm, PackageManager::Cargo]);

        let packages = detector.detect_all();
        assert_eq!(packages.len(), 2);
        assert!(packages.iter().all(|p| p.manager != PackageManager::Brew));
    }

    #[test]
    fn test_run_listing_failure_without_output_is_error() {
        let runner = FakeRunner::new().respond("brew list --versions", CommandOutput::failed("boom"));
        let err = run_listing(&runner, PackageManager::Brew, "brew", &["list", "--versions"])
            .unwrap_err();
        assert!(matches!(err, ToolshedError::Backend { manager: "brew", .. }));
    }

    #[test]
    fn test_run_listing_accepts_failure_with_output() {
        let runner = FakeRunner::new().respond(
            "npm list -g --json --depth=0",
            CommandOutput {
                stdout: "{}".into(),
                stderr: "npm ERR! extraneous".into(),
                success: false,
            },
        );
        let output = run_listing(
            &runner,
            PackageManager::Npm,
            "npm",
            &["list", "-g", "--json", "--depth=0"],
        )
        .unwrap();
        assert_eq!(output.stdout, "{}");
    }

    #[test]
    fn test_find_and_group_helpers() {
        let packages = vec![
            Package::new("git", "2.43.0", PackageManager::Brew, true),
            Package::new("requests", "2.31.0", PackageManager::Pip, false),
            Package::new("git", "1.0.0", PackageManager::Npm, true),
        ];

        let git = find_package_by_name(&packages, "git").unwrap();
        assert_eq!(git.manager, PackageManager::Brew);
        assert!(find_package_by_name(&packages, "hg").is_none());

        let groups = group_by_manager(&packages);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            keys,
            [PackageManager::Npm, PackageManager::Pip, PackageManager::Brew]
        );
        assert_eq!(groups[&PackageManager::Brew].len(), 1);
    }
}
