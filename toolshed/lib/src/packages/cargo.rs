//! Rust binaries via `cargo install --list`.

use super::{run_listing, PackageBackend};
use crate::error::Result;
use crate::model::{Package, PackageManager};
use crate::process::CommandRunner;

/// Backend for crates installed with `cargo install`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoBackend;

impl PackageBackend for CargoBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Cargo
    }

    fn detect(&self, runner: &dyn CommandRunner) -> Result<Vec<Package>> {
        let output = run_listing(runner, PackageManager::Cargo, "cargo", &["install", "--list"])?;
        Ok(parse_cargo_install_list(&output.stdout))
    }
}

/// Parses `cargo install --list` output.
///
/// Package lines look like `ripgrep v14.1.0:` or, for path and git installs,
/// `mytool v0.1.0 (/home/me/src/mytool):`. The indented lines under each
/// package name its binaries and are skipped. A parenthesized source becomes
/// the package location.
pub fn parse_cargo_install_list(output: &str) -> Vec<Package> {
    output
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let line = line.trim_end().trim_end_matches(':');
            let (name, rest) = line.split_once(' ')?;
            let (version, source) = match rest.split_once(' ') {
                Some((version, source)) => (version, Some(source)),
                None => (rest, None),
            };

            let mut package = Package::new(
                name,
                version.trim_start_matches('v'),
                PackageManager::Cargo,
                true,
            );
            package.location = source
                .map(|s| s.trim().trim_start_matches('(').trim_end_matches(')').to_string())
                .filter(|s| !s.is_empty());
            Some(package)
        })
        .collect()
}
