//! Homebrew formulae via `brew list --versions`.

use super::{run_listing, PackageBackend};
use crate::error::Result;
use crate::model::{Package, PackageManager};
use crate::process::CommandRunner;

/// Backend for installed Homebrew formulae.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrewBackend;

impl PackageBackend for BrewBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Brew
    }

    fn detect(&self, runner: &dyn CommandRunner) -> Result<Vec<Package>> {
        let output = run_listing(runner, PackageManager::Brew, "brew", &["list", "--versions"])?;
        Ok(parse_brew_list(&output.stdout))
    }
}

/// Parses `name version [version...]` lines, keeping the first version.
/// Lines without a version are ignored.
pub fn parse_brew_list(output: &str) -> Vec<Package> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            Some(Package::new(name, version, PackageManager::Brew, true))
        })
        .collect()
}
