//! Ruby gems via `gem list --local`.

use super::{run_listing, PackageBackend};
use crate::error::Result;
use crate::model::{Package, PackageManager};
use crate::process::CommandRunner;

/// Backend for locally installed gems.
#[derive(Debug, Clone, Copy, Default)]
pub struct GemBackend;

impl PackageBackend for GemBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Gem
    }

    fn detect(&self, runner: &dyn CommandRunner) -> Result<Vec<Package>> {
        let output = run_listing(runner, PackageManager::Gem, "gem", &["list", "--local"])?;
        Ok(parse_gem_list(&output.stdout))
    }
}

/// Parses `name (v1, v2, ...)` lines, keeping the first version.
///
/// The `default:` marker on bundled gems is dropped. Platform suffixes are
/// kept as part of the version string. Header lines without parentheses are
/// ignored.
pub fn parse_gem_list(output: &str) -> Vec<Package> {
    output
        .lines()
        .filter_map(|line| {
            let open = line.find('(')?;
            let close = line.rfind(')')?;
            if close <= open {
                return None;
            }

            let name = line[..open].trim();
            if name.is_empty() {
                return None;
            }
            let first = line[open + 1..close]
                .split(',')
                .next()
                .unwrap_or_default()
                .trim();
            let version = first.strip_prefix("default:").map_or(first, str::trim);

            Some(Package::new(name, version, PackageManager::Gem, false))
        })
        .collect()
}
