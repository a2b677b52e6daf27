//! Global npm packages via `npm list -g --json --depth=0`.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{run_listing, PackageBackend};
use crate::error::Result;
use crate::model::{Package, PackageManager};
use crate::process::CommandRunner;

#[derive(Debug, Default, Deserialize)]
struct NpmList {
    #[serde(default)]
    dependencies: BTreeMap<String, NpmDependency>,
}

#[derive(Debug, Default, Deserialize)]
struct NpmDependency {
    #[serde(default)]
    version: String,
}

/// Backend for globally installed npm packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmBackend;

impl PackageBackend for NpmBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Npm
    }

    fn detect(&self, runner: &dyn CommandRunner) -> Result<Vec<Package>> {
        let output = run_listing(
            runner,
            PackageManager::Npm,
            "npm",
            &["list", "-g", "--json", "--depth=0"],
        )?;
        parse_npm_list(&output.stdout)
    }
}

/// Parses the JSON tree printed by `npm list --json`.
///
/// Only the top-level `dependencies` map is read; packages come back sorted
/// by name.
///
/// ## Errors
///
/// Returns [`crate::ToolshedError::Json`] when the document is not valid
/// JSON.
pub fn parse_npm_list(json: &str) -> Result<Vec<Package>> {
    let list: NpmList = serde_json::from_str(json)?;

    Ok(list
        .dependencies
        .into_iter()
        .map(|(name, dep)| Package::new(name, dep.version, PackageManager::Npm, true))
        .collect())
}
