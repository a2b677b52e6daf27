//! Python packages via `pip list --format=json`, falling back to `pip3`.

use serde::Deserialize;
use tracing::debug;

use super::{run_listing, PackageBackend};
use crate::error::Result;
use crate::model::{Package, PackageManager};
use crate::process::CommandRunner;

const ARGS: [&str; 2] = ["list", "--format=json"];

#[derive(Debug, Deserialize)]
struct PipEntry {
    name: String,
    #[serde(default)]
    version: String,
}

/// Backend for Python packages visible to the first `pip` on the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipBackend;

impl PackageBackend for PipBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Pip
    }

    fn detect(&self, runner: &dyn CommandRunner) -> Result<Vec<Package>> {
        let output = match run_listing(runner, PackageManager::Pip, "pip", &ARGS) {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "retrying with pip3");
                run_listing(runner, PackageManager::Pip, "pip3", &ARGS)?
            }
        };
        parse_pip_list(&output.stdout)
    }
}

/// Parses the `[{"name": .., "version": ..}]` array printed by
/// `pip list --format=json`.
///
/// ## Errors
///
/// Returns [`crate::ToolshedError::Json`] when the document is not a valid
/// package array.
pub fn parse_pip_list(json: &str) -> Result<Vec<Package>> {
    let entries: Vec<PipEntry> = serde_json::from_str(json)?;

    Ok(entries
        .into_iter()
        .map(|e| Package::new(e.name, e.version, PackageManager::Pip, false))
        .collect())
}
