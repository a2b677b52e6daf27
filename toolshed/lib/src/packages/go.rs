//! Go binaries.
//!
//! `go install` keeps no inventory to query, so this backend never reports
//! packages. Binaries under `$GOPATH/bin` still link through the naming
//! strategies when another manager ships a package of the same name.

use super::PackageBackend;
use crate::error::Result;
use crate::model::{Package, PackageManager};
use crate::process::CommandRunner;

#[derive(Debug, Clone, Copy, Default)]
pub struct GoBackend;

impl PackageBackend for GoBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Go
    }

    fn detect(&self, _runner: &dyn CommandRunner) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }
}
