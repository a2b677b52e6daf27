//! Inventory of the command-line tools reachable on `PATH`.
//!
//! The pipeline, leaves first:
//!
//! - [`scanner`]: walk the search directories and keep likely CLI tools,
//!   recording every occurrence so shadowed copies stay visible
//! - [`packages`]: ask npm, pip, Homebrew, cargo and gem what they installed
//! - [`linker`]: guess which package each tool came from
//! - [`collector`]: optionally run tools for `--version` / `--help` output
//! - [`catalog`]: bundle everything into an exportable [`ToolCatalog`]
//! - [`audit`]: find clashes and shadowed installations and suggest fixes
//!
//! All discovery is best-effort. Missing package managers, unreadable
//! directories and tools that refuse to print a version produce smaller
//! results, not errors.
//!
//! ## Examples
//!
//! ```no_run
//! use toolshed_lib::{Inventory, PackageDetector, PathScanner, ToolFilter, ToolshedConfig};
//!
//! let config = ToolshedConfig::load(None)?;
//! let scanner = PathScanner::from_env(ToolFilter::from_config(&config.filter));
//! let detector = PackageDetector::from_config(&config.detection);
//!
//! let inventory = Inventory::take(&scanner, Some(&detector));
//! for tool in inventory.tools() {
//!     match &tool.package_name {
//!         Some(package) => println!("{} ({package})", tool.name),
//!         None => println!("{}", tool.name),
//!     }
//! }
//! # Ok::<(), toolshed_lib::ToolshedError>(())
//! ```

pub mod audit;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod error;
pub mod inventory;
pub mod linker;
pub mod model;
pub mod packages;
pub mod process;
pub mod scanner;

pub use audit::{AuditEngine, AuditResult, Severity};
pub use catalog::{CatalogBuilder, ToolCatalog};
pub use collector::MetadataCollector;
pub use config::ToolshedConfig;
pub use error::{Result, ToolshedError};
pub use inventory::Inventory;
pub use linker::{LinkStrategy, PackageLinker};
pub use model::{Package, PackageManager, PackageSummary, Tool};
pub use packages::PackageDetector;
pub use process::{CommandOutput, CommandRunner, SystemRunner};
pub use scanner::{PathScanner, ScanResult, ToolFilter};
