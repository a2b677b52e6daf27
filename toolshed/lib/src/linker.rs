//! Heuristic association of tools with the packages that installed them.
//!
//! [`PackageLinker`] tries three strategies in a fixed order and stops at the
//! first hit:
//!
//! 1. [`LinkStrategy::ExactName`]: a package with the tool's exact name.
//! 2. [`LinkStrategy::PathDerived`]: a package name read out of the tool's
//!    path or raw symlink target (`node_modules/<pkg>`, `Cellar/<pkg>`,
//!    `opt/<pkg>`, `.cargo/bin/<file>`).
//! 3. [`LinkStrategy::NamingPattern`]: the name with a `cli` affix removed,
//!    or the literal scoped form `@scope/name`.
//!
//! Several managers may ship a package with the same name (a `git` formula
//! and a `git` npm module). The linker then prefers the manager whose
//! install layout the tool's path matches, and falls back to the package
//! detected first.
//!
//! ## Examples
//!
//! ```
//! use toolshed_lib::{Package, PackageLinker, PackageManager, Tool};
//!
//! let packages = vec![Package::new("widget", "2.1", PackageManager::Brew, true)];
//! let linker = PackageLinker::new(&packages);
//!
//! let linked = linker.link_tools(&[Tool::new("widget", "/usr/local/bin/widget")]);
//! assert_eq!(linked[0].package_name.as_deref(), Some("widget"));
//! assert_eq!(linked[0].package_version.as_deref(), Some("2.1"));
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};

use strum::{Display, IntoStaticStr};

use crate::config::DisplayConfig;
use crate::model::{Package, PackageManager, PackageSummary, Tool};

/// Which strategy produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum LinkStrategy {
    ExactName,
    PathDerived,
    NamingPattern,
}

/// Package index used to link tools.
#[derive(Debug, Clone, Default)]
pub struct PackageLinker {
    by_name: HashMap<String, Vec<Package>>,
}

impl PackageLinker {
    /// Indexes `packages` by name, keeping detection order within a name.
    pub fn new(packages: &[Package]) -> Self {
        let mut by_name: HashMap<String, Vec<Package>> = HashMap::new();
        for package in packages {
            by_name
                .entry(package.name.clone())
                .or_default()
                .push(package.clone());
        }
        Self { by_name }
    }

    /// Returns a copy of `tools` with package fields set where a strategy
    /// matched and cleared everywhere else.
    pub fn link_tools(&self, tools: &[Tool]) -> Vec<Tool> {
        let linked: Vec<Tool> = tools
            .iter()
            .map(|tool| {
                let mut tool = tool.clone();
                self.link(&mut tool);
                tool
            })
            .collect();

        tracing::info!(
            tools = linked.len(),
            linked = linked.iter().filter(|t| t.is_linked()).count(),
            "linked tools to packages"
        );
        linked
    }

    /// Links a single tool in place, returning the strategy that matched.
    pub fn link(&self, tool: &mut Tool) -> Option<LinkStrategy> {
        tool.unlink();
        let (package, strategy) = self.resolve(tool)?;
        tracing::trace!(tool = %tool.name, package = %package.name, %strategy, "linked");
        tool.link_to(package);
        Some(strategy)
    }

    /// Finds the package for `tool` without modifying it.
    pub fn resolve(&self, tool: &Tool) -> Option<(&Package, LinkStrategy)> {
        let hint = path_signature(tool);

        if let Some(package) = self.lookup(&tool.name, hint) {
            return Some((package, LinkStrategy::ExactName));
        }

        if let Some(package) = self.from_path(tool) {
            return Some((package, LinkStrategy::PathDerived));
        }

        self.from_naming_pattern(&tool.name, hint)
            .map(|package| (package, LinkStrategy::NamingPattern))
    }

    /// Package named `name`, preferring one from `preferred` when present.
    fn lookup(&self, name: &str, preferred: Option<PackageManager>) -> Option<&Package> {
        let candidates = self.by_name.get(name)?;
        preferred
            .and_then(|m| candidates.iter().find(|p| p.manager == m))
            .or_else(|| candidates.first())
    }

    fn from_path(&self, tool: &Tool) -> Option<&Package> {
        let own = tool.path.to_string_lossy();
        let mut locations = vec![own.as_ref()];
        if tool.is_symlink
            && let Some(target) = tool.symlink_to.as_deref()
            && !target.is_empty()
        {
            locations.push(target);
        }

        locations
            .into_iter()
            .find_map(|location| self.from_location(location))
    }

    /// Checks one path or symlink target for a package install layout.
    fn from_location(&self, location: &str) -> Option<&Package> {
        let segments = segments(location);
        let position = |name: &str| segments.iter().position(|s| *s == name);

        if let Some(i) = position("node_modules")
            && let Some(&first) = segments.get(i + 1)
        {
            let name = match segments.get(i + 2) {
                Some(second) if first.starts_with('@') => format!("{first}/{second}"),
                _ => first.to_string(),
            };
            if let Some(package) = self.lookup(&name, Some(PackageManager::Npm)) {
                return Some(package);
            }
        }

        if let Some(i) = position("Cellar")
            && let Some(name) = segments.get(i + 1)
            && let Some(package) = self.lookup(name, Some(PackageManager::Brew))
        {
            return Some(package);
        }

        if let Some(i) = segments.iter().rposition(|s| *s == "opt")
            && let Some(name) = segments.get(i + 1)
            && let Some(package) = self.lookup(name, Some(PackageManager::Brew))
        {
            return Some(package);
        }

        // Python installs carry no package name in their layout.
        if segments
            .iter()
            .any(|s| *s == "site-packages" || *s == ".pyenv")
        {
            return None;
        }

        if segments.windows(2).any(|w| w == [".cargo", "bin"])
            && let Some(file) = segments.last()
        {
            return self
                .by_name
                .get(*file)
                .and_then(|candidates| {
                    candidates.iter().find(|p| p.manager == PackageManager::Cargo)
                });
        }

        None
    }

    fn from_naming_pattern(&self, name: &str, hint: Option<PackageManager>) -> Option<&Package> {
        let stripped = [
            name.strip_suffix("-cli"),
            name.strip_prefix("cli-"),
            name.strip_suffix("cli"),
        ];

        let found = stripped
            .into_iter()
            .flatten()
            .filter(|candidate| !candidate.is_empty() && *candidate != name)
            .find_map(|candidate| self.lookup(candidate, hint));
        if found.is_some() {
            return found;
        }

        if name.starts_with('@') && name.matches('/').count() == 1 {
            return self.lookup(name, hint);
        }
        None
    }
}

/// Normal path segments of `location`, ignoring roots and `.`/`..`.
fn segments(location: &str) -> Vec<&str> {
    Path::new(location)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect()
}

/// The manager whose install layout the tool's path or symlink target
/// matches, if any.
fn path_signature(tool: &Tool) -> Option<PackageManager> {
    let own = tool.path.to_string_lossy();
    std::iter::once(own.as_ref())
        .chain(tool.symlink_to.as_deref())
        .find_map(|location| {
            let segments = segments(location);
            let has = |name: &str| segments.iter().any(|s| s.eq_ignore_ascii_case(name));

            if has("node_modules") || has(".nvm") || has(".npm-global") {
                Some(PackageManager::Npm)
            } else if has("Cellar") || has("homebrew") || has(".linuxbrew") || has("linuxbrew") {
                Some(PackageManager::Brew)
            } else if has(".cargo") {
                Some(PackageManager::Cargo)
            } else if has("site-packages") || has(".pyenv") || has("pipx") {
                Some(PackageManager::Pip)
            } else if has(".gem") || has(".rbenv") || has("gems") {
                Some(PackageManager::Gem)
            } else if has("go") && has("bin") {
                Some(PackageManager::Go)
            } else {
                None
            }
        })
}

// ============================================================================
// Derived views
// ============================================================================

/// Packages, in detection order, that at least one tool links to, each with
/// the names of its tools.
///
/// Tools are matched on package name and manager; repeated tool names (from
/// shadowed occurrences) are listed once.
pub fn packages_with_binaries(packages: &[Package], tools: &[Tool]) -> Vec<PackageSummary> {
    let mut binaries: HashMap<(&str, PackageManager), Vec<String>> = HashMap::new();
    for tool in tools {
        let (Some(name), Some(manager)) = (tool.package_name.as_deref(), tool.package_manager)
        else {
            continue;
        };
        let names = binaries.entry((name, manager)).or_default();
        if !names.contains(&tool.name) {
            names.push(tool.name.clone());
        }
    }

    let mut seen = HashSet::new();
    packages
        .iter()
        .filter(|p| seen.insert((p.name.as_str(), p.manager)))
        .filter_map(|p| {
            let names = binaries.remove(&(p.name.as_str(), p.manager))?;
            Some(PackageSummary::from_package(p, names))
        })
        .collect()
}

/// Names of linked tools that look like user-facing commands.
///
/// Tools from packages listed in `excluded_packages`, or from packages that
/// provide more than `max_binaries_per_package` of the given tools, are left
/// out. Names are de-duplicated in input order.
pub fn user_facing_tool_names(tools: &[Tool], display: &DisplayConfig) -> Vec<String> {
    let mut per_package: HashMap<&str, usize> = HashMap::new();
    for name in tools.iter().filter_map(|t| t.package_name.as_deref()) {
        *per_package.entry(name).or_default() += 1;
    }

    let excluded: HashSet<&str> = display.excluded_packages.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    tools
        .iter()
        .filter(|tool| {
            tool.package_name.as_deref().is_some_and(|package| {
                !excluded.contains(package)
                    && per_package.get(package).copied().unwrap_or_default()
                        <= display.max_binaries_per_package
            })
        })
        .filter(|tool| seen.insert(tool.name.as_str()))
        .map(|tool| tool.name.clone())
        .collect()
}
