//! Search-path scanning.
//!
//! [`PathScanner`] walks the directories of `PATH` in order, keeps entries
//! that are executable regular files (following symlinks) and pass the
//! [`ToolFilter`], and records every occurrence in a [`ScanResult`].
//!
//! A name found in several directories is *active* at its first position and
//! *shadowed* everywhere after it. One pass collects both views.
//!
//! ## Examples
//!
//! ```no_run
//! use toolshed_lib::scanner::{PathScanner, ToolFilter};
//!
//! let scanner = PathScanner::from_env(ToolFilter::builtin());
//! let result = scanner.scan();
//!
//! for tool in result.active() {
//!     println!("{} -> {}", tool.name, tool.path.display());
//! }
//! for (active, shadowed) in result.shadowed() {
//!     println!("{} shadows {}", active.path.display(), shadowed.path.display());
//! }
//! ```

mod filter;

pub use filter::{Rejection, ToolFilter};

use std::collections::{HashMap, HashSet};
use std::env;
use std::fs::{self, DirEntry, Metadata};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::model::Tool;

/// Directories listed in the `PATH` environment variable, in order.
///
/// Returns an empty list when `PATH` is unset.
#[must_use]
pub fn search_paths_from_env() -> Vec<PathBuf> {
    env::var_os("PATH")
        .map(|value| env::split_paths(&value).collect())
        .unwrap_or_default()
}

// ============================================================================
// ScanResult
// ============================================================================

/// Every tool occurrence from one scan, grouped by name in search-path order.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    tools: Vec<Tool>,
    index: HashMap<String, Vec<usize>>,
    order: Vec<String>,
}

impl ScanResult {
    fn push(&mut self, tool: Tool) {
        let position = self.tools.len();
        match self.index.get_mut(&tool.name) {
            Some(positions) => positions.push(position),
            None => {
                self.order.push(tool.name.clone());
                self.index.insert(tool.name.clone(), vec![position]);
            }
        }
        self.tools.push(tool);
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Distinct names in first-seen order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Every occurrence in search-path order.
    #[must_use]
    pub fn all(&self) -> &[Tool] {
        &self.tools
    }

    /// The first occurrence of each name, in first-seen order.
    #[must_use]
    pub fn active(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.index.get(name))
            .map(|positions| self.tools[positions[0]].clone())
            .collect()
    }

    /// Consumes the result, keeping only the first occurrence of each name.
    #[must_use]
    pub fn into_active(self) -> Vec<Tool> {
        let firsts: HashSet<usize> = self.index.values().map(|p| p[0]).collect();
        self.tools
            .into_iter()
            .enumerate()
            .filter(|(position, _)| firsts.contains(position))
            .map(|(_, tool)| tool)
            .collect()
    }

    /// All occurrences of `name`, active first.
    #[must_use]
    pub fn occurrences(&self, name: &str) -> Vec<&Tool> {
        self.index
            .get(name)
            .map(|positions| positions.iter().map(|&p| &self.tools[p]).collect())
            .unwrap_or_default()
    }

    /// `(active, shadowed)` pairs for every occurrence after the first.
    #[must_use]
    pub fn shadowed(&self) -> Vec<(&Tool, &Tool)> {
        self.order
            .iter()
            .filter_map(|name| self.index.get(name))
            .flat_map(|positions| {
                let active = &self.tools[positions[0]];
                positions[1..].iter().map(move |&p| (active, &self.tools[p]))
            })
            .collect()
    }
}

impl FromIterator<Tool> for ScanResult {
    /// Groups tools by name; iteration order is taken as search-path order.
    fn from_iter<I: IntoIterator<Item = Tool>>(iter: I) -> Self {
        let mut result = Self::default();
        for tool in iter {
            result.push(tool);
        }
        result
    }
}

// ============================================================================
// PathScanner
// ============================================================================

/// Enumerates tools in an ordered list of directories.
#[derive(Debug, Clone)]
pub struct PathScanner {
    paths: Vec<PathBuf>,
    filter: ToolFilter,
}

impl PathScanner {
    /// Scanner over the directories of the current `PATH`.
    pub fn from_env(filter: ToolFilter) -> Self {
        Self::new(search_paths_from_env(), filter)
    }

    /// Scanner over an explicit directory list.
    ///
    /// Empty entries are dropped and a directory listed more than once is
    /// kept at its first position only.
    pub fn new<I, P>(paths: I, filter: ToolFilter) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut seen = HashSet::new();
        let paths = paths
            .into_iter()
            .map(Into::into)
            .filter(|p: &PathBuf| !p.as_os_str().is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect();

        Self { paths, filter }
    }

    /// The directories this scanner walks, in order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Walks every directory once and records every occurrence.
    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult::default();

        for dir in &self.paths {
            for tool in scan_dir(dir, &self.filter) {
                result.push(tool);
            }
        }

        info!(
            dirs = self.paths.len(),
            tools = result.len(),
            occurrences = result.all().len(),
            "scanned search path"
        );
        result
    }

    /// De-duplicated tool records; the first occurrence of each name wins.
    pub fn scan_detailed(&self) -> Vec<Tool> {
        self.scan().into_active()
    }

    /// De-duplicated tool names in first-seen order.
    pub fn scan_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for dir in &self.paths {
            for tool in scan_dir(dir, &self.filter) {
                if seen.insert(tool.name.clone()) {
                    names.push(tool.name);
                }
            }
        }
        names
    }

    /// Resolves a single name against the search directories.
    ///
    /// The inclusion filter is not applied: asking for a name explicitly
    /// always finds it if it is executable.
    pub fn find_tool(&self, name: &str) -> Option<Tool> {
        let joined = env::join_paths(&self.paths).ok()?;
        let cwd = env::current_dir().ok()?;
        let path = which::which_in(name, Some(joined), cwd).ok()?;
        let dir = path.parent()?.to_path_buf();
        let file_name = path.file_name()?.to_str()?.to_string();

        let metadata = fs::symlink_metadata(&path).ok()?;
        inspect(&dir, file_name, metadata.file_type().is_symlink())
    }
}

/// Lists one directory, sorted by file name. Unreadable directories yield
/// nothing.
fn scan_dir(dir: &Path, filter: &ToolFilter) -> Vec<Tool> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut entries: Vec<DirEntry> = entries.filter_map(|entry| entry.ok()).collect();
    entries.sort_by_key(DirEntry::file_name);

    entries
        .into_iter()
        .filter_map(|entry| {
            let Ok(name) = entry.file_name().into_string() else {
                trace!(entry = ?entry.file_name(), "skipping non UTF-8 name");
                return None;
            };
            if let Some(reason) = filter.rejection(&name) {
                trace!(%name, %reason, "filtered");
                return None;
            }
            let file_type = entry.file_type().ok()?;
            if file_type.is_dir() {
                return None;
            }
            inspect(dir, name, file_type.is_symlink())
        })
        .collect()
}

/// Builds a [`Tool`] for `dir/name` if it resolves to an executable file.
fn inspect(dir: &Path, name: String, is_symlink: bool) -> Option<Tool> {
    let path = dir.join(&name);

    // Follows symlinks; dangling links fail here.
    let metadata = fs::metadata(&path).ok()?;
    if !metadata.is_file() || !is_executable(&path, &metadata) {
        return None;
    }

    let symlink_to = if is_symlink {
        fs::read_link(&path)
            .ok()
            .map(|target| target.to_string_lossy().into_owned())
    } else {
        None
    };

    Some(Tool {
        name,
        path,
        is_symlink,
        symlink_to,
        size: metadata.len(),
        ..Tool::default()
    })
}

#[cfg(unix)]
fn is_executable(_path: &Path, metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(path: &Path, _metadata: &Metadata) -> bool {
    const EXTENSIONS: [&str; 5] = ["exe", "cmd", "bat", "com", "ps1"];

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
