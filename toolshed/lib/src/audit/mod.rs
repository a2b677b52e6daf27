//! Environment audit: clashes, shadowed installations, manager statistics
//! and recommendations.
//!
//! [`AuditEngine::audit`] takes *every* occurrence of every tool in
//! search-path order (see [`crate::scanner::ScanResult::all`]) after
//! linking, plus the detected packages. The first occurrence of a name is
//! the one a shell would run.
//!
//! ## Examples
//!
//! ```
//! use toolshed_lib::audit::{AuditEngine, Severity};
//! use toolshed_lib::{Package, PackageManager, Tool};
//!
//! let brew = Package::new("git", "2.43.0", PackageManager::Brew, true);
//! let npm = Package::new("git-cli", "0.1.0", PackageManager::Npm, true);
//!
//! let mut first = Tool::new("git", "/opt/homebrew/bin/git");
//! first.link_to(&brew);
//! let mut second = Tool::new("git", "/usr/local/bin/git");
//! second.link_to(&npm);
//!
//! let result = AuditEngine::new().audit(&[first, second], &[brew, npm]);
//! assert_eq!(result.clashes.len(), 1);
//! assert_eq!(result.shadowed.len(), 1);
//! assert_eq!(result.recommendations[0].severity, Severity::High);
//! ```

mod report;

pub use report::render_markdown;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::model::{Package, PackageManager, Tool};

/// Default share of unmanaged tools, in percent, above which a
/// recommendation is raised.
pub const UNMANAGED_THRESHOLD_PERCENT: f64 = 20.0;

// ============================================================================
// Result types
// ============================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

/// One linked installation of a clashing tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub path: PathBuf,
    pub package_name: String,
    pub package_manager: Option<PackageManager>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// True for the first linked installation in search-path order.
    pub active: bool,
}

/// A tool name provided by more than one distinct package (name and
/// manager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clash {
    pub tool: String,
    pub installations: Vec<Installation>,
}

/// An occurrence hidden behind an earlier one of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowedInstallation {
    pub tool: String,
    pub active_path: PathBuf,
    pub shadowed_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadowed_package: Option<String>,
}

/// Package and linked-tool counts for one manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStats {
    pub manager: PackageManager,
    pub packages: usize,
    /// Linked tool occurrences, shadowed ones included.
    pub tools: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub category: String,
    pub issue: String,
    pub action: String,
}

/// Findings of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Distinct tool names.
    pub total_tools: usize,
    pub managed_tools: usize,
    pub unmanaged_tools: usize,
    pub clashes: Vec<Clash>,
    pub shadowed: Vec<ShadowedInstallation>,
    pub managers: Vec<ManagerStats>,
    pub recommendations: Vec<Recommendation>,
}

impl AuditResult {
    #[must_use]
    pub fn managed_percent(&self) -> f64 {
        percent(self.managed_tools, self.total_tools)
    }

    #[must_use]
    pub fn unmanaged_percent(&self) -> f64 {
        percent(self.unmanaged_tools, self.total_tools)
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

// ============================================================================
// AuditEngine
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct AuditEngine {
    unmanaged_threshold: f64,
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self {
            unmanaged_threshold: UNMANAGED_THRESHOLD_PERCENT,
        }
    }
}

impl AuditEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the unmanaged-share threshold (percent).
    #[must_use]
    pub fn with_unmanaged_threshold(mut self, percent: f64) -> Self {
        self.unmanaged_threshold = percent;
        self
    }

    /// Audits linked tool occurrences (search-path order) against the
    /// detected packages.
    pub fn audit(&self, tools: &[Tool], packages: &[Package]) -> AuditResult {
        let groups = group_by_name(tools);

        let total_tools = groups.len();
        let managed_tools = groups
            .iter()
            .filter(|(_, occurrences)| occurrences[0].is_linked())
            .count();

        let mut result = AuditResult {
            total_tools,
            managed_tools,
            unmanaged_tools: total_tools - managed_tools,
            clashes: find_clashes(&groups),
            shadowed: find_shadowed(&groups),
            managers: manager_stats(packages, tools),
            recommendations: Vec::new(),
        };
        result.recommendations = self.recommendations(&result);

        tracing::info!(
            tools = result.total_tools,
            clashes = result.clashes.len(),
            shadowed = result.shadowed.len(),
            "audit finished"
        );
        result
    }

    fn recommendations(&self, result: &AuditResult) -> Vec<Recommendation> {
        let mut recs = Vec::new();

        if !result.clashes.is_empty() {
            recs.push(Recommendation {
                severity: Severity::High,
                category: "Installation Conflicts".into(),
                issue: format!(
                    "Found {} tools installed by more than one package",
                    result.clashes.len()
                ),
                action: "Review the conflicting installations and uninstall the duplicates to \
                         avoid version conflicts. Run `toolshed debug --clashes` for details."
                    .into(),
            });
        }

        if !result.shadowed.is_empty() {
            recs.push(Recommendation {
                severity: Severity::Medium,
                category: "Shadowed Installations".into(),
                issue: format!(
                    "Found {} installations hidden behind an earlier entry on the search path",
                    result.shadowed.len()
                ),
                action: "Remove the unused installations to free disk space and avoid confusion \
                         about which copy runs."
                    .into(),
            });
        }

        let unmanaged = result.unmanaged_percent();
        if unmanaged > self.unmanaged_threshold {
            recs.push(Recommendation {
                severity: Severity::Low,
                category: "Package Management".into(),
                issue: format!(
                    "{unmanaged:.1}% of tools ({}/{}) are not managed by a package manager",
                    result.unmanaged_tools, result.total_tools
                ),
                action: "Consider installing tools through a package manager (brew, npm, pip, \
                         cargo) for easier updates."
                    .into(),
            });
        }

        if let [only] = result.managers.as_slice() {
            recs.push(Recommendation {
                severity: Severity::Info,
                category: "Package Management".into(),
                issue: "Only one package manager is in use".into(),
                action: format!(
                    "Good for consistency. Keep managing tools through {}.",
                    only.manager
                ),
            });
        }

        if recs.is_empty() {
            recs.push(Recommendation {
                severity: Severity::Info,
                category: "System Health".into(),
                issue: "No issues detected".into(),
                action: "All tools are managed and no conflicts were found.".into(),
            });
        }

        recs
    }
}

/// Occurrences grouped by name, groups in first-seen order.
fn group_by_name(tools: &[Tool]) -> Vec<(&str, Vec<&Tool>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Tool>)> = Vec::new();

    for tool in tools {
        match positions.get(tool.name.as_str()) {
            Some(&i) => groups[i].1.push(tool),
            None => {
                positions.insert(tool.name.as_str(), groups.len());
                groups.push((tool.name.as_str(), vec![tool]));
            }
        }
    }
    groups
}

fn find_clashes(groups: &[(&str, Vec<&Tool>)]) -> Vec<Clash> {
    groups
        .iter()
        .filter_map(|(name, occurrences)| {
            let linked: Vec<&&Tool> = occurrences.iter().filter(|t| t.is_linked()).collect();

            // A package is identified by name and manager.
            let distinct: HashSet<(&str, Option<PackageManager>)> = linked
                .iter()
                .filter_map(|t| Some((t.package_name.as_deref()?, t.package_manager)))
                .collect();
            if distinct.len() < 2 {
                return None;
            }

            let installations = linked
                .into_iter()
                .enumerate()
                .map(|(i, t)| Installation {
                    path: t.path.clone(),
                    package_name: t.package_name.clone().unwrap_or_default(),
                    package_manager: t.package_manager,
                    version: t.package_version.clone(),
                    active: i == 0,
                })
                .collect();

            Some(Clash {
                tool: (*name).to_string(),
                installations,
            })
        })
        .collect()
}

fn find_shadowed(groups: &[(&str, Vec<&Tool>)]) -> Vec<ShadowedInstallation> {
    groups
        .iter()
        .flat_map(|(name, occurrences)| {
            let active = occurrences[0];
            occurrences[1..].iter().map(move |shadowed| ShadowedInstallation {
                tool: (*name).to_string(),
                active_path: active.path.clone(),
                shadowed_path: shadowed.path.clone(),
                active_package: active.package_name.clone(),
                shadowed_package: shadowed.package_name.clone(),
            })
        })
        .collect()
}

/// Stats for every manager that reported packages, by tool count
/// descending, then manager order.
fn manager_stats(packages: &[Package], tools: &[Tool]) -> Vec<ManagerStats> {
    let mut stats: BTreeMap<PackageManager, ManagerStats> = BTreeMap::new();
    for package in packages {
        stats
            .entry(package.manager)
            .or_insert(ManagerStats {
                manager: package.manager,
                packages: 0,
                tools: 0,
            })
            .packages += 1;
    }

    for manager in tools.iter().filter_map(|t| t.package_manager) {
        if let Some(entry) = stats.get_mut(&manager) {
            entry.tools += 1;
        }
    }

    let mut stats: Vec<ManagerStats> = stats.into_values().collect();
    stats.sort_by(|a, b| b.tools.cmp(&a.tools).then(a.manager.cmp(&b.manager)));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(name: &str, path: &str, package: &Package) -> Tool {
        let mut tool = Tool::new(name, path);
        tool.link_to(package);
        tool
    }

    fn pkg(name: &str, manager: PackageManager) -> Package {
        Package::new(name, "1.0", manager, true)
    }

    // ========================================================================
    // Clashes and shadows
    // ========================================================================

    #[test]
    fn test_git_clash_first_occurrence_active() {
        let brew = pkg("git", PackageManager::Brew);
        let npm = pkg("git-wrapper", PackageManager::Npm);
        let tools = vec![
            linked("git", "/opt/homebrew/bin/git", &brew),
            linked("git", "/usr/local/bin/git", &npm),
        ];

        let result = AuditEngine::new().audit(&tools, &[brew, npm]);

        assert_eq!(result.clashes.len(), 1);
        let clash = &result.clashes[0];
        assert_eq!(clash.tool, "git");
        assert_eq!(clash.installations.len(), 2);
        assert!(clash.installations[0].active);
        assert!(!clash.installations[1].active);
        assert_eq!(clash.installations[1].package_manager, Some(PackageManager::Npm));
    }

    #[test]
    fn test_same_name_from_two_managers_is_a_clash() {
        let brew = pkg("git", PackageManager::Brew);
        let npm = pkg("git", PackageManager::Npm);
        let tools = vec![
            linked("git", "/opt/homebrew/bin/git", &brew),
            linked("git", "/home/me/.nvm/bin/git", &npm),
        ];

        let result = AuditEngine::new().audit(&tools, &[brew, npm]);
        assert_eq!(result.clashes.len(), 1);
    }

    #[test]
    fn test_same_package_twice_is_not_a_clash() {
        let brew = pkg("node", PackageManager::Brew);
        let tools = vec![
            linked("node", "/opt/homebrew/bin/node", &brew),
            linked("node", "/usr/local/bin/node", &brew),
        ];

        let result = AuditEngine::new().audit(&tools, std::slice::from_ref(&brew));
        assert!(result.clashes.is_empty());
        assert_eq!(result.shadowed.len(), 1);
    }

    #[test]
    fn test_clash_marks_first_linked_installation_active() {
        let a = pkg("a", PackageManager::Brew);
        let b = pkg("b", PackageManager::Npm);
        let tools = vec![
            Tool::new("x", "/first/x"),
            linked("x", "/second/x", &a),
            linked("x", "/third/x", &b),
        ];

        let result = AuditEngine::new().audit(&tools, &[a, b]);
        let clash = &result.clashes[0];
        assert_eq!(clash.installations.len(), 2);
        assert_eq!(clash.installations[0].path, PathBuf::from("/second/x"));
        assert!(clash.installations[0].active);
        assert!(!clash.installations[1].active);
    }

    #[test]
    fn test_shadow_scenario() {
        let mut a_foo = Tool::new("foo", "/a/foo");
        a_foo.size = 10;
        let mut b_foo = Tool::new("foo", "/b/foo");
        b_foo.size = 20;
        let mut b_bar = Tool::new("bar", "/b/bar");
        b_bar.size = 5;

        let result = AuditEngine::new().audit(&[a_foo, b_foo, b_bar], &[]);

        assert_eq!(result.total_tools, 2);
        assert_eq!(
            result.shadowed,
            [ShadowedInstallation {
                tool: "foo".into(),
                active_path: "/a/foo".into(),
                shadowed_path: "/b/foo".into(),
                active_package: None,
                shadowed_package: None,
            }]
        );
    }

    // ========================================================================
    // Counts and stats
    // ========================================================================

    #[test]
    fn test_counts_use_active_occurrence() {
        let jq = pkg("jq", PackageManager::Brew);
        let tools = vec![
            linked("jq", "/a/jq", &jq),
            Tool::new("jq", "/b/jq"),
            Tool::new("ls", "/bin/ls"),
        ];

        let result = AuditEngine::new().audit(&tools, std::slice::from_ref(&jq));
        assert_eq!(result.total_tools, 2);
        assert_eq!(result.managed_tools, 1);
        assert_eq!(result.unmanaged_tools, 1);
        assert!((result.managed_percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_manager_stats_sorted_by_tool_count() {
        let packages = vec![
            pkg("a", PackageManager::Npm),
            pkg("b", PackageManager::Brew),
            pkg("c", PackageManager::Brew),
            pkg("d", PackageManager::Pip),
        ];
        let tools = vec![
            linked("b", "/x/b", &packages[1]),
            linked("c", "/x/c", &packages[2]),
            linked("a", "/x/a", &packages[0]),
        ];

        let stats = manager_stats(&packages, &tools);
        let order: Vec<(PackageManager, usize, usize)> =
            stats.iter().map(|s| (s.manager, s.packages, s.tools)).collect();
        assert_eq!(
            order,
            [
                (PackageManager::Brew, 2, 2),
                (PackageManager::Npm, 1, 1),
                (PackageManager::Pip, 1, 0),
            ]
        );
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    #[test]
    fn test_no_issues_recommendation() {
        let result = AuditEngine::new().audit(&[], &[]);
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].severity, Severity::Info);
        assert_eq!(result.recommendations[0].issue, "No issues detected");
    }

    #[test]
    fn test_recommendation_order() {
        let brew = pkg("git", PackageManager::Brew);
        let npm = pkg("git2", PackageManager::Npm);
        let tools = vec![
            linked("git", "/a/git", &brew),
            linked("git", "/b/git", &npm),
            Tool::new("ls", "/bin/ls"),
            Tool::new("cat", "/bin/cat"),
        ];

        let result = AuditEngine::new().audit(&tools, &[brew, npm]);
        let severities: Vec<Severity> = result.recommendations.iter().map(|r| r.severity).collect();
        assert_eq!(severities, [Severity::High, Severity::Medium, Severity::Low]);
        assert!(result.recommendations[2].issue.starts_with("66.7%"));
    }

    #[test]
    fn test_single_manager_is_informational() {
        let jq = pkg("jq", PackageManager::Brew);
        let tools = vec![linked("jq", "/a/jq", &jq)];

        let result = AuditEngine::new().audit(&tools, std::slice::from_ref(&jq));
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].severity, Severity::Info);
        assert!(result.recommendations[0].action.contains("brew"));
    }

    #[test]
    fn test_custom_threshold() {
        let tools = vec![Tool::new("ls", "/bin/ls")];
        let result = AuditEngine::new()
            .with_unmanaged_threshold(100.0)
            .audit(&tools, &[]);
        assert_eq!(result.recommendations[0].issue, "No issues detected");
    }

    #[test]
    fn test_result_serializes() {
        let result = AuditEngine::new().audit(&[Tool::new("ls", "/bin/ls")], &[]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_tools"], 1);
        assert_eq!(json["recommendations"][0]["severity"], "low");
    }
}
