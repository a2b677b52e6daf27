#![cfg(unix)]

use std::collections::HashSet;
use std::path::PathBuf;

use toolshed_lib::{
    AuditEngine, CatalogBuilder, Package, PackageLinker, PackageManager, PathScanner, ToolFilter,
    ToolshedConfig,
};


use fixtures::PathFixture;

fn scanner(fixture: &PathFixture, dirs: &[&str]) -> PathScanner {
    PathScanner::new(
        dirs.iter().map(|d| fixture.dir(d)),
        ToolFilter::permissive(),
    )
}

// ============================================================================
// Scanning
// ============================================================================

#[test]
fn test_first_match_wins_and_shadow_is_reported() {
    let fx = PathFixture::new();
    fx.exec("a", "foo", 10);
    fx.exec("b", "foo", 20);
    fx.exec("b", "bar", 5);

    let scanner = scanner(&fx, &["a", "b"]);
    let primary: Vec<(String, PathBuf, u64)> = scanner
        .scan_detailed()
        .into_iter()
        .map(|t| (t.name, t.path, t.size))
        .collect();
    assert_eq!(
        primary,
        [
            ("foo".to_string(), fx.root().join("a/foo"), 10),
            ("bar".to_string(), fx.root().join("b/bar"), 5),
        ]
    );

    let result = scanner.scan();
    let shadowed = result.shadowed();
    assert_eq!(shadowed.len(), 1);
    assert_eq!(shadowed[0].0.path, fx.root().join("a/foo"));
    assert_eq!(shadowed[0].1.path, fx.root().join("b/foo"));

    let audit = AuditEngine::new().audit(result.all(), &[]);
    assert_eq!(audit.shadowed.len(), 1);
    assert_eq!(audit.shadowed[0].tool, "foo");
    assert_eq!(audit.shadowed[0].active_path, fx.root().join("a/foo"));
    assert_eq!(audit.shadowed[0].shadowed_path, fx.root().join("b/foo"));
}

#[test]
fn test_catalog_invariants() {
    let fx = PathFixture::new();
    fx.exec("bin", "alpha", 1);
    fx.exec("bin", "beta", 2);
    fx.exec("sbin", "alpha", 3);
    fx.plain("bin", "notes.txt");
    fx.exec("real", "gamma", 4);
    fx.symlink("bin", "gamma", "../real/gamma");

    let scanner = scanner(&fx, &["bin", "sbin"]);
    let tools = scanner.scan_detailed();
    let catalog = CatalogBuilder::new(scanner.search_paths()).build(tools);

    assert_eq!(catalog.total_tools, catalog.tools.len());
    assert_eq!(catalog.total_tools, 3);

    let names: HashSet<&str> = catalog.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), catalog.tools.len());

    for tool in &catalog.tools {
        if !tool.is_symlink {
            assert!(tool.symlink_to.is_none(), "{} has a stray target", tool.name);
        }
    }
    let gamma = catalog.tools.iter().find(|t| t.name == "gamma").unwrap();
    assert_eq!(gamma.symlink_to.as_deref(), Some("../real/gamma"));
    assert_eq!(gamma.size, 4);
}

#[test]
fn test_scan_and_link_are_idempotent() {
    let fx = PathFixture::new();
    fx.exec("x", "jq", 1);
    fx.exec("x", "mytool-cli", 1);
    fx.exec("y", "jq", 1);

    let packages = vec![
        Package::new("jq", "1.7.1", PackageManager::Brew, true),
        Package::new("mytool", "0.3.0", PackageManager::Npm, true),
    ];
    let scanner = scanner(&fx, &["x", "y"]);
    let linker = PackageLinker::new(&packages);

    let first = linker.link_tools(scanner.scan().all());
    let second = linker.link_tools(scanner.scan().all());
    assert_eq!(first, second);
    assert_eq!(scanner.scan_names(), scanner.scan_names());
}

#[test]
fn test_builtin_filter_drops_noise() {
    let fx = PathFixture::new();
    fx.exec("bin", "rg", 1);
    fx.exec("bin", "sshd", 1);
    fx.exec("bin", "iosnoop.d", 1);
    fx.exec("bin", "ssh-agent", 1);
    fx.exec("bin", "ReportCrash", 1);
    fx.exec("bin", "com.apple.helper", 1);

    let filter = ToolFilter::from_config(&ToolshedConfig::default().filter);
    let scanner = PathScanner::new([fx.dir("bin")], filter);
    assert_eq!(scanner.scan_names(), ["rg", "ssh-agent"]);
}

#[test]
fn test_user_config_relaxes_filter() {
    let fx = PathFixture::new();
    fx.exec("bin", "pytest", 1);

    let config = ToolshedConfig::from_toml_str("[filter]\nnon_production_substrings = []\n")
        .unwrap();
    let scanner = PathScanner::new([fx.dir("bin")], ToolFilter::from_config(&config.filter));
    assert_eq!(scanner.scan_names(), ["pytest"]);
}

// ============================================================================
// Linking
// ============================================================================

#[test]
fn test_widget_links_with_version() {
    let fx = PathFixture::new();
    fx.exec("usr/local/bin", "widget", 1);

    let packages = vec![Package::new("widget", "2.1", PackageManager::Brew, true)];
    let tools = PackageLinker::new(&packages)
        .link_tools(&scanner(&fx, &["usr/local/bin"]).scan_detailed());

    assert_eq!(tools[0].package_name.as_deref(), Some("widget"));
    assert_eq!(tools[0].package_manager, Some(PackageManager::Brew));
    assert_eq!(tools[0].package_version.as_deref(), Some("2.1"));
}

#[test]
fn test_npm_symlink_links_through_target() {
    let fx = PathFixture::new();
    fx.exec("lib/node_modules/typescript/bin", "tsc", 1);
    fx.symlink("bin", "tsc", "../lib/node_modules/typescript/bin/tsc");
    fx.exec("bin", "mytool-cli", 1);

    let packages = vec![
        Package::new("typescript", "5.3.3", PackageManager::Npm, true),
        Package::new("mytool", "1.0.0", PackageManager::Npm, true),
    ];
    let tools = PackageLinker::new(&packages).link_tools(&scanner(&fx, &["bin"]).scan_detailed());

    let tsc = tools.iter().find(|t| t.name == "tsc").unwrap();
    assert_eq!(tsc.package_name.as_deref(), Some("typescript"));
    let mytool = tools.iter().find(|t| t.name == "mytool-cli").unwrap();
    assert_eq!(mytool.package_name.as_deref(), Some("mytool"));
}

#[test]
fn test_git_clash_across_directories() {
    let fx = PathFixture::new();
    fx.exec("homebrew/bin", "git", 1);
    fx.exec("lib/node_modules/git/bin", "git", 1);
    fx.symlink("npm/bin", "git", "../../lib/node_modules/git/bin/git");

    let packages = vec![
        Package::new("git", "2.43.0", PackageManager::Brew, true),
        Package::new("git", "0.2.0", PackageManager::Npm, true),
    ];
    let scan = scanner(&fx, &["homebrew/bin", "npm/bin"]).scan();
    let linked = PackageLinker::new(&packages).link_tools(scan.all());

    assert_eq!(linked[0].package_manager, Some(PackageManager::Brew));
    assert_eq!(linked[1].package_manager, Some(PackageManager::Npm));

    let audit = AuditEngine::new().audit(&linked, &packages);
    assert_eq!(audit.clashes.len(), 1);
    let clash = &audit.clashes[0];
    assert_eq!(clash.tool, "git");
    assert!(clash.installations[0].active);
    assert_eq!(clash.installations[0].path, fx.root().join("homebrew/bin/git"));
    assert!(!clash.installations[1].active);
    assert_eq!(audit.shadowed.len(), 1);
}

#[test]
fn test_exact_name_beats_path_layout() {
    let fx = PathFixture::new();
    fx.exec("lib/node_modules/typescript/bin", "tsc", 1);
    fx.symlink("bin", "tsc", "../lib/node_modules/typescript/bin/tsc");

    let packages = vec![
        Package::new("typescript", "5.3.3", PackageManager::Npm, true),
        Package::new("tsc", "2.0.0", PackageManager::Npm, true),
    ];
    let tools = PackageLinker::new(&packages).link_tools(&scanner(&fx, &["bin"]).scan_detailed());
    assert_eq!(tools[0].package_name.as_deref(), Some("tsc"));
}
