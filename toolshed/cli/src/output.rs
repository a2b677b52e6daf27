use owo_colors::{OwoColorize, Stream::Stdout};
use serde::Serialize;
use toolshed_lib::audit::Clash;
use toolshed_lib::{PackageSummary, Tool};

/// Packages with at most this many binaries list them inline.
const INLINE_BINARIES: usize = 3;

/// Format bytes into human-readable units (KB, MB, GB)
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn binaries_cell(binaries: &[String]) -> String {
    match binaries {
        [] => "none".to_string(),
        [only] => only.clone(),
        list if list.len() <= INLINE_BINARIES => list.join(", "),
        list => format!("{} binaries", list.len()),
    }
}

fn manager_label(tool: &Tool) -> String {
    tool.package_manager
        .map_or_else(|| "unknown".to_string(), |m| m.to_string())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints tool names sorted alphabetically.
pub fn print_tool_names(mut names: Vec<String>) {
    if names.is_empty() {
        println!("No CLI tools found.");
        return;
    }

    names.sort();
    println!(
        "{}\n",
        format!("Found {} CLI tools:", names.len()).if_supports_color(Stdout, |t| t.bold())
    );
    for name in &names {
        println!("  {name}");
    }
}

/// Prints a fixed-width table of packages and the binaries they provide.
pub fn print_packages(packages: &[PackageSummary]) {
    if packages.is_empty() {
        println!("No packages with CLI tools found.");
        return;
    }

    println!(
        "{}\n",
        format!("Found {} packages with CLI tools:", packages.len())
            .if_supports_color(Stdout, |t| t.bold())
    );
    println!("{:<30} {:<10} {:<15} CLIs", "PACKAGE", "MANAGER", "VERSION");
    println!("{:<30} {:<10} {:<15} ----", "-------", "-------", "-------");
    for package in packages {
        println!(
            "{:<30} {:<10} {:<15} {}",
            package.name,
            package.manager.to_string(),
            package.version,
            binaries_cell(&package.binaries)
        );
    }
}

/// Prints tools that more than one package provides.
pub fn print_clashes(clashes: &[Clash]) {
    if clashes.is_empty() {
        println!("No installation clashes found!");
        return;
    }

    println!("Found {} tools with multiple installations:\n", clashes.len());
    for clash in clashes {
        println!(
            "🔴 {} ({} installations)",
            clash.tool.if_supports_color(Stdout, |t| t.bold()),
            clash.installations.len()
        );
        for inst in &clash.installations {
            let manager = inst
                .package_manager
                .map_or_else(|| "unknown".to_string(), |m| m.to_string());
            let active = if inst.active { " ✓ ACTIVE" } else { "" };
            println!("   {} via {manager}{active}", inst.path.display());
            if let Some(version) = inst.version.as_deref().filter(|v| !v.is_empty()) {
                println!("      Version: {version}");
            }
        }
        println!();
    }
}

/// Prints every installation of `name`, first in search-path order first.
pub fn print_tool_debug(name: &str, installations: &[&Tool]) {
    let Some(active) = installations.first() else {
        println!("Tool '{name}' not found in PATH");
        return;
    };

    println!(
        "Debug information for: {}",
        name.if_supports_color(Stdout, |t| t.bold())
    );
    println!("Total installations: {}\n", installations.len());

    for (i, tool) in installations.iter().enumerate() {
        println!("Installation #{}:", i + 1);
        if i == 0 {
            println!(
                "  Status: {}",
                "✓ ACTIVE (first in PATH)".if_supports_color(Stdout, |t| t.green())
            );
        } else {
            println!(
                "  Status: {}",
                "⚠ SHADOWED (not used)".if_supports_color(Stdout, |t| t.yellow())
            );
        }
        println!("  Path: {}", tool.path.display());

        if let Some(target) = tool.symlink_to.as_deref() {
            println!("  Symlink to: {target}");
        }

        match tool.package_name.as_deref() {
            Some(package) => {
                println!("  Package: {package}");
                println!("  Manager: {}", manager_label(tool));
                if let Some(version) = tool.package_version.as_deref().filter(|v| !v.is_empty()) {
                    println!("  Version: {version}");
                }
            }
            None => println!("  Package: (not detected)"),
        }

        if tool.size > 0 {
            println!("  Size: {}", format_bytes(tool.size));
        }
        println!();
    }

    if installations.len() > 1 {
        println!("⚠️  RECOMMENDATION:");
        println!("Multiple installations detected. Consider:");
        println!("  - Using the active installation via {}", manager_label(active));
        println!("  - Uninstalling unused versions to avoid conflicts");
    }
}

/// Prints the installations of every tool found more than once on PATH.
/// One `debug --all` entry: the package, its tools and version.
fn package_debug_block(summary: &PackageSummary) -> String {
    let mut block = format!(
        "📦 {} (via {})\n   Provides {} tool(s): {}\n",
        summary.name,
        summary.manager,
        summary.binaries.len(),
        summary.binaries.join(", ")
    );
    if !summary.version.is_empty() {
        block.push_str(&format!("   Version: {}\n", summary.version));
    }
    block
}

pub fn print_package_debug(summaries: &[PackageSummary]) {
    println!("Showing debug info for {} packages:\n", summaries.len());
    for summary in summaries {
        println!("{}", package_debug_block(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_binaries_cell() {
        let names = |n: usize| (0..n).map(|i| format!("b{i}")).collect::<Vec<_>>();

        assert_eq!(binaries_cell(&[]), "none");
        assert_eq!(binaries_cell(&names(1)), "b0");
        assert_eq!(binaries_cell(&names(3)), "b0, b1, b2");
        assert_eq!(binaries_cell(&names(4)), "4 binaries");
    }

    // ========================================================================
    // debug --all
    // ========================================================================

    fn summary(version: &str, binaries: &[&str]) -> PackageSummary {
        PackageSummary {
            name: "node".into(),
            version: version.into(),
            manager: toolshed_lib::PackageManager::Brew,
            binaries: binaries.iter().map(|b| b.to_string()).collect(),
            location: None,
            global: true,
        }
    }

    #[test]
    fn test_package_debug_block() {
        assert_eq!(
            package_debug_block(&summary("22.1.0", &["node", "npm", "npx"])),
            "📦 node (via brew)\n   Provides 3 tool(s): node, npm, npx\n   Version: 22.1.0\n"
        );
    }

    #[test]
    fn test_package_debug_block_without_version() {
        assert_eq!(
            package_debug_block(&summary("", &["node"])),
            "📦 node (via brew)\n   Provides 1 tool(s): node\n"
        );
    }
}
