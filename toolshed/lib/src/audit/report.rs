//! Markdown rendering of an [`AuditResult`].

use std::fmt::Write;

use chrono::{DateTime, Local};

use super::{AuditResult, Severity};

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "🔴",
        Severity::Medium => "🟡",
        Severity::Low => "🟢",
        Severity::Info => "ℹ️",
    }
}

/// Renders the audit as a markdown report stamped with `generated`.
pub fn render_markdown(result: &AuditResult, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, result, generated);
    out
}

fn write_report(
    out: &mut String,
    result: &AuditResult,
    generated: DateTime<Local>,
) -> std::fmt::Result {
    writeln!(out, "# CLI Environment Audit Report\n")?;
    writeln!(out, "**Generated:** {}\n", generated.format("%Y-%m-%d %H:%M:%S"))?;

    writeln!(out, "## Executive Summary\n")?;
    writeln!(out, "- **Total CLI Tools:** {}", result.total_tools)?;
    writeln!(
        out,
        "- **Package-Managed:** {} ({:.1}%)",
        result.managed_tools,
        result.managed_percent()
    )?;
    writeln!(
        out,
        "- **Unmanaged:** {} ({:.1}%)",
        result.unmanaged_tools,
        result.unmanaged_percent()
    )?;
    writeln!(out, "- **Installation Conflicts:** {}", result.clashes.len())?;
    writeln!(out, "- **Shadowed Installations:** {}\n", result.shadowed.len())?;

    writeln!(out, "## Package Managers\n")?;
    if result.managers.is_empty() {
        writeln!(out, "No package managers reported any packages.\n")?;
    } else {
        writeln!(out, "| Manager | Packages | Tools Provided |")?;
        writeln!(out, "|---------|----------|----------------|")?;
        for stats in &result.managers {
            writeln!(out, "| {} | {} | {} |", stats.manager, stats.packages, stats.tools)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Recommendations\n")?;
    for (i, rec) in result.recommendations.iter().enumerate() {
        writeln!(
            out,
            "### {}. {} {} - {}\n",
            i + 1,
            severity_icon(rec.severity),
            rec.severity.to_string().to_uppercase(),
            rec.category
        )?;
        writeln!(out, "**Issue:** {}\n", rec.issue)?;
        writeln!(out, "**Action:** {}\n", rec.action)?;
    }

    if !result.clashes.is_empty() {
        writeln!(out, "## Installation Conflicts (Detailed)\n")?;
        writeln!(
            out,
            "The following tools are provided by more than one package:\n"
        )?;
        for clash in &result.clashes {
            writeln!(out, "### `{}`\n", clash.tool)?;
            for inst in &clash.installations {
                let manager = inst
                    .package_manager
                    .map_or_else(|| "unknown".to_string(), |m| m.to_string());
                let version = match inst.version.as_deref() {
                    Some(v) if !v.is_empty() => format!(" (v{v})"),
                    _ => String::new(),
                };
                let status = if inst.active { " ✓ **ACTIVE**" } else { " (shadowed)" };
                writeln!(
                    out,
                    "- `{}` from `{}` via **{manager}**{version}{status}",
                    inst.path.display(),
                    inst.package_name
                )?;
            }
            writeln!(out)?;
        }
    }

    if !result.shadowed.is_empty() {
        writeln!(out, "## Shadowed Installations (Detailed)\n")?;
        writeln!(out, "These installations exist but are never run:\n")?;
        writeln!(out, "| Tool | Active | Shadowed |")?;
        writeln!(out, "|------|--------|----------|")?;
        for shadow in &result.shadowed {
            writeln!(
                out,
                "| `{}` | {} ({}) | {} ({}) |",
                shadow.tool,
                shadow.active_path.display(),
                shadow.active_package.as_deref().unwrap_or("unmanaged"),
                shadow.shadowed_path.display(),
                shadow.shadowed_package.as_deref().unwrap_or("unmanaged"),
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Notes for AI Agents\n")?;
    writeln!(out, "This report can be used to:")?;
    writeln!(out, "1. Spot package manager conflicts before installing new tools")?;
    writeln!(out, "2. Suggest cleanup actions to the user")?;
    writeln!(out, "3. See which package managers are available on the system")?;
    writeln!(out, "4. Detect search path problems or version conflicts")?;
    writeln!(out, "5. Give context when troubleshooting a tool\n")?;
    writeln!(out, "**Command to re-run the audit:**")?;
    writeln!(out, "```bash")?;
    writeln!(out, "toolshed audit --output toolshed-audit.md")?;
    writeln!(out, "```")?;

    Ok(())
}
