//! Version and help-text probes.
//!
//! [`MetadataCollector`] runs an executable with a short list of
//! conventional flags and keeps what it prints. Probing means *executing*
//! the binary, so it only happens when a caller asks for it.
//!
//! The exit status of a probe is not inspected: a tool that answers
//! `--version` with a one-line usage error has that line recorded as its
//! version.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::model::Tool;
use crate::process::{CommandRunner, SystemRunner};

/// Flags tried, in order, when probing for a version string.
pub const VERSION_FLAGS: [&str; 4] = ["--version", "-version", "version", "-v"];

/// Flags tried, in order, when probing for help text.
pub const HELP_FLAGS: [&str; 4] = ["--help", "-help", "help", "-h"];

/// Version lines of this many characters or more are rejected.
pub const MAX_VERSION_LEN: usize = 200;

/// Help text is cut to this many bytes.
pub const MAX_HELP_LEN: usize = 5000;

/// Appended to help text that was cut.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Collects version and help metadata by running tools.
pub struct MetadataCollector {
    runner: Box<dyn CommandRunner>,
}

impl MetadataCollector {
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }

    /// Collector running real processes with the configured probe timeout.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(SystemRunner::new(config.probe_timeout()))
    }

    /// Builds a full record for the executable at `path`.
    ///
    /// Size and symlink details are read from the filesystem; if `path`
    /// cannot be stat'ed the record carries only `name` and `path`.
    pub fn collect(&self, name: &str, path: &Path) -> Tool {
        let mut tool = Tool::new(name, path);

        let Ok(link_meta) = fs::symlink_metadata(path) else {
            debug!(path = %path.display(), "cannot stat, returning basic record");
            return tool;
        };

        tool.is_symlink = link_meta.file_type().is_symlink();
        tool.size = fs::metadata(path)
            .map(|m| m.len())
            .unwrap_or_else(|_| link_meta.len());
        if tool.is_symlink {
            tool.symlink_to = fs::read_link(path)
                .ok()
                .map(|t| t.to_string_lossy().into_owned());
        }

        tool.version = self.version(path);
        tool.help_text = self.help_text(path);
        tool
    }

    /// Probes every tool in parallel, filling `version` and `help_text` in
    /// place.
    pub fn enrich(&self, tools: &mut [Tool]) {
        tools.par_iter_mut().for_each(|tool| {
            tool.version = self.version(&tool.path);
            tool.help_text = self.help_text(&tool.path);
        });
        debug!(
            tools = tools.len(),
            with_version = tools.iter().filter(|t| t.version.is_some()).count(),
            "collected metadata"
        );
    }

    /// First usable version line, trying each of [`VERSION_FLAGS`].
    pub fn version(&self, path: &Path) -> Option<String> {
        let program = path.to_string_lossy();

        VERSION_FLAGS.iter().find_map(|flag| {
            let output = self.runner.run(&program, &[*flag])?;
            if output.is_empty() {
                return None;
            }
            let combined = output.combined();
            let line = combined.lines().next()?.trim();
            (!line.is_empty() && line.chars().count() < MAX_VERSION_LEN).then(|| line.to_string())
        })
    }

    /// Output of the first of [`HELP_FLAGS`] that prints anything, cut to
    /// [`MAX_HELP_LEN`] bytes.
    pub fn help_text(&self, path: &Path) -> Option<String> {
        let program = path.to_string_lossy();

        HELP_FLAGS.iter().find_map(|flag| {
            let output = self.runner.run(&program, &[*flag])?;
            (!output.is_empty()).then(|| truncate_help(output.combined()))
        })
    }
}

impl std::fmt::Debug for MetadataCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCollector").finish_non_exhaustive()
    }
}

fn truncate_help(mut text: String) -> String {
    if text.len() <= MAX_HELP_LEN {
        return text;
    }

    let mut end = MAX_HELP_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text.push_str(TRUNCATION_MARKER);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use crate::process::CommandOutput;

    const TOOL: &str = "/usr/local/bin/widget";

    fn collector(runner: FakeRunner) -> MetadataCollector {
        MetadataCollector::new(runner)
    }

    #[test]
    fn test_version_takes_first_trimmed_line() {
        let runner = FakeRunner::new().respond(
            &format!("{TOOL} --version"),
            CommandOutput::ok("  widget 2.1.0  \nCopyright nobody\n"),
        );
        assert_eq!(
            collector(runner).version(Path::new(TOOL)).as_deref(),
            Some("widget 2.1.0")
        );
    }

    #[test]
    fn test_version_falls_through_flags() {
        let runner = FakeRunner::new()
            .respond(&format!("{TOOL} --version"), CommandOutput::default())
            .respond(&format!("{TOOL} -version"), CommandOutput::ok(&"x".repeat(250)))
            .respond(&format!("{TOOL} version"), CommandOutput::ok("\n"))
            .respond(&format!("{TOOL} -v"), CommandOutput::ok("v9"));
        assert_eq!(collector(runner).version(Path::new(TOOL)).as_deref(), Some("v9"));
    }

    #[test]
    fn test_version_ignores_exit_status() {
        let runner = FakeRunner::new().respond(
            &format!("{TOOL} --version"),
            CommandOutput::failed("unknown option: --version"),
        );
        assert_eq!(
            collector(runner).version(Path::new(TOOL)).as_deref(),
            Some("unknown option: --version")
        );
    }

    #[test]
    fn test_no_output_yields_none() {
        let c = collector(FakeRunner::new());
        assert!(c.version(Path::new(TOOL)).is_none());
        assert!(c.help_text(Path::new(TOOL)).is_none());
    }

    #[test]
    fn test_help_keeps_full_output() {
        let runner = FakeRunner::new()
            .respond(&format!("{TOOL} -help"), CommandOutput::ok("usage: widget\n  -x  do x\n"));
        assert_eq!(
            collector(runner).help_text(Path::new(TOOL)).as_deref(),
            Some("usage: widget\n  -x  do x\n")
        );
    }

    #[test]
    fn test_help_truncates_long_output() {
        let runner = FakeRunner::new()
            .respond(&format!("{TOOL} --help"), CommandOutput::ok("a".repeat(6000)));
        let help = collector(runner).help_text(Path::new(TOOL)).unwrap();

        assert!(help.ends_with(TRUNCATION_MARKER));
        assert_eq!(help.len(), MAX_HELP_LEN + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = format!("{}é{}", "a".repeat(MAX_HELP_LEN - 1), "b".repeat(10));
        let cut = truncate_help(text);
        assert!(cut.starts_with(&"a".repeat(MAX_HELP_LEN - 1)));
        assert!(!cut.contains('é'));
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_collect_missing_path_returns_basic_record() {
        let c = collector(FakeRunner::new());
        let tool = c.collect("ghost", Path::new("/definitely/not/here/ghost"));
        assert_eq!(tool, Tool::new("ghost", "/definitely/not/here/ghost"));
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_reads_filesystem_and_probes() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("widget-real");
        fs::write(&real, "0123456789").unwrap();
        let link = dir.path().join("widget");
        std::os::unix::fs::symlink("widget-real", &link).unwrap();

        let runner = FakeRunner::new().respond(
            &format!("{} --version", link.display()),
            CommandOutput::ok("widget 2.1"),
        );
        let tool = collector(runner).collect("widget", &link);

        assert!(tool.is_symlink);
        assert_eq!(tool.symlink_to.as_deref(), Some("widget-real"));
        assert_eq!(tool.size, 10);
        assert_eq!(tool.version.as_deref(), Some("widget 2.1"));
        assert!(tool.help_text.is_none());
    }

    #[test]
    fn test_enrich_preserves_order() {
        let runner = FakeRunner::new()
            .respond("/b/one --version", CommandOutput::ok("one 1"))
            .respond("/b/two --version", CommandOutput::ok("two 2"))
            .respond("/b/two --help", CommandOutput::ok("two help"));
        let mut tools = vec![
            Tool::new("one", "/b/one"),
            Tool::new("two", "/b/two"),
            Tool::new("three", "/b/three"),
        ];

        collector(runner).enrich(&mut tools);

        assert_eq!(tools[0].version.as_deref(), Some("one 1"));
        assert_eq!(tools[1].version.as_deref(), Some("two 2"));
        assert_eq!(tools[1].help_text.as_deref(), Some("two help"));
        assert!(tools[2].version.is_none());
        assert_eq!(tools[2].name, "three");
    }
}
