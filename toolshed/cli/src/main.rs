use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use toolshed_lib::audit::render_markdown;
use toolshed_lib::linker::packages_with_binaries;
use toolshed_lib::{
    AuditEngine, Inventory, MetadataCollector, PackageDetector, PackageManager, PathScanner, Tool,
    ToolFilter, ToolshedConfig, ToolshedError,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod output;

/// Discover the command-line tools installed on this system
#[derive(Parser)]
#[command(name = "toolshed", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file (default: <config dir>/toolshed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print a static completion script for SHELL and exit
    #[arg(long, value_name = "SHELL", ignore_case = true)]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List package-managed CLI tools
    ///
    /// By default only tools linked to a package are shown, minus library
    /// packages and packages that install dozens of binaries. Use --all to
    /// show every executable on PATH.
    List {
        /// Show every executable on PATH, not just package-managed tools
        #[arg(short, long)]
        all: bool,

        /// Print full tool records as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List packages that provide CLI tools
    Packages {
        /// Print package records as JSON
        #[arg(short, long)]
        json: bool,

        /// Only query one package manager (npm, pip, brew, cargo, go, gem)
        #[arg(short, long, value_name = "MANAGER")]
        manager: Option<PackageManager>,
    },

    /// Export a JSON catalog of every tool on PATH
    Export {
        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,

        /// Write the catalog to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Run each tool for version and help text (slow)
        #[arg(short = 'm', long)]
        with_meta: bool,

        /// Detect packages and link tools to them
        #[arg(short = 'P', long)]
        with_packages: bool,
    },

    /// Audit the environment for clashes and shadowed installations
    Audit {
        /// Write the report to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit the findings as JSON instead of markdown
        #[arg(short, long)]
        json: bool,
    },

    /// Show every installation of a tool
    Debug {
        /// Tool name to inspect
        #[arg(value_name = "TOOL", required_unless_present_any = ["clashes", "all"])]
        tool: Option<String>,

        /// Show tools provided by more than one package
        #[arg(short, long)]
        clashes: bool,

        /// Show every detected package with the tools it provides
        #[arg(short, long, conflicts_with = "clashes")]
        all: bool,
    },
}

const AFTER_HELP: &str = "\
EXAMPLES:
  toolshed list                          # package-managed tools
  toolshed list --all --json             # every executable on PATH, as JSON
  toolshed packages --manager brew       # Homebrew formulae that ship CLIs
  toolshed export --with-packages --pretty -o tools.json
  toolshed audit --output toolshed-audit.md
  toolshed debug git                     # every git on PATH and where it came from
  toolshed debug --all                   # each package and the tools it put on PATH

CONFIGURATION:
  Filter deny-lists, display exclusions and timeouts are read from
  <config dir>/toolshed/config.toml when it exists. Keys set there replace
  the built-in defaults; omitted keys keep them.

LOGGING:
  Logs go to stderr. -v shows scan and detection progress, -vv adds every
  external command toolshed runs, -vvv adds file and line locations.
  RUST_LOG overrides the verbosity flags.

COMPLETIONS:
  source <(COMPLETE=bash toolshed)       # bash, resolved on each <TAB>
  COMPLETE=fish toolshed | source        # fish
  toolshed --completions zsh > ~/.zfunc/_toolshed
";

fn main() -> ExitCode {
    // Dynamic completions (COMPLETE env var) must run before anything else
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "toolshed", &mut std::io::stdout());
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = ToolshedConfig::load(cli.config.as_deref())?;
    let scanner = PathScanner::from_env(ToolFilter::from_config(&config.filter));

    match command {
        Command::List { all, json } => run_list(&config, &scanner, all, json)?,
        Command::Packages { json, manager } => run_packages(&config, &scanner, json, manager)?,
        Command::Export {
            pretty,
            output,
            with_meta,
            with_packages,
        } => run_export(
            &config,
            &scanner,
            pretty,
            output.as_deref(),
            with_meta,
            with_packages,
        )?,
        Command::Audit { output, json } => run_audit(&config, &scanner, output.as_deref(), json)?,
        Command::Debug { tool, clashes, all } => {
            run_debug(&config, &scanner, tool.as_deref(), clashes, all);
        }
    }

    Ok(())
}

/// Log directives for a `-v` count. Crates other than toolshed stay at `warn`.
fn log_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,toolshed_lib={level},toolshed={level}")
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directives(verbose)));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_list(
    config: &ToolshedConfig,
    scanner: &PathScanner,
    all: bool,
    json: bool,
) -> serde_json::Result<()> {
    if all {
        let tools = Inventory::take(scanner, None).tools();
        if json {
            return output::print_json(&tools);
        }
        output::print_tool_names(tools.into_iter().map(|t| t.name).collect());
        return Ok(());
    }

    let detector = PackageDetector::from_config(&config.detection);
    let inventory = Inventory::take(scanner, Some(&detector));
    let names = inventory.user_facing_names(&config.display);

    if json {
        let keep: HashSet<&str> = names.iter().map(String::as_str).collect();
        let tools: Vec<Tool> = inventory
            .tools()
            .into_iter()
            .filter(|t| keep.contains(t.name.as_str()))
            .collect();
        return output::print_json(&tools);
    }

    output::print_tool_names(names);
    Ok(())
}

fn run_packages(
    config: &ToolshedConfig,
    scanner: &PathScanner,
    json: bool,
    manager: Option<PackageManager>,
) -> serde_json::Result<()> {
    let mut detector = PackageDetector::from_config(&config.detection);
    if let Some(manager) = manager {
        detector = detector.with_managers(&[manager]);
    }

    let inventory = Inventory::take(scanner, Some(&detector));
    let mut summaries = inventory.package_summaries();
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.manager.cmp(&b.manager)));

    if json {
        return output::print_json(&summaries);
    }
    output::print_packages(&summaries);
    Ok(())
}

fn run_export(
    config: &ToolshedConfig,
    scanner: &PathScanner,
    pretty: bool,
    output: Option<&Path>,
    with_meta: bool,
    with_packages: bool,
) -> toolshed_lib::Result<()> {
    let detector = with_packages.then(|| PackageDetector::from_config(&config.detection));
    let inventory = Inventory::take(scanner, detector.as_ref());

    let mut tools = inventory.tools();
    if with_meta {
        info!(tools = tools.len(), "collecting version and help metadata");
        MetadataCollector::from_config(&config.detection).enrich(&mut tools);
    }

    let catalog = inventory.catalog(tools, with_packages && !inventory.packages.is_empty());
    let json = if pretty {
        serde_json::to_string_pretty(&catalog)?
    } else {
        serde_json::to_string(&catalog)?
    };

    match output {
        Some(path) => {
            write_output(path, &json)?;
            info!(path = %path.display(), tools = catalog.total_tools, "catalog exported");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_audit(
    config: &ToolshedConfig,
    scanner: &PathScanner,
    output: Option<&Path>,
    json: bool,
) -> toolshed_lib::Result<()> {
    let detector = PackageDetector::from_config(&config.detection);
    let inventory = Inventory::take(scanner, Some(&detector));
    let result = inventory.audit(&AuditEngine::new());

    let report = if json {
        serde_json::to_string_pretty(&result)?
    } else {
        render_markdown(&result, Local::now())
    };

    match output {
        Some(path) => {
            write_output(path, &report)?;
            println!("✓ Audit report saved to: {}", path.display());
        }
        None => {
            print!("{report}");
            if json {
                println!();
            }
        }
    }
    Ok(())
}

fn run_debug(
    config: &ToolshedConfig,
    scanner: &PathScanner,
    tool: Option<&str>,
    clashes: bool,
    all: bool,
) {
    let detector = PackageDetector::from_config(&config.detection);
    let inventory = Inventory::take(scanner, Some(&detector));

    if clashes {
        output::print_clashes(&inventory.audit(&AuditEngine::new()).clashes);
    } else if all {
        // Shadowed occurrences count too: a package is listed even when
        // another install of its tool wins on PATH.
        let mut summaries = packages_with_binaries(&inventory.packages, inventory.occurrences.all());
        summaries.sort_by_key(|p| (p.manager.to_string(), p.name.clone()));
        output::print_package_debug(&summaries);
    } else if let Some(name) = tool {
        output::print_tool_debug(name, &inventory.occurrences.occurrences(name));
    }
}

// ============================================================================
// Output files
// ============================================================================

fn write_output(path: &Path, contents: &str) -> toolshed_lib::Result<()> {
    let mut contents = contents.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents).map_err(|source| ToolshedError::Output {
        path: path.to_path_buf(),
        source,
    })
}
