//! Command line interface and the runnable entry point.
//!
//! `run_with_args_to` is the testable core: it takes raw arguments and a
//! writer, so integration tests can capture output and exit codes without
//! spawning the binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::output;
use crate::rules::registry;

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "chainlint",
    version,
    about = "Static analysis for chained-call middleware code (JS/TS)",
    long_about = None
)]
pub struct Cli {
    /// Paths to analyze (files or directories).
    /// When no paths are provided, defaults to the current directory.
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Rule ids or names to disable.
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Folders to exclude from analysis.
    #[arg(long, alias = "exclude-folder")]
    pub exclude_folders: Vec<String>,

    /// Folders to force-include in analysis (overrides default exclusions).
    #[arg(long, alias = "include-folder")]
    pub include_folders: Vec<String>,

    /// Exit with code 1 if any issues are found.
    #[arg(long)]
    pub fail_on_issues: bool,

    /// List the rule catalog and exit.
    #[arg(long)]
    pub list_rules: bool,

    /// Enable verbose output for debugging (shows scan configuration).
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode: show only the summary, no detail tables.
    #[arg(long)]
    pub quiet: bool,
}

/// Runs the analyzer with the given arguments using stdout as the writer.
///
/// # Errors
///
/// Returns an error if writing the report fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run chainlint with the given arguments, writing output to `writer`.
///
/// This is the testable version of [`run_with_args`] that allows output
/// capture.
///
/// # Errors
///
/// Returns an error if writing the report fails.
pub fn run_with_args_to<W: Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["chainlint".to_owned()];
    program_args.extend(args);
    let cli = match Cli::try_parse_from(program_args) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(2);
            }
        },
    };

    if cli.list_rules {
        print_rule_catalog(writer)?;
        return Ok(0);
    }

    let config_root = cli
        .paths
        .first()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = Config::load_from_path(&config_root);
    merge_cli_overrides(&cli, &mut config);

    if cli.verbose && !cli.json {
        eprintln!("[VERBOSE] chainlint v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Using {} threads", rayon::current_num_threads());
        if let Some(path) = &config.config_file_path {
            eprintln!("[VERBOSE] Config file: {}", path.display());
        }
        eprintln!("[VERBOSE] Paths: {:?}", cli.paths);
    }

    let fail_on_issues = config.chainlint.fail_on_issues.unwrap_or(false);
    let analyzer = Analyzer::new(config);

    let spinner = (!cli.json && !cli.quiet).then(output::progress::create_spinner);
    let result = analyzer.analyze_paths(&cli.paths);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if cli.json {
        output::print_json(writer, &result)?;
    } else if cli.quiet {
        output::summary::print_summary_pills(writer, &result)?;
    } else {
        output::print_report(writer, &result)?;
    }

    if fail_on_issues && result.total_issues() > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn merge_cli_overrides(cli: &Cli, config: &mut Config) {
    if !cli.ignore.is_empty() {
        config
            .chainlint
            .ignore
            .get_or_insert_with(Vec::new)
            .extend(cli.ignore.iter().cloned());
    }
    if !cli.exclude_folders.is_empty() {
        config
            .chainlint
            .exclude_folders
            .get_or_insert_with(Vec::new)
            .extend(cli.exclude_folders.iter().cloned());
    }
    if !cli.include_folders.is_empty() {
        config
            .chainlint
            .include_folders
            .get_or_insert_with(Vec::new)
            .extend(cli.include_folders.iter().cloned());
    }
    if cli.fail_on_issues {
        config.chainlint.fail_on_issues = Some(true);
    }
}

fn print_rule_catalog(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer, "{}", "Available rules".bold().underline())?;
    for descriptor in registry::CATALOG {
        writeln!(
            writer,
            "  {}  {}  [{} / {}]  {}",
            descriptor.id.dimmed(),
            descriptor.name.bold(),
            descriptor.category.as_str(),
            descriptor.default_severity.as_str(),
            descriptor.docs_url.dimmed(),
        )?;
    }
    Ok(())
}
