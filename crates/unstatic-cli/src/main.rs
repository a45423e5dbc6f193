//! unstatic CLI - make static classes non-static
//!
//! Available rules:
//! - unstatic_class: Remove `static` from classes and the methods they declare

mod config;
mod logging;
mod output;
mod process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

use config::Config;
use output::{DiagnosticInfo, OutputFormat, Reporter};
use process::{analyze, collect_files, load_project, unit_change, unit_id, write_file};
use unstatic_rules::RuleRegistry;

#[derive(Parser)]
#[command(name = "unstatic")]
#[command(version)]
#[command(about = "Find static classes and rewrite them as instance classes")]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<PathBuf>,

    /// Check for issues without applying fixes (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Apply fixes to files
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .unstatic.toml)
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Write a debug log to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write a debug log to a timestamped file in the temp directory
    #[arg(long, conflicts_with = "log_file")]
    log: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.log || cli.log_file.is_some() {
        let path = logging::init_logger(cli.log_file.as_deref())
            .context("Failed to open log file")?;
        if cli.verbose {
            eprintln!("{}: {}", "Logging to".bold(), path.display());
        }
    }

    // Load config file
    let (config, config_path) = if cli.no_config {
        (Config::default(), None)
    } else if let Some(config_path) = &cli.config {
        (Config::load_path(config_path)?, Some(config_path.clone()))
    } else {
        match Config::load()? {
            Some((cfg, path)) => (cfg, Some(path)),
            None => (Config::default(), None),
        }
    };
    if let Some(path) = &config_path {
        logging::log_config_load(path);
    }

    // Determine output format: CLI flags override the config file
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        let format = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        OutputFormat::from_str(format).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json, diff",
                format
            )
        })?
    };

    if cli.verbose && output_format == OutputFormat::Text {
        if let Some(path) = &config_path {
            println!("{}: {}", "Using config".bold(), path.display());
        }
    }

    let member_kinds = config.member_kinds()?;
    let registry = RuleRegistry::with_member_kinds(member_kinds);

    // Handle --list-rules
    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        for (name, description) in registry.list_rules() {
            println!("  {} - {}", name.green(), description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let all_rules = registry.all_names();
    let enabled_rules = config.effective_rules(&all_rules, &cli.rule);

    if let Err(e) = registry.validate(&enabled_rules) {
        eprintln!(
            "{}: {}. Use --list-rules to see available rules.",
            "Error".red(),
            e
        );
        return Ok(ExitCode::from(1));
    }

    if enabled_rules.is_empty() {
        eprintln!("{}: No rules enabled", "Error".red());
        return Ok(ExitCode::from(1));
    }

    // Determine mode: fix or check (check is default)
    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    let mut rule_names: Vec<String> = enabled_rules.iter().cloned().collect();
    rule_names.sort();
    let kind_names: Vec<&str> = member_kinds.iter().map(|k| k.as_str()).collect();
    logging::log_run_settings(
        if fix_mode { "fix" } else { "check" },
        &rule_names,
        &kind_names,
    );

    if cli.verbose && output_format == OutputFormat::Text {
        println!(
            "{}: {}",
            "Mode".bold(),
            if fix_mode { "fix" } else { "check" }
        );
        println!("{}: {}", "Rules".bold(), rule_names.join(", "));
        println!("{}: {}", "Member kinds".bold(), kind_names.join(", "));
        println!();
    }

    let collected = collect_files(&cli.paths, &config);
    let loaded = load_project(&collected.files);
    logging::log_units_loaded(loaded.project.len(), loaded.failures.len());

    let analysis = analyze(&loaded.project, &registry, &enabled_rules);
    if logging::is_enabled() {
        for diagnostic in &analysis.diagnostics {
            logging::log_diagnostic(&diagnostic.location(), &diagnostic.message);
        }
        logging::log_fixes_applied(&analysis.applied);
    }

    let mut reporter = Reporter::new(output_format, cli.verbose);

    for path in &collected.missing {
        if output_format == OutputFormat::Text {
            eprintln!(
                "{}: Path does not exist: {}",
                "Warning".yellow(),
                path.display()
            );
        }
    }

    for failure in &loaded.failures {
        reporter.report_error(&failure.path, &failure.message);
    }

    for path in &collected.files {
        let unit = unit_id(path);
        let Some(path) = loaded.path(&unit) else {
            continue; // reported as a load failure
        };
        let diagnostics: Vec<DiagnosticInfo> = analysis
            .diagnostics_for(&unit)
            .map(DiagnosticInfo::from)
            .collect();

        match unit_change(&loaded.project, &analysis.fixed, &unit) {
            Some(change) if fix_mode => {
                write_file(path, &change.new_source)?;
                logging::log_file_written(path);
                reporter.report_fix(path, diagnostics);
            }
            Some(change) => {
                reporter.report_check(path, diagnostics, &change.old_source, &change.new_source);
            }
            None => reporter.report_skipped(path, diagnostics),
        }
    }

    // Determine exit code
    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}
