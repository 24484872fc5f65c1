//! phplift CLI - batch modernizer for legacy PHP source trees
//!
//! Walks a directory, backs up every eligible file into a per-run backup
//! root, then rewrites it in place with the rule engine. Every step is
//! recorded in a plain-text log next to the tree.

mod audit;
mod backup;
mod config;
mod error;
mod output;
mod process;
mod run;
mod walker;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{BackupPolicy, Config, TIMESTAMP_FORMAT};
use output::{OutputFormat, Reporter};
use phplift_rules::RuleSet;
use run::{run, RunOptions};

#[derive(Parser)]
#[command(name = "phplift")]
#[command(version)]
#[command(about = "Batch modernizer for legacy PHP source trees")]
struct Cli {
    /// Directory to process
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Extension of files to rewrite
    #[arg(long, value_name = "EXT")]
    extension: Option<String>,

    /// Skip directories with this exact name (repeatable; replaces the default list)
    #[arg(long, value_name = "NAME")]
    exclude_dir: Vec<String>,

    /// Skip directories whose name contains this marker
    #[arg(long, value_name = "MARKER")]
    backup_marker: Option<String>,

    /// Never touch files with this name, in addition to the configured ones (repeatable)
    #[arg(long, value_name = "NAME")]
    skip_file: Vec<String>,

    /// Glob pattern to exclude; a trailing `/` matches a directory name (repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Parent directory for the per-run backup root
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Directory for the run log
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// What to do when a backup fails
    #[arg(long, value_enum)]
    policy: Option<BackupPolicy>,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Path to config file (default: auto-detect .phplift.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// Report what would change without backing up or writing anything
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Output format: text, json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: String,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "phplift=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = RuleSet::new();

    if cli.list_rules {
        println!("{}", "Available rules (in order):".bold());
        for info in registry.list() {
            let note = if info.can_disable { "" } else { " (always on)" };
            println!("  {} - {}{}", info.name.green(), info.description, note);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::from_str(&cli.format).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json",
                cli.format
            )
        })?
    };

    let mut config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        Config::load_path(config_path)?
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                debug!(path = %path.display(), "using config");
                cfg
            }
            None => Config::default(),
        }
    };

    let all_rules = registry.all_names();
    for rule in &cli.rule {
        if !all_rules.contains(&rule.as_str()) {
            bail!("Unknown rule '{}'. Use --list-rules to see available rules.", rule);
        }
    }
    for rule in config.unknown_rules(&all_rules) {
        eprintln!("{}: Unknown rule '{}' in config, ignored", "Warning".yellow(), rule);
    }

    // CLI flags override config file values
    if let Some(extension) = cli.extension {
        config.paths.extension = Some(extension);
    }
    if !cli.exclude_dir.is_empty() {
        config.paths.exclude_dirs = Some(cli.exclude_dir);
    }
    if let Some(marker) = cli.backup_marker {
        config.paths.backup_marker = Some(marker);
    }
    if !cli.skip_file.is_empty() {
        let mut skip_files = config.skip_files();
        skip_files.extend(cli.skip_file);
        config.paths.skip_files = Some(skip_files);
    }
    config.paths.exclude.extend(cli.exclude);
    if let Some(dir) = cli.backup_dir {
        config.backup.dir = Some(dir);
    }
    if let Some(policy) = cli.policy {
        config.backup.policy = policy;
    }
    if let Some(dir) = cli.log_dir {
        config.log.dir = Some(dir);
    }

    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", cli.path.display()))?;
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let enabled = config.effective_rules(&all_rules, &cli.rule);
    let rules = RuleSet::with_enabled(&enabled);
    debug!(rules = ?rules.all_names(), "enabled rules");

    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let options = RunOptions {
        extension: config.extension().to_string(),
        filter: config.exclusion_filter(),
        backup_root: config.backup_root(&root, &timestamp),
        log_path: config.log_path(&root, &timestamp),
        policy: config.backup.policy,
        dry_run: cli.dry_run,
        rules,
        root,
    };

    let reporter = Reporter::new(output_format, cli.verbose, cli.dry_run);
    let summary = run(&options, &reporter)?;

    Ok(if summary.errors > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
