//! Console output for phplift
//!
//! Supports text (colored terminal) and JSON output formats. The text
//! format mirrors the key audit log events as they happen; JSON prints a
//! single document at the end of the run.

use std::path::Path;

use colored::*;
use phplift_rules::{ChangeRecord, DeprecatedUsage};
use serde::Serialize;

use crate::run::RunSummary;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub dry_run: bool,
    pub summary: &'a RunSummary,
    pub log_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,
}

/// Reporter for per-file console messages and the final summary
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    dry_run: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool, dry_run: bool) -> Self {
        Self {
            format,
            verbose,
            dry_run,
        }
    }

    fn text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    pub fn start(&self) {
        if self.text() {
            println!();
            if self.dry_run {
                println!("{}", "Processing files (dry run)...".bold());
            } else {
                println!("{}", "Processing files...".bold());
            }
            println!();
        }
    }

    /// Report deprecated identifiers that need manual review
    pub fn deprecated(&self, path: &Path, usages: &[DeprecatedUsage]) {
        if !self.text() {
            return;
        }
        for usage in usages {
            println!(
                "{} Found {} instance(s) of '{}' in file: {}",
                "!".yellow(),
                usage.count,
                usage.token,
                path.display()
            );
        }
    }

    pub fn changes(&self, path: &Path, changes: &[ChangeRecord]) {
        if !self.text() {
            return;
        }
        let verb = if self.dry_run { "Changes to make in file" } else { "Changes made to file" };
        println!("{}: {}", verb, path.display().to_string().bold());
        if self.verbose || self.dry_run {
            for change in changes {
                println!("  {} {}", "->".green(), change.description);
            }
        }
    }

    pub fn empty_skipped(&self, path: &Path) {
        if self.text() {
            let name = path.file_name().unwrap_or(path.as_os_str());
            println!("Skipping empty file: {}", name.to_string_lossy());
        }
    }

    pub fn backup_failed(&self, path: &Path, error: &str) {
        if self.text() {
            eprintln!("{}: backup failed for {} - {}", "Warning".yellow(), path.display(), error);
        }
    }

    pub fn unbacked_skipped(&self, path: &Path) {
        if self.text() {
            eprintln!(
                "{}: not processing {} because its backup failed",
                "Warning".yellow(),
                path.display()
            );
        }
    }

    pub fn process_failed(&self, path: &Path, reason: &str) {
        if self.text() {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), reason);
        }
    }

    /// Print final summary/output
    pub fn finish(&self, summary: &RunSummary, log_file: &Path, backup_dir: Option<&Path>) {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("-------------------------");
                println!("{}", "Processing complete!".bold());
                println!();
                println!("Total files backed up: {}", summary.backed_up);
                println!("Total files processed: {}", summary.processed);
                println!("Total empty files skipped: {}", summary.empty_skipped);
                let errors = format!("Total errors encountered: {}", summary.errors);
                if summary.errors > 0 {
                    println!("{}", errors.red());
                } else {
                    println!("{}", errors);
                }
                if self.verbose && summary.filtered > 0 {
                    println!("Files excluded by filter: {}", summary.filtered);
                }
                println!();
                if let Some(dir) = backup_dir {
                    println!("Backup directory: {}", dir.display());
                }
                println!("Log file: {}", log_file.display());
                println!("-------------------------");
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION"),
                    dry_run: self.dry_run,
                    summary,
                    log_file: log_file.display().to_string(),
                    backup_dir: backup_dir.map(|d| d.display().to_string()),
                };
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("{}: failed to serialize summary: {}", "Error".red(), e),
                }
            }
        }
    }
}
