//! Plain-text, append-only audit log for one run
//!
//! One line per event. The log is the only record of what a run changed,
//! so a failed append is reported through tracing but never stops the run.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use phplift_rules::ChangeRecord;
use tracing::warn;

use crate::run::RunSummary;

pub const SEPARATOR: &str = "--------------------------";

/// Append-only log file
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    /// Open (creating parents as needed) the log file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one line
    pub fn line(&mut self, message: &str) {
        if let Err(e) = writeln!(self.file, "{}", message) {
            warn!(log = %self.path.display(), error = %e, "failed to append to log");
        }
    }

    pub fn backed_up(&mut self, path: &Path) {
        self.line(&format!("Backed up: {}", path.display()));
    }

    pub fn backup_failed(&mut self, path: &Path) {
        self.line(&format!("Failed to backup: {}", path.display()));
    }

    pub fn changes(&mut self, path: &Path, changes: &[ChangeRecord]) {
        self.line(&format!("Changes made to file: {}", path.display()));
        for change in changes {
            self.line(&format!("  - {}", change.description));
        }
    }

    pub fn processed(&mut self, path: &Path) {
        self.line(&format!("Processed: {}", path.display()));
    }

    pub fn process_failed(&mut self, path: &Path, reason: &str) {
        self.line(&format!("Failed to process: {} ({})", path.display(), reason));
    }

    pub fn empty_skipped(&mut self, path: &Path) {
        self.line(&format!("Skipped empty file: {}", path.display()));
    }

    pub fn unbacked_skipped(&mut self, path: &Path) {
        self.line(&format!("Skipped processing (backup failed): {}", path.display()));
    }

    /// Write the closing separator and the four totals
    pub fn summary(&mut self, summary: &RunSummary) {
        self.line(SEPARATOR);
        self.line("Processing complete!");
        self.line(&format!("Total files backed up: {}", summary.backed_up));
        self.line(&format!("Total files processed: {}", summary.processed));
        self.line(&format!("Total empty files skipped: {}", summary.empty_skipped));
        self.line(&format!("Total errors encountered: {}", summary.errors));
    }
}
