//! One end-to-end run over a directory tree
//!
//! Files are handled one at a time in traversal order: backup, then rewrite.
//! All run-lifetime state (the totals and the audit log) lives in
//! [`RunContext`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use phplift_rules::RuleSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::backup::BackupManager;
use crate::config::BackupPolicy;
use crate::output::Reporter;
use crate::process::{is_empty_file, process_file, FileOutcome};
use crate::walker::{walk, ExclusionFilter, SourceFile, WalkEntry};

/// Running totals for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub backed_up: usize,
    pub processed: usize,
    pub empty_skipped: usize,
    pub errors: usize,
    /// Files with the target extension rejected by the filter
    pub filtered: usize,
}

/// Everything a run needs, resolved from config and flags
pub struct RunOptions {
    pub root: PathBuf,
    pub extension: String,
    pub filter: ExclusionFilter,
    pub backup_root: PathBuf,
    pub log_path: PathBuf,
    pub policy: BackupPolicy,
    pub dry_run: bool,
    pub rules: RuleSet,
}

/// Counters plus the log sink, threaded through every step of a run
pub struct RunContext {
    pub summary: RunSummary,
    log: AuditLog,
}

impl RunContext {
    pub fn new(log: AuditLog) -> Self {
        Self {
            summary: RunSummary::default(),
            log,
        }
    }

    /// Back up one file; returns whether a backup now exists
    ///
    /// With backups disabled nothing is counted or logged and the file is
    /// treated as safe to process.
    fn backup(&mut self, backups: &BackupManager, file: &SourceFile, reporter: &Reporter) -> bool {
        match backups.backup_file(&file.path, &file.relative) {
            Ok(Some(_)) => {
                self.summary.backed_up += 1;
                self.log.backed_up(&file.path);
                true
            }
            Ok(None) => true,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "backup failed");
                self.summary.errors += 1;
                self.log.backup_failed(&file.path);
                reporter.backup_failed(&file.path, &e.to_string());
                false
            }
        }
    }

    /// Account for the terminal outcome of one file
    pub fn record(&mut self, path: &Path, outcome: FileOutcome, reporter: &Reporter) {
        match outcome {
            FileOutcome::Processed { changes } => {
                if !changes.is_empty() {
                    self.log.changes(path, &changes);
                    reporter.changes(path, &changes);
                }
                self.log.processed(path);
                self.summary.processed += 1;
            }
            FileOutcome::SkippedEmpty => {
                self.log.empty_skipped(path);
                reporter.empty_skipped(path);
                self.summary.empty_skipped += 1;
            }
            FileOutcome::SkippedFiltered => {
                debug!(path = %path.display(), "excluded by filter");
                self.summary.filtered += 1;
            }
            FileOutcome::SkippedUnbacked => {
                self.log.unbacked_skipped(path);
                reporter.unbacked_skipped(path);
            }
            FileOutcome::Failed(e) => {
                let reason = e.to_string();
                warn!(path = %path.display(), error = %reason, "processing failed");
                self.log.process_failed(path, &reason);
                reporter.process_failed(path, &reason);
                self.summary.errors += 1;
            }
        }
    }

    fn finish(mut self) -> RunSummary {
        self.log.summary(&self.summary);
        self.summary
    }
}

/// Run over `options.root` and return the totals
///
/// Per-file failures are counted, never returned. Only setup failures
/// (log file, backup root) end the run early.
pub fn run(options: &RunOptions, reporter: &Reporter) -> Result<RunSummary> {
    let log = AuditLog::create(&options.log_path)?;
    let backups = BackupManager::new(options.backup_root.clone(), !options.dry_run);
    backups.init_session()?;

    info!(
        root = %options.root.display(),
        policy = ?options.policy,
        dry_run = options.dry_run,
        "starting run"
    );

    let mut ctx = RunContext::new(log);
    reporter.start();

    for entry in walk(&options.root, &options.extension, &options.filter) {
        let file = match entry {
            Ok(WalkEntry::Source(file)) => file,
            Ok(WalkEntry::Filtered(path)) => {
                ctx.record(&path, FileOutcome::SkippedFiltered, reporter);
                continue;
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if file.path.starts_with(&options.backup_root) {
            continue;
        }

        if options.policy == BackupPolicy::Strict && is_empty_file(&file.path) {
            ctx.record(&file.path, FileOutcome::SkippedEmpty, reporter);
            continue;
        }

        let backed_up = ctx.backup(&backups, &file, reporter);
        if !backed_up && options.policy == BackupPolicy::Strict {
            ctx.record(&file.path, FileOutcome::SkippedUnbacked, reporter);
            continue;
        }

        let report = process_file(&file.path, &options.rules, !options.dry_run);
        reporter.deprecated(&file.path, &report.deprecated);
        ctx.record(&file.path, report.outcome, reporter);
    }

    let summary = ctx.finish();
    info!(
        backed_up = summary.backed_up,
        processed = summary.processed,
        empty_skipped = summary.empty_skipped,
        errors = summary.errors,
        "run complete"
    );
    reporter.finish(&summary, &options.log_path, backups.session_path());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::output::OutputFormat;
    use std::fs;
    use tempfile::TempDir;

    const FILE_A: &str = "require(\"x.php\"); if($a AND $b){}";

    fn site(temp: &TempDir) -> PathBuf {
        let root = temp.path().join("site");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.php"), FILE_A).unwrap();
        fs::write(root.join("b.php"), "").unwrap();
        root
    }

    fn options(root: &Path, policy: BackupPolicy, dry_run: bool) -> RunOptions {
        let config = Config::default();
        RunOptions {
            root: root.to_path_buf(),
            extension: "php".to_string(),
            filter: config.exclusion_filter(),
            backup_root: config.backup_root(root, "2024-01-01_00-00-00"),
            log_path: config.log_path(root, "2024-01-01_00-00-00"),
            policy,
            dry_run,
            rules: RuleSet::new(),
        }
    }

    fn reporter() -> Reporter {
        Reporter::new(OutputFormat::Json, false, false)
    }

    fn totals(summary: &RunSummary) -> (usize, usize, usize, usize) {
        (
            summary.backed_up,
            summary.processed,
            summary.empty_skipped,
            summary.errors,
        )
    }

    #[test]
    fn test_two_file_tree_strict() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let opts = options(&root, BackupPolicy::Strict, false);

        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (1, 1, 1, 0));
        assert_eq!(
            fs::read_to_string(root.join("a.php")).unwrap(),
            "require \"x.php\"; if($a && $b){}"
        );
        assert_eq!(
            fs::read_to_string(opts.backup_root.join("a.php")).unwrap(),
            FILE_A
        );
        assert!(!opts.backup_root.join("b.php").exists());

        let log = fs::read_to_string(&opts.log_path).unwrap();
        let a = root.join("a.php");
        let b = root.join("b.php");
        assert!(log.contains(&format!("Backed up: {}", a.display())));
        assert!(log.contains(&format!("Changes made to file: {}", a.display())));
        assert!(log.contains("  - Removed brackets from require/include in 1 places."));
        assert!(log.contains(
            "  - Changed 'and/AND' to '&&' and 'or/OR' to '||' in if statements in 1 places."
        ));
        assert!(log.contains(&format!("Processed: {}", a.display())));
        assert!(log.contains(&format!("Skipped empty file: {}", b.display())));
        assert!(log.ends_with(
            "Processing complete!\n\
             Total files backed up: 1\n\
             Total files processed: 1\n\
             Total empty files skipped: 1\n\
             Total errors encountered: 0\n"
        ));
    }

    #[test]
    fn test_two_file_tree_independent() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let opts = options(&root, BackupPolicy::Independent, false);

        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (2, 1, 1, 0));
        assert_eq!(
            fs::read_to_string(root.join("a.php")).unwrap(),
            "require \"x.php\"; if($a && $b){}"
        );
        assert_eq!(fs::read(opts.backup_root.join("b.php")).unwrap(), b"");

        let log = fs::read_to_string(&opts.log_path).unwrap();
        assert!(log.contains(&format!("Backed up: {}", root.join("b.php").display())));
        assert!(log.contains(&format!("Skipped empty file: {}", root.join("b.php").display())));
    }

    #[test]
    fn test_second_run_skips_previous_backups() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        run(&options(&root, BackupPolicy::Strict, false), &reporter()).unwrap();

        let mut second = options(&root, BackupPolicy::Strict, false);
        second.backup_root = Config::default().backup_root(&root, "2024-01-01_00-00-01");
        let summary = run(&second, &reporter()).unwrap();

        assert_eq!(totals(&summary), (1, 1, 1, 0));
        assert!(second.backup_root.join("a.php").exists());
        assert!(!second.backup_root.join("site_backup_2024-01-01_00-00-00").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let opts = options(&root, BackupPolicy::Strict, true);

        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (0, 1, 1, 0));
        assert_eq!(fs::read_to_string(root.join("a.php")).unwrap(), FILE_A);
        assert!(!opts.backup_root.exists());
        assert!(fs::read_to_string(&opts.log_path)
            .unwrap()
            .contains("Processing complete!"));
    }

    #[test]
    fn test_backup_failure_strict_leaves_file_alone() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let opts = options(&root, BackupPolicy::Strict, false);
        // A directory where the copy should land makes the copy fail
        fs::create_dir_all(opts.backup_root.join("a.php")).unwrap();

        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (0, 0, 1, 1));
        assert_eq!(fs::read_to_string(root.join("a.php")).unwrap(), FILE_A);
        let log = fs::read_to_string(&opts.log_path).unwrap();
        let a = root.join("a.php");
        assert!(log.contains(&format!("Failed to backup: {}", a.display())));
        assert!(log.contains(&format!("Skipped processing (backup failed): {}", a.display())));
    }

    #[test]
    fn test_backup_failure_independent_still_processes() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let opts = options(&root, BackupPolicy::Independent, false);
        fs::create_dir_all(opts.backup_root.join("a.php")).unwrap();

        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (1, 1, 1, 1));
        assert_eq!(
            fs::read_to_string(root.join("a.php")).unwrap(),
            "require \"x.php\"; if($a && $b){}"
        );
    }

    #[test]
    fn test_single_byte_file_processed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("site");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("latin1.php"), b"<?php echo '\xe9'; if ($a AND $b) {}").unwrap();
        let opts = options(&root, BackupPolicy::Strict, false);

        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (1, 1, 0, 0));
        assert_eq!(
            fs::read(root.join("latin1.php")).unwrap(),
            b"<?php echo '\xe9'; if ($a && $b) {}"
        );
        assert_eq!(
            fs::read(opts.backup_root.join("latin1.php")).unwrap(),
            b"<?php echo '\xe9'; if ($a AND $b) {}"
        );
    }

    #[test]
    fn test_excluded_files_untouched() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("site");
        for dir in ["foo_backup_2024", "languages", "lib"] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("x.php"), "<?php $a = TRUE;").unwrap();
        }
        fs::write(root.join("process_files.php"), "<?php $a = TRUE;").unwrap();

        let opts = options(&root, BackupPolicy::Strict, false);
        let summary = run(&opts, &reporter()).unwrap();

        assert_eq!(totals(&summary), (1, 1, 0, 0));
        assert_eq!(summary.filtered, 1);
        assert_eq!(
            fs::read_to_string(root.join("lib/x.php")).unwrap(),
            "<?php $a = true;"
        );
        for untouched in ["foo_backup_2024/x.php", "languages/x.php", "process_files.php"] {
            assert_eq!(
                fs::read_to_string(root.join(untouched)).unwrap(),
                "<?php $a = TRUE;"
            );
        }
    }
}
