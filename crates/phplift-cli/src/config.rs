//! Configuration file support for phplift
//!
//! Loads `.phplift.toml` from current directory or parent directories.
//! Command-line flags override file values.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::walker::ExclusionFilter;

pub const CONFIG_FILE: &str = ".phplift.toml";
pub const DEFAULT_EXTENSION: &str = "php";
pub const DEFAULT_BACKUP_MARKER: &str = "_backup";
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["languages"];
pub const DEFAULT_SKIP_FILES: &[&str] = &["process_files.php"];
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// What to do when a file's backup fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackupPolicy {
    /// Never modify a file without a successful backup; empty files are
    /// skipped before backup since they are never modified
    #[default]
    Strict,
    /// Back up every eligible file and process it whether or not the
    /// backup succeeded
    Independent,
}

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub rules: RulesConfig,
    pub backup: BackupConfig,
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Extension of files to rewrite (default "php")
    pub extension: Option<String>,
    /// Directories with exactly these names are skipped (default ["languages"])
    pub exclude_dirs: Option<Vec<String>>,
    /// Directories whose name contains this marker are skipped (default "_backup")
    pub backup_marker: Option<String>,
    /// File names that are never touched (default ["process_files.php"])
    pub skip_files: Option<Vec<String>>,
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// If set, only these rules will run
    pub enabled: Option<Vec<String>>,
    /// Rules to exclude (applied after enabled)
    pub disabled: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Parent directory of the per-run backup root (default: the walked root)
    pub dir: Option<PathBuf>,
    pub policy: BackupPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for run logs (default: `<root>/logs`)
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load config from `.phplift.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Compute the effective set of enabled rules
    pub fn effective_rules(&self, all_rules: &[&str], cli_rules: &[String]) -> HashSet<String> {
        // CLI rules override config completely
        if !cli_rules.is_empty() {
            return cli_rules.iter().cloned().collect();
        }

        let mut rules: HashSet<String> = match &self.rules.enabled {
            Some(enabled) => enabled.iter().cloned().collect(),
            None => all_rules.iter().map(|s| s.to_string()).collect(),
        };

        for disabled in &self.rules.disabled {
            rules.remove(disabled);
        }

        rules
    }

    /// Rule names mentioned in the config that do not exist
    pub fn unknown_rules<'a>(&'a self, all_rules: &[&str]) -> Vec<&'a str> {
        self.rules
            .enabled
            .iter()
            .flatten()
            .chain(self.rules.disabled.iter())
            .map(String::as_str)
            .filter(|name| !all_rules.contains(name))
            .collect()
    }

    pub fn extension(&self) -> &str {
        self.paths.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Build the walk filter from the `[paths]` section
    pub fn exclusion_filter(&self) -> ExclusionFilter {
        ExclusionFilter {
            backup_marker: self.backup_marker().to_string(),
            excluded_dirs: self
                .paths
                .exclude_dirs
                .clone()
                .unwrap_or_else(|| DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect()),
            skip_files: self.skip_files(),
            patterns: self.paths.exclude.clone(),
        }
    }

    /// Effective skip-file names
    pub fn skip_files(&self) -> Vec<String> {
        self.paths
            .skip_files
            .clone()
            .unwrap_or_else(|| DEFAULT_SKIP_FILES.iter().map(|s| s.to_string()).collect())
    }

    fn backup_marker(&self) -> &str {
        self.paths.backup_marker.as_deref().unwrap_or(DEFAULT_BACKUP_MARKER)
    }

    /// Per-run backup root: `<dir>/<root name><marker>_<timestamp>`
    ///
    /// The name always contains the backup marker, so later runs prune it.
    pub fn backup_root(&self, root: &Path, timestamp: &str) -> PathBuf {
        let parent = self.backup.dir.clone().unwrap_or_else(|| root.to_path_buf());
        parent.join(format!("{}{}_{}", root_name(root), self.backup_marker(), timestamp))
    }

    /// Per-run log file: `<dir>/<root name>_processing_log_<timestamp>.txt`
    pub fn log_path(&self, root: &Path, timestamp: &str) -> PathBuf {
        let dir = self.log.dir.clone().unwrap_or_else(|| root.join("logs"));
        dir.join(format!("{}_processing_log_{}.txt", root_name(root), timestamp))
    }
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}
