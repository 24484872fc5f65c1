//! Backup functionality for safe file modifications
//!
//! Each run copies every file it may touch into its own timestamped backup
//! root, mirroring the relative layout of the walked tree. Backups from
//! different runs never overwrite each other.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::BackupError;

/// Backup manager for file modifications
pub struct BackupManager {
    /// Per-run backup root
    session_dir: PathBuf,
    /// Whether backups are enabled (off for dry runs)
    enabled: bool,
}

impl BackupManager {
    /// Create a new backup manager for the given backup root
    pub fn new(session_dir: PathBuf, enabled: bool) -> Self {
        Self {
            session_dir,
            enabled,
        }
    }

    /// Create the backup root
    pub fn init_session(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        fs::create_dir_all(&self.session_dir).with_context(|| {
            format!("Failed to create backup directory: {}", self.session_dir.display())
        })
    }

    /// Destination of `relative` inside the backup root
    pub fn backup_path(&self, relative: &Path) -> PathBuf {
        self.session_dir.join(relative)
    }

    /// Copy `path` to the backup root before it is modified
    ///
    /// Returns `Ok(None)` when backups are disabled.
    pub fn backup_file(&self, path: &Path, relative: &Path) -> Result<Option<PathBuf>, BackupError> {
        if !self.enabled {
            return Ok(None);
        }

        let backup_path = self.backup_path(relative);

        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent).map_err(|source| BackupError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::copy(path, &backup_path).map_err(|source| BackupError::Copy {
            from: path.to_path_buf(),
            to: backup_path.clone(),
            source,
        })?;

        debug!(from = %path.display(), to = %backup_path.display(), "backed up");
        Ok(Some(backup_path))
    }

    /// Get the session directory path (for reporting)
    pub fn session_path(&self) -> Option<&Path> {
        self.enabled.then_some(self.session_dir.as_path())
    }
}
