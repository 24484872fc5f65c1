//! Directory traversal with pruning
//!
//! The walk is depth-first and pre-order, so a directory is judged before
//! anything under it is read. Excluded directories are never descended into.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Decides which entries of the tree are eligible
pub trait EntryFilter {
    /// Whether to descend into the directory at `path` (relative to the root)
    fn accept_dir(&self, path: &Path) -> bool;

    /// Whether the file at `path` (relative to the root) may be touched
    fn accept_file(&self, path: &Path) -> bool;
}

/// Name- and glob-based exclusions
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    /// Directories whose name contains this substring are pruned
    pub backup_marker: String,
    /// Directories with exactly these names are pruned
    pub excluded_dirs: Vec<String>,
    /// Files with exactly these names are never touched
    pub skip_files: Vec<String>,
    /// Glob patterns; a trailing `/` means "directory with this name"
    pub patterns: Vec<String>,
}

impl ExclusionFilter {
    fn matches_pattern(&self, path: &Path, is_dir: bool) -> bool {
        let path_str = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        for pattern in &self.patterns {
            if let Some(dir_pattern) = pattern.strip_suffix('/') {
                if is_dir && name == dir_pattern {
                    return true;
                }
                continue;
            }

            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) || glob_pattern.matches(&name) {
                    return true;
                }
            }
        }

        false
    }
}

impl EntryFilter for ExclusionFilter {
    fn accept_dir(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.backup_marker.is_empty() && name.contains(self.backup_marker.as_str()) {
            return false;
        }
        if self.excluded_dirs.iter().any(|dir| *dir == name) {
            return false;
        }
        !self.matches_pattern(path, true)
    }

    fn accept_file(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_files.iter().any(|file| *file == name) {
            return false;
        }
        !self.matches_pattern(path, false)
    }
}

/// A file eligible for backup and processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as reached from the walk root
    pub path: PathBuf,
    /// Path relative to the walk root
    pub relative: PathBuf,
}

/// One item yielded by [`walk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    /// A file with the target extension that passed the filter
    Source(SourceFile),
    /// A file with the target extension that the filter rejected
    Filtered(PathBuf),
}

/// Walk `root` and yield files with `extension`, in traversal order
///
/// Entries are visited sorted by file name so runs are reproducible.
/// Symbolic links are not followed.
pub fn walk<'a, F: EntryFilter>(
    root: &'a Path,
    extension: &'a str,
    filter: &'a F,
) -> impl Iterator<Item = Result<WalkEntry, walkdir::Error>> + 'a {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let accepted = filter.accept_dir(relative);
            if !accepted {
                debug!(path = %entry.path().display(), "pruned directory");
            }
            accepted
        })
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };

            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |ext| ext != extension)
            {
                return None;
            }

            let path = entry.into_path();
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            if filter.accept_file(&relative) {
                Some(Ok(WalkEntry::Source(SourceFile { path, relative })))
            } else {
                Some(Ok(WalkEntry::Filtered(path)))
            }
        })
}
