//! File processing logic for phplift

use std::fs;
use std::io::Write;
use std::path::Path;

use phplift_rules::{scan_deprecated, ChangeRecord, DeprecatedUsage, RuleSet};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ProcessError;

/// Terminal classification of one file
#[derive(Debug)]
pub enum FileOutcome {
    /// Rules ran and the result was written (or would be, in a dry run)
    Processed { changes: Vec<ChangeRecord> },
    /// Zero-length file, left untouched
    SkippedEmpty,
    /// Rejected by the walk filter
    SkippedFiltered,
    /// Not processed because its backup failed
    SkippedUnbacked,
    Failed(ProcessError),
}

/// Result of processing a single file
#[derive(Debug)]
pub struct FileReport {
    pub outcome: FileOutcome,
    /// Deprecated identifiers found, for manual review only
    pub deprecated: Vec<DeprecatedUsage>,
}

impl FileReport {
    fn outcome(outcome: FileOutcome) -> Self {
        Self {
            outcome,
            deprecated: Vec::new(),
        }
    }
}

/// Whether the file at `path` is zero bytes long
///
/// Unreadable metadata counts as non-empty so the read error surfaces later.
pub fn is_empty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false)
}

/// Rewrite a single PHP file in place
///
/// With `write == false` nothing is written; the outcome reports what
/// would have changed.
pub fn process_file(path: &Path, rules: &RuleSet, write: bool) -> FileReport {
    if is_empty_file(path) {
        return FileReport::outcome(FileOutcome::SkippedEmpty);
    }

    let (source, encoding) = match read_source(path) {
        Ok(read) => read,
        Err(e) => return FileReport::outcome(FileOutcome::Failed(e)),
    };

    let deprecated = scan_deprecated(&source);
    let rewrite = rules.apply(&source);

    if rewrite.content.is_empty() && !source.trim().is_empty() {
        return FileReport {
            outcome: FileOutcome::Failed(ProcessError::ContentInvalid),
            deprecated,
        };
    }

    if write && rewrite.content != source {
        let written = encoding
            .encode(&rewrite.content)
            .and_then(|bytes| write_file(path, &bytes));
        if let Err(e) = written {
            return FileReport {
                outcome: FileOutcome::Failed(e),
                deprecated,
            };
        }
        debug!(
            path = %path.display(),
            ?encoding,
            changes = rewrite.changes.len(),
            "rewrote file"
        );
    }

    FileReport {
        outcome: FileOutcome::Processed {
            changes: rewrite.changes,
        },
        deprecated,
    }
}

/// How a file's bytes were turned into the text the rules see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    /// Not valid UTF-8: each byte became the char with the same value, so
    /// Latin-1 and other single-byte files round-trip unchanged
    SingleByte,
}

impl Encoding {
    fn encode(self, content: &str) -> Result<Vec<u8>, ProcessError> {
        match self {
            Encoding::Utf8 => Ok(content.as_bytes().to_vec()),
            Encoding::SingleByte => content
                .chars()
                .map(|c| u8::try_from(c).map_err(|_| ProcessError::ContentInvalid))
                .collect(),
        }
    }
}

fn read_source(path: &Path) -> Result<(String, Encoding), ProcessError> {
    let bytes = fs::read(path).map_err(|source| ProcessError::Read { source })?;
    match String::from_utf8(bytes) {
        Ok(source) => Ok((source, Encoding::Utf8)),
        Err(e) => {
            let source: String = e.into_bytes().into_iter().map(char::from).collect();
            Ok((source, Encoding::SingleByte))
        }
    }
}

/// Replace the file's content atomically
///
/// The new content goes to a temporary file in the same directory, which is
/// then renamed over the original. The original's permissions are kept.
pub fn write_file(path: &Path, content: &[u8]) -> Result<(), ProcessError> {
    let write_err = |source| ProcessError::Write { source };
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let permissions = fs::metadata(path).map_err(write_err)?.permissions();
    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    fs::set_permissions(temp.path(), permissions).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
