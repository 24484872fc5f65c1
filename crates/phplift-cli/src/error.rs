//! Per-file error types
//!
//! None of these abort a run. The coordinator turns each one into a counter
//! increment and an audit log line.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a file could not be rewritten
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("read error: {source}")]
    Read {
        #[source]
        source: io::Error,
    },

    #[error("write error: {source}")]
    Write {
        #[source]
        source: io::Error,
    },

    /// The rule engine produced nothing from non-blank input
    #[error("content became invalid")]
    ContentInvalid,
}

/// Why a file could not be copied into the backup root
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("failed to create backup directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        let read = ProcessError::Read {
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(read.to_string(), "read error: gone");
        assert_eq!(ProcessError::ContentInvalid.to_string(), "content became invalid");
    }

    #[test]
    fn test_backup_error_display() {
        let err = BackupError::Copy {
            from: PathBuf::from("a.php"),
            to: PathBuf::from("b/a.php"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to copy a.php to b/a.php: denied");
    }
}
