//! Error types for the dotsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.
//!
//! Note the taxonomy boundaries: a merge conflict is a terminal *outcome*
//! (see [`crate::merge::MergeStatus`]), not an error, and per-candidate
//! failures are isolated by the pass driver rather than propagated.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pass(#[from] PassError),
}

// ---------------------------------------------------------------------------
// Classifier errors
// ---------------------------------------------------------------------------

/// Errors from text/binary classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The candidate path vanished between discovery and classification.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Generic I/O wrapper.
    #[error("classifier I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Merge errors
// ---------------------------------------------------------------------------

/// Errors from the three-way merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The external merge tool is not installed. Callers must not fall back
    /// to a blind overwrite without explicit operator consent.
    #[error("three-way merge tool '{tool}' not found; {remedy}")]
    ToolUnavailable { tool: String, remedy: String },

    /// The merge tool reported trouble (exit status 2 or higher).
    #[error("merge tool failed (exit {exit_code}): {stderr}")]
    MergeFailed { exit_code: i32, stderr: String },

    /// Generic I/O wrapper.
    #[error("merge I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Backup errors
// ---------------------------------------------------------------------------

/// Errors from the backup store.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The backup root or a mirrored subdirectory could not be created.
    #[error("cannot create backup directory '{}': {source}", path.display())]
    RootUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copying the source file into the backup tree failed.
    #[error("failed to copy '{}' to backup '{}': {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// The backup copy could not be flushed to disk.
    #[error("failed to flush backup '{}': {source}", path.display())]
    FlushFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Pass-level (environmental) errors
// ---------------------------------------------------------------------------

/// Errors that are fatal for a whole sync pass.
///
/// Per-candidate failures never surface here; they become
/// [`crate::sync_pass::CandidateOutcome::Failed`] entries in the report.
#[derive(Debug, Error)]
pub enum PassError {
    /// The data directory (rollback scripts, scratch space) is unavailable.
    #[error("cannot prepare data directory '{}': {source}", path.display())]
    DataDirUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backup root itself could not be created.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Merge mode was requested but the merge tool is absent.
    #[error("merge mode requires the three-way merge tool; {0}")]
    MergeToolMissing(String),

    /// The rollback script could not be written.
    #[error("failed to write rollback script '{}': {source}", path.display())]
    RollbackWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ClassifyError::NotFound(PathBuf::from("/tmp/missing"));
        assert_eq!(err.to_string(), "file not found: /tmp/missing");

        let err = MergeError::ToolUnavailable {
            tool: "diff3".into(),
            remedy: "install diffutils".into(),
        };
        assert!(err.to_string().contains("diff3"));
        assert!(err.to_string().contains("install diffutils"));

        let err = MergeError::MergeFailed {
            exit_code: 2,
            stderr: "trouble".into(),
        };
        assert_eq!(err.to_string(), "merge tool failed (exit 2): trouble");

        let err = ConfigError::InvalidValue {
            field: "options.log_level".into(),
            detail: "unknown level 'loud'".into(),
        };
        assert!(err.to_string().contains("options.log_level"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let merge_err = MergeError::MergeFailed {
            exit_code: 2,
            stderr: String::new(),
        };
        let core_err: CoreError = merge_err.into();
        assert!(matches!(core_err, CoreError::Merge(_)));

        let classify_err = ClassifyError::NotFound(PathBuf::from("x"));
        let core_err: CoreError = classify_err.into();
        assert!(matches!(core_err, CoreError::Classify(_)));
    }
}
