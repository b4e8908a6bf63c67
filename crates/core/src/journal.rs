//! Reversible-operation journal and rollback script generation.
//!
//! Every destructive action is journaled as its inverse *before* the
//! forward action runs, so a crash mid-pass still leaves a runnable script
//! covering everything that happened up to that point. The rendered script
//! guards each inverse with an existence check, which makes re-running it
//! a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

/// Journal entry category, derived from the inverse action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Restore,
    RemoveSymlink,
    RemoveFile,
    RemoveDirectory,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Restore => write!(f, "restore"),
            Self::RemoveSymlink => write!(f, "remove_symlink"),
            Self::RemoveFile => write!(f, "remove_file"),
            Self::RemoveDirectory => write!(f, "remove_directory"),
        }
    }
}

/// The inverse of one destructive action, with everything needed to run it.
#[derive(Debug, Clone)]
pub enum InverseAction {
    /// Copy a backup over the (possibly overwritten) original.
    RestoreFile { backup: PathBuf, target: PathBuf },
    /// Remove a symlink created during the pass.
    RemoveSymlink { link: PathBuf },
    /// Remove a file created during the pass.
    RemoveFile { path: PathBuf },
    /// Remove a directory created during the pass.
    RemoveDirectory { path: PathBuf },
}

impl InverseAction {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::RestoreFile { .. } => OperationKind::Restore,
            Self::RemoveSymlink { .. } => OperationKind::RemoveSymlink,
            Self::RemoveFile { .. } => OperationKind::RemoveFile,
            Self::RemoveDirectory { .. } => OperationKind::RemoveDirectory,
        }
    }

    /// Render the guarded shell command for this inverse.
    fn to_shell(&self) -> String {
        match self {
            Self::RestoreFile { backup, target } => format!(
                "if [ -f {b} ]; then\n  cp -p {b} {t}\nfi",
                b = shell_quote(backup),
                t = shell_quote(target),
            ),
            Self::RemoveSymlink { link } => format!(
                "if [ -L {l} ]; then\n  rm {l}\nfi",
                l = shell_quote(link),
            ),
            Self::RemoveFile { path } => format!(
                "if [ -f {p} ]; then\n  rm {p}\nfi",
                p = shell_quote(path),
            ),
            Self::RemoveDirectory { path } => format!(
                "if [ -d {p} ]; then\n  rmdir {p}\nfi",
                p = shell_quote(path),
            ),
        }
    }
}

/// One journaled operation: what happened, and how to undo it.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub description: String,
    pub inverse: InverseAction,
}

/// Ordered log of inverse actions for one sync pass.
///
/// Recording is lazy: a disabled journal (read-only and dry-run
/// invocations) turns [`OperationJournal::record`] into a no-op.
#[derive(Debug, Default)]
pub struct OperationJournal {
    ops: Vec<Operation>,
    enabled: bool,
}

impl OperationJournal {
    pub fn new(enabled: bool) -> Self {
        Self {
            ops: Vec::new(),
            enabled,
        }
    }

    /// Append one operation. Must be called before the forward action it
    /// reverses is performed.
    pub fn record(&mut self, description: impl Into<String>, inverse: InverseAction) {
        if !self.enabled {
            return;
        }
        let op = Operation {
            kind: inverse.kind(),
            description: description.into(),
            inverse,
        };
        debug!(kind = %op.kind, description = %op.description, "journaled operation");
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Render the rollback script body for a script living at `script_path`.
    ///
    /// Format invariants: interpreter directive first, a generation
    /// timestamp comment, one guarded inverse per operation in recording
    /// order, and a trailing completion message naming the script's own
    /// path.
    pub fn render(&self, script_path: &Path) -> String {
        let mut out = String::new();
        out.push_str("#!/usr/bin/env bash\n");
        out.push_str(&format!(
            "# dotsync rollback script generated {}\n",
            Local::now().to_rfc3339()
        ));
        out.push_str("# Safe to re-run: every action checks its target before acting.\n");
        out.push_str("set -u\n\n");

        for op in &self.ops {
            out.push_str(&format!("# {}\n", op.description));
            out.push_str(&op.inverse.to_shell());
            out.push_str("\n\n");
        }

        out.push_str(&format!(
            "echo \"rollback complete: {}\"\n",
            script_path.display()
        ));
        out
    }

    /// Write the rendered script to `script_path` and mark it executable.
    pub fn write_script(&self, script_path: &Path) -> std::io::Result<()> {
        if let Some(parent) = script_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(script_path, self.render(script_path))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(script_path, fs::Permissions::from_mode(0o755))?;
        }
        info!(
            path = %script_path.display(),
            operations = self.ops.len(),
            "wrote rollback script"
        );
        Ok(())
    }
}

/// Single-quote a path for safe interpolation into the script body.
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}
