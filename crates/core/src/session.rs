//! Per-pass sync session context.
//!
//! The session owns every piece of state a pass needs — tool registry,
//! tracked-path index, journal, backup store, scratch directory — so
//! components never reach for globals and the whole thing is testable in
//! isolation. Dropping the session removes the scratch directory on every
//! exit path, including cancellation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use tempfile::TempDir;
use tracing::info;

use crate::backup::BackupStore;
use crate::config::Config;
use crate::errors::PassError;
use crate::journal::OperationJournal;
use crate::tools::ToolRegistry;
use crate::vcs::RepoIndex;

/// What a pass does when local and repository content diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Three-way merge against the `HEAD` ancestor.
    #[default]
    Merge,
    /// Replace the repository copy with the local content.
    Overwrite,
}

/// Invocation modes consumed from the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// Compute and report without any mutation, backup, or journal writes.
    pub dry_run: bool,
    /// Emit per-candidate classification and comparison results.
    pub verbose: bool,
}

/// Shared cancellation flag set by the signal handler.
pub type CancelFlag = Arc<AtomicBool>;

/// Context for one sync pass.
///
/// Concurrent invocations against the same backup root are unsupported;
/// the session assumes it is the only writer.
pub struct SyncSession {
    pub config: Config,
    pub options: SyncOptions,
    pub tools: ToolRegistry,
    pub repo_index: RepoIndex,
    pub journal: OperationJournal,
    pub backups: BackupStore,
    /// Sortable pass identifier; names the rollback script.
    pub started_at: String,
    cancel: CancelFlag,
    /// Scratch space for synthesized ancestors. Removed on drop.
    scratch: TempDir,
}

impl SyncSession {
    /// Resolve tools, batch-load the tracked index, and prepare the backup
    /// root and data directory.
    ///
    /// Environmental failures here are fatal for the whole run; nothing has
    /// been mutated yet when they occur.
    pub async fn start(
        config: Config,
        options: SyncOptions,
        cancel: CancelFlag,
    ) -> Result<Self, PassError> {
        let tools = ToolRegistry::detect().await;
        if options.mode == SyncMode::Merge && !tools.has_merge_tool() {
            return Err(PassError::MergeToolMissing(ToolRegistry::merge_remedy()));
        }

        let repo_index = RepoIndex::open(&config.paths.repo_root);

        std::fs::create_dir_all(&config.paths.data_dir).map_err(|e| {
            PassError::DataDirUnavailable {
                path: config.paths.data_dir.clone(),
                source: e,
            }
        })?;
        let backups = BackupStore::create(&config.backup_root())?;

        let scratch = tempfile::tempdir().map_err(|e| PassError::DataDirUnavailable {
            path: std::env::temp_dir(),
            source: e,
        })?;

        let journal = OperationJournal::new(!options.dry_run);
        let started_at = Local::now().format("%Y%m%d%H%M%S").to_string();

        info!(
            mode = ?options.mode,
            dry_run = options.dry_run,
            repo_root = %config.paths.repo_root.display(),
            "sync session started"
        );

        Ok(Self {
            config,
            options,
            tools,
            repo_index,
            journal,
            backups,
            started_at,
            cancel,
            scratch,
        })
    }

    /// Whether an interrupt asked the pass to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Write `content` to a scratch file that lives as long as the session.
    pub fn scratch_file(&self, name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.scratch.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Where this pass writes its rollback script.
    pub fn rollback_script_path(&self) -> PathBuf {
        self.config.rollback_script_path(&self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config(dir: &std::path::Path) -> Config {
        let repo_root = dir.join("repo");
        std::fs::create_dir_all(&repo_root).unwrap();
        let mut config = Config::starter(&repo_root);
        config.paths.target_root = dir.join("home");
        config.paths.data_dir = dir.join("data");
        config
    }

    #[tokio::test]
    async fn test_start_prepares_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));

        let session = SyncSession::start(
            config,
            SyncOptions {
                mode: SyncMode::Overwrite,
                ..Default::default()
            },
            cancel,
        )
        .await
        .unwrap();

        assert!(session.backups.root().is_dir());
        assert!(session.config.paths.data_dir.is_dir());
        assert_eq!(session.started_at.len(), 14);
        assert!(!session.is_cancelled());
    }

    #[tokio::test]
    async fn test_scratch_files_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));

        let session = SyncSession::start(
            config,
            SyncOptions {
                mode: SyncMode::Overwrite,
                ..Default::default()
            },
            cancel,
        )
        .await
        .unwrap();

        let scratch = session.scratch_file("ancestor-0", b"base\n").unwrap();
        assert!(scratch.exists());
        drop(session);
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn test_cancel_flag_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));

        let session = SyncSession::start(
            config,
            SyncOptions {
                mode: SyncMode::Overwrite,
                ..Default::default()
            },
            cancel.clone(),
        )
        .await
        .unwrap();

        cancel.store(true, Ordering::SeqCst);
        assert!(session.is_cancelled());
    }

    #[tokio::test]
    async fn test_dry_run_disables_journal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));

        let mut session = SyncSession::start(
            config,
            SyncOptions {
                mode: SyncMode::Overwrite,
                dry_run: true,
                ..Default::default()
            },
            cancel,
        )
        .await
        .unwrap();

        session.journal.record(
            "should not be recorded",
            crate::journal::InverseAction::RemoveFile {
                path: std::path::PathBuf::from("/x"),
            },
        );
        assert!(session.journal.is_empty());
    }
}
