//! Timestamped pre-overwrite backups.
//!
//! Every file about to be overwritten is first copied — never moved — into
//! a backup root that mirrors its repository-relative location, with a
//! sortable timestamp suffix. The copy is flushed to disk before the
//! caller is allowed to proceed with the overwrite; that ordering is
//! mandatory, not advisory. Backups are retained until pruned manually.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::errors::BackupError;

/// A completed backup of one file.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
    pub timestamp: String,
}

/// Creates timestamped copies under a backup root mirroring
/// repository-relative paths.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn create(root: &Path) -> Result<Self, BackupError> {
        fs::create_dir_all(root).map_err(|e| BackupError::RootUnwritable {
            path: root.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `path` to `<root>/<rel_path>.<timestamp>` and flush it durably.
    ///
    /// The original stays in place for the overwrite step that follows.
    /// Intermediate directories are created as needed.
    pub fn backup(&self, path: &Path, rel_path: &Path) -> Result<BackupRecord, BackupError> {
        let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        let mirrored = self.root.join(rel_path);
        let dest = match mirrored.file_name().and_then(|n| n.to_str()) {
            Some(name) => mirrored.with_file_name(format!("{name}.{timestamp}")),
            None => mirrored.with_file_name(timestamp.clone()),
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| BackupError::RootUnwritable {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::copy(path, &dest).map_err(|e| BackupError::CopyFailed {
            from: path.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;

        // The overwrite must not start until the backup is on disk.
        let file = File::open(&dest).map_err(|e| BackupError::FlushFailed {
            path: dest.clone(),
            source: e,
        })?;
        file.sync_all().map_err(|e| BackupError::FlushFailed {
            path: dest.clone(),
            source: e,
        })?;

        debug!(
            original = %path.display(),
            backup = %dest.display(),
            "backup created"
        );

        Ok(BackupRecord {
            original: path.to_path_buf(),
            backup: dest,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_mirrors_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("repo/config/nvim");
        fs::create_dir_all(&src_dir).unwrap();
        let src = src_dir.join("init.lua");
        fs::write(&src, "vim.opt.number = true\n").unwrap();

        let store = BackupStore::create(&dir.path().join("backups")).unwrap();
        let record = store.backup(&src, Path::new("config/nvim/init.lua")).unwrap();

        assert!(record.backup.starts_with(store.root()));
        assert!(record
            .backup
            .parent()
            .unwrap()
            .ends_with("config/nvim"));
        let name = record.backup.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("init.lua."));
        assert!(name.ends_with(&record.timestamp));
        assert_eq!(record.timestamp.len(), 14);

        // Copied, not moved, byte for byte.
        assert!(src.exists());
        assert_eq!(
            fs::read(&record.backup).unwrap(),
            b"vim.opt.number = true\n".to_vec()
        );
    }

    #[test]
    fn test_backup_unreadable_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::create(&dir.path().join("backups")).unwrap();
        let err = store
            .backup(&dir.path().join("missing"), Path::new("missing"))
            .unwrap_err();
        assert!(matches!(err, BackupError::CopyFailed { .. }));
    }

    #[test]
    fn test_create_store_makes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/backups");
        let store = BackupStore::create(&root).unwrap();
        assert!(store.root().is_dir());
    }
}
