//! Version-control queries against the template repository.
//!
//! The pass needs two answers from git: "is this path tracked?" and "what
//! did it look like at `HEAD`?". Tracked paths are batch-loaded once at
//! session start instead of probing per call, and every failure path
//! degrades to "untracked" / empty ancestor so a sync pass still runs
//! against a directory that is not under version control at all.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, info, warn};

/// Tracked-path index and ancestor access for one repository.
pub struct RepoIndex {
    repo: Option<Repository>,
    tracked: HashSet<PathBuf>,
}

impl RepoIndex {
    /// Open the repository at `repo_root` and batch-load its tracked paths.
    ///
    /// A missing repository or unreadable index yields an empty index:
    /// every path reports untracked and every ancestor is empty.
    pub fn open(repo_root: &Path) -> Self {
        let repo = match Repository::open(repo_root) {
            Ok(repo) => repo,
            Err(e) => {
                warn!(
                    path = %repo_root.display(),
                    error = %e,
                    "no git repository, all paths treated as untracked"
                );
                return Self {
                    repo: None,
                    tracked: HashSet::new(),
                };
            }
        };

        let mut tracked = HashSet::new();
        match repo.index() {
            Ok(index) => {
                for entry in index.iter() {
                    let rel = String::from_utf8_lossy(&entry.path).into_owned();
                    tracked.insert(PathBuf::from(rel));
                }
            }
            Err(e) => warn!(error = %e, "cannot read git index, treating all paths as untracked"),
        }

        info!(count = tracked.len(), "loaded tracked path index");
        Self {
            repo: Some(repo),
            tracked,
        }
    }

    /// Whether `rel_path` is tracked by version control.
    pub fn is_tracked(&self, rel_path: &Path) -> bool {
        self.tracked.contains(rel_path)
    }

    /// Number of tracked paths.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Content of `rel_path` as of `HEAD`.
    ///
    /// Untracked paths, paths absent from the `HEAD` tree (renames
    /// included), and any retrieval failure return an empty byte sequence.
    /// This is deliberate policy, not a fallback of convenience: such files
    /// merge as if the local version introduces all content as a fresh
    /// addition.
    pub fn ancestor_content(&self, rel_path: &Path) -> Vec<u8> {
        let Some(repo) = &self.repo else {
            return Vec::new();
        };
        if !self.is_tracked(rel_path) {
            debug!(path = %rel_path.display(), "untracked, using empty ancestor");
            return Vec::new();
        }
        match head_blob(repo, rel_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(
                    path = %rel_path.display(),
                    error = %e,
                    "no ancestor at HEAD, using empty base"
                );
                Vec::new()
            }
        }
    }
}

/// Look up the blob for `rel_path` in the `HEAD` tree.
fn head_blob(repo: &Repository, rel_path: &Path) -> Result<Vec<u8>, git2::Error> {
    let tree = repo.head()?.peel_to_tree()?;
    let entry = tree.get_path(rel_path)?;
    let blob = repo.find_blob(entry.id())?;
    Ok(blob.content().to_vec())
}
