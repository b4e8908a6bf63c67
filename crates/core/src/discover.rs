//! Candidate discovery.
//!
//! Walks the template repository and pairs each file with its deployed
//! location under the target root. The linker's naming convention is a
//! leading-dot translation of the first path component (`bashrc` ->
//! `.bashrc`, `config/nvim/init.lua` -> `.config/nvim/init.lua`). Files
//! with no deployed counterpart are not candidates: there is nothing to
//! sync back.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::vcs::RepoIndex;

/// One (deployed file, repository file) pair considered for sync.
///
/// Immutable once created for the duration of one pass.
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    /// Deployed path under the target root.
    pub local_path: PathBuf,
    /// Source path inside the template repository.
    pub repo_path: PathBuf,
    /// Path relative to the repository root.
    pub rel_path: PathBuf,
    /// Whether the repository path has history at `HEAD`.
    pub tracked: bool,
}

/// Enumerate sync candidates for one pass, in stable filename order.
pub fn discover(
    repo_root: &Path,
    target_root: &Path,
    dot_prefix: bool,
    ignore_patterns: &[String],
    index: &RepoIndex,
) -> Vec<SyncCandidate> {
    let mut candidates = Vec::new();

    let walker = WalkDir::new(repo_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(repo_root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let rel_str = rel_unix(&rel);
        if is_ignored(&rel_str, ignore_patterns) {
            trace!(path = %rel_str, "ignored by pattern");
            continue;
        }

        let local_path = target_root.join(deployed_rel(&rel, dot_prefix));
        if !local_path.exists() {
            trace!(path = %rel_str, "not deployed, skipping");
            continue;
        }

        candidates.push(SyncCandidate {
            local_path,
            repo_path: entry.path().to_path_buf(),
            tracked: index.is_tracked(&rel),
            rel_path: rel,
        });
    }

    debug!(count = candidates.len(), "discovered sync candidates");
    candidates
}

/// Deployed location of a repo-relative path under the target root.
fn deployed_rel(rel: &Path, dot_prefix: bool) -> PathBuf {
    if !dot_prefix {
        return rel.to_path_buf();
    }
    let mut components = rel.components();
    match components.next() {
        Some(Component::Normal(first)) => {
            let first = first.to_string_lossy();
            let dotted = if first.starts_with('.') {
                first.into_owned()
            } else {
                format!(".{first}")
            };
            PathBuf::from(dotted).join(components.as_path())
        }
        _ => rel.to_path_buf(),
    }
}

fn is_ignored(rel: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| glob_match::glob_match(p, rel))
}

fn rel_unix(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
