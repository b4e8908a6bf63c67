//! The per-candidate state machine and pass driver.
//!
//! Each candidate moves through: classified -> {identical | diverged} ->
//! [merge mode] merge attempted -> {clean -> backed up -> overwritten |
//! conflict reported}. Overwrite mode goes straight from diverged to
//! backed up and overwritten. Candidates are processed strictly one at a
//! time; per-candidate failures are isolated and reported in the final
//! summary, never aborting the pass.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::classify::{classify, Classification};
use crate::compare::{compare, unified_diff, ComparisonResult};
use crate::discover::SyncCandidate;
use crate::errors::{ClassifyError, PassError};
use crate::journal::InverseAction;
use crate::merge::{merge, MergeStatus};
use crate::session::{SyncMode, SyncSession};

/// Terminal outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Local and repository content are byte-identical; nothing recorded.
    Unchanged,
    /// Three-way merge resolved cleanly; repository copy updated.
    Merged,
    /// Repository copy replaced with the local content (overwrite mode).
    Overwritten,
    /// Merge produced conflict markers; repository untouched, merged
    /// content written to a side file for inspection.
    Conflict { side_file: PathBuf },
    /// Binary files are never content-synced.
    SkippedBinary,
    /// Candidate path vanished between discovery and processing.
    SkippedMissing { reason: String },
    /// Processing failed; repository copy left untouched.
    Failed { reason: String },
}

impl CandidateOutcome {
    /// Short label for reports and logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Merged => "merged",
            Self::Overwritten => "overwritten",
            Self::Conflict { .. } => "conflict",
            Self::SkippedBinary => "skipped-binary",
            Self::SkippedMissing { .. } => "skipped-missing",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Summary of one whole pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Per-candidate outcomes in processing order.
    pub outcomes: Vec<(SyncCandidate, CandidateOutcome)>,
    /// Files merged or overwritten (or that would be, in a dry run).
    pub files_touched: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    pub skipped: usize,
    pub failures: usize,
    /// The pass stopped early on an interrupt.
    pub cancelled: bool,
    /// Set when this report describes a dry run.
    pub dry_run: bool,
    /// Rollback script covering everything journaled this pass.
    pub rollback_script: Option<PathBuf>,
}

/// Run one sync pass over `candidates`.
///
/// Only environmental failures (rollback script unwritable) surface as
/// errors; everything else lands in the report.
pub async fn run_pass(
    session: &mut SyncSession,
    candidates: Vec<SyncCandidate>,
) -> Result<SyncReport, PassError> {
    let mut report = SyncReport {
        dry_run: session.options.dry_run,
        ..Default::default()
    };

    for (seq, candidate) in candidates.into_iter().enumerate() {
        if session.is_cancelled() {
            warn!("interrupt received, stopping before remaining candidates");
            report.cancelled = true;
            break;
        }

        let outcome = process_candidate(session, &candidate, seq).await;
        match &outcome {
            CandidateOutcome::Merged | CandidateOutcome::Overwritten => {
                report.files_touched += 1;
            }
            CandidateOutcome::Unchanged => report.unchanged += 1,
            CandidateOutcome::Conflict { .. } => report.conflicts += 1,
            CandidateOutcome::SkippedBinary | CandidateOutcome::SkippedMissing { .. } => {
                report.skipped += 1;
            }
            CandidateOutcome::Failed { .. } => report.failures += 1,
        }
        report.outcomes.push((candidate, outcome));
    }

    // Journal entries recorded before a cancellation are preserved; the
    // partial script must remain valid and runnable.
    if !session.journal.is_empty() {
        let script = session.rollback_script_path();
        session
            .journal
            .write_script(&script)
            .map_err(|e| PassError::RollbackWriteFailed {
                path: script.clone(),
                source: e,
            })?;
        report.rollback_script = Some(script);
    }

    info!(
        touched = report.files_touched,
        unchanged = report.unchanged,
        conflicts = report.conflicts,
        skipped = report.skipped,
        failures = report.failures,
        cancelled = report.cancelled,
        "sync pass finished"
    );
    Ok(report)
}

async fn process_candidate(
    session: &mut SyncSession,
    candidate: &SyncCandidate,
    seq: usize,
) -> CandidateOutcome {
    let rel = candidate.rel_path.display().to_string();

    // Paths can vanish between discovery and processing.
    if !candidate.repo_path.exists() {
        warn!(path = %rel, "repository file vanished, skipping");
        return CandidateOutcome::SkippedMissing {
            reason: "repository file vanished".into(),
        };
    }

    let class = match classify(&candidate.local_path, &session.tools).await {
        Ok(class) => class,
        Err(ClassifyError::NotFound(_)) => {
            warn!(path = %rel, "local file vanished, skipping");
            return CandidateOutcome::SkippedMissing {
                reason: "local file vanished".into(),
            };
        }
        Err(e) => {
            warn!(path = %rel, error = %e, "classification failed");
            return CandidateOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };
    if session.options.verbose {
        info!(path = %rel, classification = %class, "classified");
    }
    if class == Classification::Binary {
        debug!(path = %rel, "binary file, content sync skipped");
        return CandidateOutcome::SkippedBinary;
    }

    match compare(&candidate.local_path, &candidate.repo_path) {
        Ok(ComparisonResult::Identical) => {
            if session.options.verbose {
                info!(path = %rel, "identical");
            }
            return CandidateOutcome::Unchanged;
        }
        Ok(ComparisonResult::Diverged) => {
            if session.options.verbose {
                info!(path = %rel, "diverged");
                let diff = unified_diff(
                    &candidate.repo_path,
                    &candidate.local_path,
                    "repository",
                    "local",
                );
                if !diff.is_empty() {
                    debug!(path = %rel, diff = %diff, "divergence detail");
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %rel, "candidate vanished during comparison, skipping");
            return CandidateOutcome::SkippedMissing {
                reason: "candidate vanished during comparison".into(),
            };
        }
        Err(e) => {
            warn!(path = %rel, error = %e, "comparison failed");
            return CandidateOutcome::Failed {
                reason: e.to_string(),
            };
        }
    }

    match session.options.mode {
        SyncMode::Merge => merge_candidate(session, candidate, seq).await,
        SyncMode::Overwrite => overwrite_candidate(session, candidate),
    }
}

async fn merge_candidate(
    session: &mut SyncSession,
    candidate: &SyncCandidate,
    seq: usize,
) -> CandidateOutcome {
    let rel = candidate.rel_path.display().to_string();

    let ancestor = session.repo_index.ancestor_content(&candidate.rel_path);
    let ancestor_path = match session.scratch_file(&format!("ancestor-{seq}"), &ancestor) {
        Ok(path) => path,
        Err(e) => {
            return CandidateOutcome::Failed {
                reason: format!("cannot stage ancestor: {e}"),
            };
        }
    };

    let outcome = match merge(
        &candidate.local_path,
        &ancestor_path,
        &candidate.repo_path,
        &session.tools,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(path = %rel, error = %e, "merge failed");
            return CandidateOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    match outcome.status {
        MergeStatus::Conflict => {
            let side_file = conflict_side_file(&candidate.repo_path);
            if !session.options.dry_run {
                if let Err(e) = fs::write(&side_file, &outcome.content) {
                    return CandidateOutcome::Failed {
                        reason: format!("cannot write conflict file: {e}"),
                    };
                }
                session.journal.record(
                    format!("remove conflict side file for {rel}"),
                    InverseAction::RemoveFile {
                        path: side_file.clone(),
                    },
                );
            }
            warn!(
                path = %rel,
                side_file = %side_file.display(),
                "merge conflict, repository left untouched"
            );
            CandidateOutcome::Conflict { side_file }
        }
        MergeStatus::Clean => {
            if session.options.dry_run {
                debug!(path = %rel, "dry run, would update repository copy");
                return CandidateOutcome::Merged;
            }
            match write_repo_copy(session, candidate, outcome.content.as_bytes()) {
                Ok(()) => {
                    info!(path = %rel, "merged into repository");
                    CandidateOutcome::Merged
                }
                Err(reason) => CandidateOutcome::Failed { reason },
            }
        }
    }
}

fn overwrite_candidate(session: &mut SyncSession, candidate: &SyncCandidate) -> CandidateOutcome {
    let rel = candidate.rel_path.display().to_string();

    if session.options.dry_run {
        debug!(path = %rel, "dry run, would overwrite repository copy");
        return CandidateOutcome::Overwritten;
    }

    let content = match fs::read(&candidate.local_path) {
        Ok(content) => content,
        Err(e) => {
            return CandidateOutcome::Failed {
                reason: format!("cannot read local file: {e}"),
            };
        }
    };
    match write_repo_copy(session, candidate, &content) {
        Ok(()) => {
            info!(path = %rel, "overwrote repository copy");
            CandidateOutcome::Overwritten
        }
        Err(reason) => CandidateOutcome::Failed { reason },
    }
}

/// Backup, journal the restore, then overwrite — in that order. The backup
/// is flushed and its inverse journaled before the repository copy changes,
/// so a crash between the steps still rolls back.
fn write_repo_copy(
    session: &mut SyncSession,
    candidate: &SyncCandidate,
    content: &[u8],
) -> Result<(), String> {
    let record = session
        .backups
        .backup(&candidate.repo_path, &candidate.rel_path)
        .map_err(|e| e.to_string())?;
    session.journal.record(
        format!("restore {} from backup", candidate.rel_path.display()),
        InverseAction::RestoreFile {
            backup: record.backup.clone(),
            target: record.original.clone(),
        },
    );
    fs::write(&candidate.repo_path, content)
        .map_err(|e| format!("cannot write repository copy: {e}"))?;
    Ok(())
}

/// Predictable location of the merged-with-markers inspection file.
pub fn conflict_side_file(repo_path: &Path) -> PathBuf {
    let mut name = repo_path.as_os_str().to_os_string();
    name.push(".conflict");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_side_file_is_sibling() {
        assert_eq!(
            conflict_side_file(Path::new("/repo/bashrc")),
            PathBuf::from("/repo/bashrc.conflict")
        );
        assert_eq!(
            conflict_side_file(Path::new("/repo/config/nvim/init.lua")),
            PathBuf::from("/repo/config/nvim/init.lua.conflict")
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(CandidateOutcome::Unchanged.label(), "unchanged");
        assert_eq!(CandidateOutcome::Merged.label(), "merged");
        assert_eq!(
            CandidateOutcome::Conflict {
                side_file: PathBuf::from("/x")
            }
            .label(),
            "conflict"
        );
        assert_eq!(
            CandidateOutcome::Failed {
                reason: "io".into()
            }
            .label(),
            "failed"
        );
    }
}
