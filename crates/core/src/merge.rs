//! Three-way merge via the external `diff3` tool.
//!
//! The merge takes three file inputs — local, ancestor, repository — and
//! produces merged text on stdout with standard conflict markers. A result
//! that contains markers is not authoritative and must never overwrite the
//! repository copy. Absence of the tool is a recoverable condition with a
//! documented remedy; callers must not degrade to a blind overwrite without
//! explicit operator consent, since that silently discards repository
//! history.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::MergeError;
use crate::tools::{ToolRegistry, MERGE_TOOL};

/// Result status of a three-way merge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// No conflict markers in the merged content.
    Clean,
    /// Unresolved regions remain; human review required.
    Conflict,
}

/// The output of a three-way merge attempt.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub status: MergeStatus,
    /// Merged content; contains conflict markers when `status` is
    /// [`MergeStatus::Conflict`].
    pub content: String,
}

/// Start-of-line marker opening a conflict region.
const CONFLICT_MARKER: &str = "<<<<<<<";

/// Merge `local` and `repo` against their common `ancestor` (diff3
/// semantics): lines changed on exactly one side are taken from that side,
/// lines changed differently on both sides become a marked conflict region.
pub async fn merge(
    local: &Path,
    ancestor: &Path,
    repo: &Path,
    tools: &ToolRegistry,
) -> Result<MergeOutcome, MergeError> {
    if !tools.has_merge_tool() {
        return Err(MergeError::ToolUnavailable {
            tool: MERGE_TOOL.into(),
            remedy: ToolRegistry::merge_remedy(),
        });
    }

    let output = Command::new(MERGE_TOOL)
        .arg("-m")
        .args(["-L", "local", "-L", "ancestor", "-L", "repository"])
        .arg(local)
        .arg(ancestor)
        .arg(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MergeError::ToolUnavailable {
                    tool: MERGE_TOOL.into(),
                    remedy: ToolRegistry::merge_remedy(),
                }
            } else {
                MergeError::IoError(e)
            }
        })?;

    // diff3 -m exits 0 on a clean merge, 1 when conflicts were marked, and
    // 2 or higher on trouble.
    let exit_code = output.status.code().unwrap_or(-1);
    if exit_code != 0 && exit_code != 1 {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        warn!(exit_code, %stderr, "merge tool failed");
        return Err(MergeError::MergeFailed { exit_code, stderr });
    }

    let content = String::from_utf8_lossy(&output.stdout).to_string();
    let status = if has_conflict_markers(&content) {
        MergeStatus::Conflict
    } else {
        MergeStatus::Clean
    };
    debug!(?status, exit_code, "three-way merge completed");

    Ok(MergeOutcome { status, content })
}

/// Detect an unresolved conflict region in merged content.
///
/// Matches `<<<<<<<` only at the start of a line; a substring occurrence
/// inside ordinary content does not count.
pub fn has_conflict_markers(content: &str) -> bool {
    content.lines().any(|line| line.starts_with(CONFLICT_MARKER))
}
