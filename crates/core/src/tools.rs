//! External tool discovery.
//!
//! dotsync shells out to two optional tools: GNU `diff3` for three-way
//! merges and `file` for content-type probing. Their availability is
//! resolved once at session start into a [`ToolRegistry`] with typed
//! capability checks, instead of probing binaries at each call site.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

/// The external three-way merge tool.
pub const MERGE_TOOL: &str = "diff3";

/// The external content-type probe.
pub const FILE_PROBE: &str = "file";

/// Availability of one external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Available,
    Missing,
}

/// Typed capability table for the external tools dotsync depends on.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    merge_tool: ToolStatus,
    file_probe: ToolStatus,
}

impl ToolRegistry {
    /// Probe every tool once.
    pub async fn detect() -> Self {
        let merge_tool = probe(MERGE_TOOL).await;
        let file_probe = probe(FILE_PROBE).await;
        debug!(?merge_tool, ?file_probe, "resolved external tools");
        Self {
            merge_tool,
            file_probe,
        }
    }

    /// Whether the three-way merge tool can be invoked.
    pub fn has_merge_tool(&self) -> bool {
        self.merge_tool == ToolStatus::Available
    }

    /// Whether the OS content-type probe can be invoked.
    pub fn has_file_probe(&self) -> bool {
        self.file_probe == ToolStatus::Available
    }

    /// Manual-installation remedy for a missing merge tool.
    pub fn merge_remedy() -> String {
        format!(
            "install GNU diffutils (provides `{MERGE_TOOL}`), \
             e.g. `apt install diffutils` or `brew install diffutils`"
        )
    }
}

/// Check whether `tool` exists by asking it for its version.
///
/// Any exit status counts as present; only a failure to spawn the binary at
/// all marks it missing.
async fn probe(tool: &str) -> ToolStatus {
    let result = Command::new(tool)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(_) => ToolStatus::Available,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ToolStatus::Missing,
        Err(e) => {
            warn!(tool, error = %e, "tool probe failed, treating as missing");
            ToolStatus::Missing
        }
    }
}
