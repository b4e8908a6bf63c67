//! Text/binary classification of candidate files.
//!
//! Classification drives the rest of the pass: only text files are compared
//! and merged, binary files are always skipped for content sync. The
//! primary signal is the OS content-type probe (`file --brief --mime-type`);
//! when that tool is absent the classifier falls back to a fixed table of
//! binary extension suffixes. Unknown types default to text so unrecognized
//! configuration formats still get a merge attempt instead of being
//! silently skipped.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{trace, warn};

use crate::errors::ClassifyError;
use crate::tools::{ToolRegistry, FILE_PROBE};

/// Whether a file's content is mergeable text or opaque binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Text,
    Binary,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME types under `application/` that are structured text.
const TEXT_APPLICATION_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/ecmascript",
    "application/x-sh",
    "application/x-shellscript",
    "application/xhtml+xml",
    "application/toml",
    "application/yaml",
    "application/x-yaml",
    "application/x-empty",
];

/// Extension suffixes treated as binary when no content-type probe exists.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff",
    // audio / video
    "mp3", "ogg", "flac", "wav", "mp4", "mkv", "avi", "mov", "webm",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "zst", "7z", "rar", "jar",
    // executables and compiled objects
    "exe", "dll", "so", "dylib", "a", "o", "bin", "class", "pyc", "wasm",
    // misc binary formats
    "pdf", "sqlite", "db", "dat", "woff", "woff2", "ttf", "otf", "eot",
];

/// Classify `path` as text or binary.
///
/// Fails with [`ClassifyError::NotFound`] when the path does not exist
/// (candidates can vanish between discovery and processing).
pub async fn classify(
    path: &Path,
    tools: &ToolRegistry,
) -> Result<Classification, ClassifyError> {
    if !path.exists() {
        return Err(ClassifyError::NotFound(path.to_path_buf()));
    }

    if tools.has_file_probe() {
        match probe_mime(path).await {
            Ok(mime) => {
                let class = classify_mime(&mime);
                trace!(path = %path.display(), mime, %class, "classified via content-type probe");
                return Ok(class);
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "content-type probe failed, falling back to extension table"
                );
            }
        }
    }

    Ok(classify_extension(path))
}

/// Ask the OS content-type facility for a MIME type.
async fn probe_mime(path: &Path) -> std::io::Result<String> {
    let output = Command::new(FILE_PROBE)
        .arg("--brief")
        .arg("--mime-type")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(std::io::Error::other(format!(
            "{FILE_PROBE} exited with {}: {stderr}",
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Map a MIME type to a classification.
fn classify_mime(mime: &str) -> Classification {
    if mime.starts_with("text/") {
        return Classification::Text;
    }
    // `file` reports empty files as inode/x-empty; treat them as text so a
    // freshly created config file still syncs.
    if mime == "inode/x-empty" {
        return Classification::Text;
    }
    if TEXT_APPLICATION_TYPES.contains(&mime) || mime.ends_with("+json") || mime.ends_with("+xml")
    {
        return Classification::Text;
    }
    if mime.starts_with("image/")
        || mime.starts_with("video/")
        || mime.starts_with("audio/")
        || mime.starts_with("application/")
    {
        return Classification::Binary;
    }
    Classification::Text
}

/// Fallback classification from the extension table.
fn classify_extension(path: &Path) -> Classification {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let lower = ext.to_ascii_lowercase();
            if BINARY_EXTENSIONS.contains(&lower.as_str()) {
                Classification::Binary
            } else {
                Classification::Text
            }
        }
        None => Classification::Text,
    }
}
