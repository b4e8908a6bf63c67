//! Byte-exact comparison and unified-diff rendering.
//!
//! Equality is checked on raw bytes, never line-by-line, so trailing
//! whitespace or encoding differences are not silently ignored. The diff
//! renderer exists for display only and must never fail the sync: any
//! internal error yields an empty string.

use std::fs;
use std::path::Path;

use similar::TextDiff;

/// Relationship between local and repository content at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonResult {
    Identical,
    Diverged,
}

/// Byte-exact equality between two files.
pub fn equal(a: &Path, b: &Path) -> std::io::Result<bool> {
    // Size check first so large diverged files are never read twice.
    let meta_a = fs::metadata(a)?;
    let meta_b = fs::metadata(b)?;
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

/// Compare two files and report their relationship.
pub fn compare(a: &Path, b: &Path) -> std::io::Result<ComparisonResult> {
    if equal(a, b)? {
        Ok(ComparisonResult::Identical)
    } else {
        Ok(ComparisonResult::Diverged)
    }
}

/// Render a unified diff between two files with the supplied labels.
///
/// Display-only: has no effect on control flow, and on any internal error
/// returns an empty string instead of propagating.
pub fn unified_diff(a: &Path, b: &Path, label_a: &str, label_b: &str) -> String {
    let (content_a, content_b) = match (fs::read(a), fs::read(b)) {
        (Ok(ca), Ok(cb)) => (ca, cb),
        _ => return String::new(),
    };
    let text_a = String::from_utf8_lossy(&content_a);
    let text_b = String::from_utf8_lossy(&content_b);

    TextDiff::from_lines(text_a.as_ref(), text_b.as_ref())
        .unified_diff()
        .context_radius(3)
        .header(label_a, label_b)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_equal_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a", "hello\nworld\n");
        let b = write(dir.path(), "b", "hello\nworld\n");
        assert!(equal(&a, &b).unwrap());
        assert_eq!(compare(&a, &b).unwrap(), ComparisonResult::Identical);
    }

    #[test]
    fn test_trailing_whitespace_diverges() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a", "hello\n");
        let b = write(dir.path(), "b", "hello \n");
        assert!(!equal(&a, &b).unwrap());
        assert_eq!(compare(&a, &b).unwrap(), ComparisonResult::Diverged);
    }

    #[test]
    fn test_equal_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a", "x");
        assert!(equal(&a, &dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_unified_diff_labels_and_hunks() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a", "one\ntwo\nthree\n");
        let b = write(dir.path(), "b", "one\nTWO\nthree\n");

        let diff = unified_diff(&a, &b, "repository", "local");
        assert!(diff.contains("--- repository"));
        assert!(diff.contains("+++ local"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+TWO"));
    }

    #[test]
    fn test_unified_diff_never_fails() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a", "x");
        let diff = unified_diff(&a, &dir.path().join("missing"), "a", "b");
        assert_eq!(diff, "");
    }
}
