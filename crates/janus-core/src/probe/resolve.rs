//! Resolution primitives for the path prober.
//!
//! Three views of a path are compared:
//! - [`portable_resolve`] makes the path absolute without touching symlinks.
//! - [`portable_realpath`] follows symlinks and strips Windows
//!   extended-length prefixes (via dunce), matching what portable tooling
//!   reports.
//! - [`native_realpath`] is the raw platform call, which on Windows may
//!   return a `\\?\`-prefixed path.
//!
//! Disagreement between the two real forms is itself a diagnostic signal: a
//! bundler mixing them will hand out two module ids for one file.

use std::io;
use std::path::{Path, PathBuf};

/// Windows extended-length path prefix as it appears in strings.
pub const EXTENDED_LENGTH_PREFIX: &str = r"\\?\";

/// Absolute form of `path`, symlinks untouched.
pub fn portable_resolve(path: &Path) -> io::Result<PathBuf> {
    std::path::absolute(path)
}

/// Canonical form of `path` via the portable call.
pub fn portable_realpath(path: &Path) -> io::Result<PathBuf> {
    dunce::canonicalize(path)
}

/// Canonical form of `path` via the platform-native call.
pub fn native_realpath(path: &Path) -> io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Whether `path` itself is a symbolic link (the link is not followed).
pub fn is_symlink(path: &Path) -> io::Result<bool> {
    std::fs::symlink_metadata(path).map(|meta| meta.file_type().is_symlink())
}

/// First three characters of a path string: drive letter, colon and
/// separator on Windows. Used for the prefix-mismatch heuristic.
#[must_use]
pub fn drive_prefix(path: &str) -> &str {
    let end = path.char_indices().nth(3).map_or(path.len(), |(i, _)| i);
    &path[..end]
}

/// Whether a path string carries the `\\?\` extended-length prefix.
#[must_use]
pub fn has_extended_length_prefix(path: &str) -> bool {
    path.starts_with(EXTENDED_LENGTH_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_drive_prefix_short_and_long() {
        assert_eq!(drive_prefix(""), "");
        assert_eq!(drive_prefix("C:"), "C:");
        assert_eq!(drive_prefix(r"C:\work"), r"C:\");
        assert_eq!(drive_prefix("/root/crate"), "/ro");
    }

    #[test]
    fn test_extended_length_prefix_detection() {
        assert!(has_extended_length_prefix(r"\\?\C:\work"));
        assert!(!has_extended_length_prefix(r"C:\work"));
        assert!(!has_extended_length_prefix("/root"));
    }

    #[test]
    fn test_is_symlink_false_for_regular_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(!is_symlink(&file).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_is_symlink_true_for_link() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        let link = dir.path().join("link.txt");
        std::fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();
        assert!(is_symlink(&link).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_portable_and_native_realpath_agree_on_unix() {
        let dir = tempdir().unwrap();
        let portable = portable_realpath(dir.path()).unwrap();
        let native = native_realpath(dir.path()).unwrap();
        assert_eq!(portable, native);
    }

    #[test]
    fn test_realpath_of_missing_path_fails() {
        let dir = tempdir().unwrap();
        assert!(portable_realpath(&dir.path().join("nope")).is_err());
        assert!(native_realpath(&dir.path().join("nope")).is_err());
    }
}
