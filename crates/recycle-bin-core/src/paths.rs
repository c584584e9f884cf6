//! String-level path helpers with POSIX `basename`/`dirname` semantics.
//!
//! Records keep `original_path` as text, so these operate on `&str` rather
//! than `Path` and never touch the filesystem, except [`absolute`].

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SEP: char = '/';

/// Join two path segments with exactly one separator between them.
pub fn join(a: &str, b: &str) -> String {
    if a.is_empty() {
        return b.to_string();
    }
    let head = a.trim_end_matches(SEP);
    let tail = b.trim_start_matches(SEP);
    format!("{}{}{}", head, SEP, tail)
}

/// Resolve `path` against the working directory, following symlinks.
pub fn absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    fs::canonicalize(path).map_err(|e| Error::from_io(path, e))
}

pub fn basename(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches(SEP);
    if trimmed.is_empty() {
        return SEP.to_string();
    }
    match trimmed.rfind(SEP) {
        Some(idx) => trimmed[idx + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches(SEP);
    if trimmed.is_empty() {
        return SEP.to_string();
    }
    match trimmed.rfind(SEP) {
        None => ".".to_string(),
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches(SEP);
            if parent.is_empty() {
                SEP.to_string()
            } else {
                parent.to_string()
            }
        }
    }
}

/// Extension of the basename including the leading dot, or "" when there is none.
pub fn extension(path: &str) -> String {
    let base = basename(path);
    match base.rfind('.') {
        Some(idx) => base[idx..].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_single_separator() {
        assert_eq!(join("/home/user", "file.txt"), "/home/user/file.txt");
        assert_eq!(join("/home/user/", "file.txt"), "/home/user/file.txt");
        assert_eq!(join("/home/user//", "/file.txt"), "/home/user/file.txt");
        assert_eq!(join("/", "etc"), "/etc");
        assert_eq!(join("", "file.txt"), "file.txt");
    }

    #[test]
    fn test_basename_posix_cases() {
        assert_eq!(basename("/tmp/a.txt"), "a.txt");
        assert_eq!(basename("/tmp/dir/"), "dir");
        assert_eq!(basename("a.txt"), "a.txt");
        assert_eq!(basename("/"), "/");
        assert_eq!(basename("///"), "/");
        assert_eq!(basename(""), ".");
    }

    #[test]
    fn test_dirname_posix_cases() {
        assert_eq!(dirname("/tmp/a.txt"), "/tmp");
        assert_eq!(dirname("/tmp/dir/"), "/tmp");
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("a"), ".");
        assert_eq!(dirname("a//b"), "a");
        assert_eq!(dirname("/"), "/");
        assert_eq!(dirname(""), ".");
    }

    #[test]
    fn test_extension_uses_basename_only() {
        assert_eq!(extension("/tmp/a.txt"), ".txt");
        assert_eq!(extension("/tmp/archive.tar.gz"), ".gz");
        assert_eq!(extension("/tmp/v1.2/README"), "");
        assert_eq!(extension("/home/user/.bashrc"), ".bashrc");
        assert_eq!(extension("Makefile"), "");
    }

    #[test]
    fn test_absolute_missing_is_not_found() {
        let err = absolute("/definitely/not/here/at/all").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_absolute_resolves_dot_segments() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a");
        fs::create_dir(&nested).unwrap();
        let resolved = absolute(nested.join("..").join("a")).unwrap();
        assert_eq!(resolved, fs::canonicalize(&nested).unwrap());
    }
}
