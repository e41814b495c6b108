//! ignore
//!
//! Literal-match editing of a repository's `.gitignore`.
//!
//! # Design
//!
//! These helpers manage exact-match lines only — no glob evaluation. A path
//! counts as explicitly listed when some line's trimmed content equals the
//! path or the path plus a trailing `/`. The authoritative "is this path
//! ignored" answer (which does evaluate globs) lives with the git process
//! (`GitClient::check_ignore`); the registry combines both.
//!
//! A missing ignore file reads as empty and is created on first add.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the ignore file inside a repository root.
const IGNORE_FILE: &str = ".gitignore";

/// Errors from ignore-file editing.
#[derive(Debug, Error)]
pub enum IgnoreError {
    /// Failed to read the ignore file.
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// File that failed to read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Failed to write the ignore file.
    #[error("cannot write {path}: {source}")]
    WriteError {
        /// File that failed to write
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

fn ignore_path(repo_path: &Path) -> PathBuf {
    repo_path.join(IGNORE_FILE)
}

fn read_ignore(repo_path: &Path) -> Result<String, IgnoreError> {
    let path = ignore_path(repo_path);
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(&path).map_err(|e| IgnoreError::ReadError { path, source: e })
}

fn write_ignore(repo_path: &Path, contents: &str) -> Result<(), IgnoreError> {
    let path = ignore_path(repo_path);
    fs::write(&path, contents).map_err(|e| IgnoreError::WriteError { path, source: e })
}

/// Whether a line matches the path exactly (with or without trailing `/`).
fn matches(line: &str, relative: &str) -> bool {
    let trimmed = line.trim();
    trimmed == relative || (trimmed.len() == relative.len() + 1 && trimmed == format!("{relative}/"))
}

/// Whether the ignore file contains an exact-match line for the path.
///
/// Literal comparison only; glob patterns that would match the path do not
/// count.
pub fn is_explicitly_ignored(repo_path: &Path, relative: &str) -> Result<bool, IgnoreError> {
    let contents = read_ignore(repo_path)?;
    Ok(contents.lines().any(|line| matches(line, relative)))
}

/// Append the path to the ignore file.
///
/// Inserts a separating newline first when the file is non-empty and does
/// not already end in one, then writes `relative` plus a trailing newline.
pub fn add_to_ignore_list(repo_path: &Path, relative: &str) -> Result<(), IgnoreError> {
    let mut contents = read_ignore(repo_path)?;
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(relative);
    contents.push('\n');
    write_ignore(repo_path, &contents)
}

/// Rewrite the ignore file keeping every line except exact matches of the
/// path (with or without trailing `/`).
pub fn remove_from_ignore_list(repo_path: &Path, relative: &str) -> Result<(), IgnoreError> {
    let contents = read_ignore(repo_path)?;
    let kept: Vec<&str> = contents
        .lines()
        .filter(|line| !matches(line, relative))
        .collect();
    let mut rewritten = kept.join("\n");
    if !rewritten.is_empty() {
        rewritten.push('\n');
    }
    write_ignore(repo_path, &rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn lines_of(dir: &TempDir) -> HashSet<String> {
        let path = dir.path().join(IGNORE_FILE);
        if !path.exists() {
            return HashSet::new();
        }
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn missing_file_is_not_ignored() {
        let dir = TempDir::new().unwrap();
        assert!(!is_explicitly_ignored(dir.path(), "x/y").unwrap());
    }

    #[test]
    fn explicit_match_includes_trailing_slash_form() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "a\nb/\n  c  \n").unwrap();

        assert!(is_explicitly_ignored(dir.path(), "a").unwrap());
        assert!(is_explicitly_ignored(dir.path(), "b").unwrap());
        assert!(is_explicitly_ignored(dir.path(), "c").unwrap());
        assert!(!is_explicitly_ignored(dir.path(), "d").unwrap());
    }

    #[test]
    fn glob_lines_are_not_explicit_matches() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "*.md\n").unwrap();
        assert!(!is_explicitly_ignored(dir.path(), "notes.md").unwrap());
    }

    #[test]
    fn add_creates_file_with_trailing_newline() {
        let dir = TempDir::new().unwrap();
        add_to_ignore_list(dir.path(), "x/y").unwrap();
        let contents = fs::read_to_string(dir.path().join(IGNORE_FILE)).unwrap();
        assert_eq!(contents, "x/y\n");
    }

    #[test]
    fn add_inserts_separator_when_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "existing").unwrap();
        add_to_ignore_list(dir.path(), "x/y").unwrap();
        let contents = fs::read_to_string(dir.path().join(IGNORE_FILE)).unwrap();
        assert_eq!(contents, "existing\nx/y\n");
    }

    #[test]
    fn remove_keeps_unrelated_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "a\nx/y\nx/y/\nb\n").unwrap();
        remove_from_ignore_list(dir.path(), "x/y").unwrap();
        let contents = fs::read_to_string(dir.path().join(IGNORE_FILE)).unwrap();
        assert_eq!(contents, "a\nb\n");
    }

    #[test]
    fn add_remove_round_trip_preserves_line_set() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "keep-a\nkeep-b/\n").unwrap();
        let before = lines_of(&dir);

        add_to_ignore_list(dir.path(), "x/y").unwrap();
        assert!(is_explicitly_ignored(dir.path(), "x/y").unwrap());
        remove_from_ignore_list(dir.path(), "x/y").unwrap();

        assert_eq!(lines_of(&dir), before);
    }
}
