//! core::paths
//!
//! Centralized path routing between vault-relative folder identifiers and
//! absolute filesystem locations.
//!
//! # Architecture
//!
//! A vault is one directory tree that contains an arbitrary number of git
//! working directories as subtrees. Every repository is identified by its
//! `folder_id`: the vault-relative path of its root folder, with `""`
//! denoting the vault root itself.
//!
//! **Hard rule:** no code outside this module may join the vault base path
//! with a folder id by hand. All resolution goes through [`VaultPaths`] so
//! the root sentinel is handled in exactly one place.
//!
//! # Ownership
//!
//! [`VaultPaths::owner_of`] answers "which registered repository owns this
//! file" by longest-prefix match over folder ids: the most deeply nested
//! repository wins, and a repository registered at the vault root (`""`)
//! is the fallback for everything.
//!
//! # Example
//!
//! ```
//! use gitvault::core::paths::VaultPaths;
//! use std::path::PathBuf;
//!
//! let paths = VaultPaths::new(PathBuf::from("/vault"));
//!
//! assert_eq!(paths.resolve_absolute(""), PathBuf::from("/vault"));
//! assert_eq!(paths.resolve_absolute("work/notes"), PathBuf::from("/vault/work/notes"));
//!
//! let ids = ["", "a", "a/b"];
//! assert_eq!(VaultPaths::owner_of(ids.iter().copied(), "a/b/c.md"), Some("a/b"));
//! assert_eq!(VaultPaths::owner_of(ids.iter().copied(), "z.md"), Some(""));
//! ```

use std::path::{Path, PathBuf};

/// Path routing for one vault.
///
/// # Invariants
///
/// - `resolve_absolute("")` and `resolve_absolute("/")` both yield the base
///   path unchanged (root sentinel).
/// - Folder ids are stored and compared as vault-relative, `/`-separated
///   strings regardless of host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    /// Absolute path of the vault root.
    base: PathBuf,
}

impl VaultPaths {
    /// Create path routing rooted at the given vault base path.
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// The vault root directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Map a folder id to the absolute path of that repository's root.
    ///
    /// The empty string and `"/"` are root sentinels that map to the vault
    /// base itself.
    pub fn resolve_absolute(&self, folder_id: &str) -> PathBuf {
        if folder_id.is_empty() || folder_id == "/" {
            self.base.clone()
        } else {
            self.base.join(folder_id)
        }
    }

    /// Find the folder id that owns a vault-relative file path.
    ///
    /// A candidate owns the file when the file path equals the folder id,
    /// when the folder id is the vault root (`""`), or when the file path
    /// starts with `folder_id + "/"`. Among all candidates the longest
    /// folder id wins, so nested repositories shadow their ancestors.
    ///
    /// Returns `None` when no registered folder id matches (possible only
    /// when no root repository is registered).
    pub fn owner_of<'a, I>(folder_ids: I, file_path: &str) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<&'a str> = None;
        for id in folder_ids {
            if !Self::owns(id, file_path) {
                continue;
            }
            match best {
                Some(current) if current.len() >= id.len() => {}
                _ => best = Some(id),
            }
        }
        best
    }

    /// Whether a single folder id contains the given vault-relative path.
    fn owns(folder_id: &str, file_path: &str) -> bool {
        folder_id.is_empty()
            || file_path == folder_id
            || file_path
                .strip_prefix(folder_id)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Join a folder id and a repository-relative path into a vault path.
    ///
    /// The root repository contributes no prefix: `vault_path("", "a.md")`
    /// is `"a.md"`, while `vault_path("notes", "a.md")` is `"notes/a.md"`.
    pub fn vault_path(folder_id: &str, relative: &str) -> String {
        if folder_id.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", folder_id, relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_root_sentinels() {
        let paths = VaultPaths::new(PathBuf::from("/vault"));
        assert_eq!(paths.resolve_absolute(""), PathBuf::from("/vault"));
        assert_eq!(paths.resolve_absolute("/"), PathBuf::from("/vault"));
    }

    #[test]
    fn resolve_nested_folder() {
        let paths = VaultPaths::new(PathBuf::from("/vault"));
        assert_eq!(
            paths.resolve_absolute("work/notes"),
            PathBuf::from("/vault/work/notes")
        );
    }

    #[test]
    fn owner_longest_prefix_wins() {
        let ids = ["", "a", "a/b"];
        assert_eq!(
            VaultPaths::owner_of(ids.iter().copied(), "a/b/c.md"),
            Some("a/b")
        );
        assert_eq!(
            VaultPaths::owner_of(ids.iter().copied(), "a/x.md"),
            Some("a")
        );
        assert_eq!(VaultPaths::owner_of(ids.iter().copied(), "z.md"), Some(""));
    }

    #[test]
    fn owner_exact_match() {
        let ids = ["notes"];
        assert_eq!(
            VaultPaths::owner_of(ids.iter().copied(), "notes"),
            Some("notes")
        );
    }

    #[test]
    fn owner_requires_path_boundary() {
        // "notes-archive/x.md" is not inside "notes".
        let ids = ["notes"];
        assert_eq!(
            VaultPaths::owner_of(ids.iter().copied(), "notes-archive/x.md"),
            None
        );
    }

    #[test]
    fn owner_none_without_root_repo() {
        let ids = ["a", "b"];
        assert_eq!(VaultPaths::owner_of(ids.iter().copied(), "z.md"), None);
    }

    #[test]
    fn vault_path_joins() {
        assert_eq!(VaultPaths::vault_path("", "a.md"), "a.md");
        assert_eq!(VaultPaths::vault_path("notes", "a.md"), "notes/a.md");
    }
}
