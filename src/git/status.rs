//! git::status
//!
//! Porcelain status parsing and the status translation algorithm.
//!
//! # Design
//!
//! The raw model ([`RawStatus`]) mirrors `git status --porcelain=v1 --branch`
//! output: a branch header with ahead/behind counters plus one record per
//! path carrying the index-column and working-tree-column codes. The
//! translated model ([`RepoStatus`]) is the stable, UI-agnostic contract:
//! four disjoint classification buckets plus the counters.
//!
//! # Translation precedence
//!
//! Per record, in order:
//! 1. both codes `?` → **untracked**
//! 2. either code `U` → **conflicted**
//! 3. otherwise a **staged** entry for a non-space index code and,
//!    independently, a **changed** entry for a non-space working-tree code
//!    — one path can legitimately land in both buckets.
//!
//! The code→display mapping is exact (`M`/`A`/`D`/`R`/`?`/`U`, anything else
//! defaults to Modified); the presentation layer depends on it.

use serde::Serialize;

use crate::core::paths::VaultPaths;

/// Display classification for one file, derived from a raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayStatus {
    /// Content differs from the comparison side.
    Modified,
    /// Newly added to the index.
    Added,
    /// Deleted.
    Deleted,
    /// Renamed (porcelain `R`, path is the rename target).
    Renamed,
    /// Not tracked at all.
    Untracked,
    /// Merge conflict.
    Unmerged,
}

impl DisplayStatus {
    /// Map a single porcelain status code to its display classification.
    ///
    /// Unknown codes (e.g. `C`, `T`) default to `Modified`.
    pub fn from_code(code: char) -> Self {
        match code {
            'M' => Self::Modified,
            'A' => Self::Added,
            'D' => Self::Deleted,
            'R' => Self::Renamed,
            '?' => Self::Untracked,
            'U' => Self::Unmerged,
            _ => Self::Modified,
        }
    }
}

/// One raw porcelain record: two status columns and a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatusEntry {
    /// Index (staging area) column code; space = no change.
    pub index: char,
    /// Working-tree column code; space = no change.
    pub worktree: char,
    /// Repository-relative path (rename target for `R` records).
    pub path: String,
}

/// Raw repository status as reported by the git process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStatus {
    /// Current branch name, if HEAD is on a branch.
    pub branch: Option<String>,
    /// Commits ahead of the upstream tracking branch.
    pub ahead: usize,
    /// Commits behind the upstream tracking branch.
    pub behind: usize,
    /// Per-path records in porcelain order.
    pub entries: Vec<RawStatusEntry>,
}

impl RawStatus {
    /// Parse `git status --porcelain=v1 --branch` output.
    ///
    /// Tolerant of missing headers and short lines; records that cannot be
    /// interpreted are skipped rather than failing the whole status call.
    pub fn parse_porcelain(output: &str) -> Self {
        let mut status = Self::default();

        for line in output.lines() {
            if let Some(header) = line.strip_prefix("## ") {
                parse_branch_header(header, &mut status);
                continue;
            }
            // Record layout: XY<space>path
            let mut chars = line.chars();
            let (Some(index), Some(worktree), Some(' ')) =
                (chars.next(), chars.next(), chars.next())
            else {
                continue;
            };
            let rest: String = chars.collect();
            if rest.is_empty() {
                continue;
            }
            // Renames carry "old -> new"; the target is the live path.
            let path = match rest.split_once(" -> ") {
                Some((_, target)) => target.to_string(),
                None => rest,
            };
            status.entries.push(RawStatusEntry {
                index,
                worktree,
                path: unquote(&path),
            });
        }

        status
    }
}

/// Parse the `## branch...upstream [ahead N, behind M]` header line.
fn parse_branch_header(header: &str, status: &mut RawStatus) {
    // "No commits yet on main" / "HEAD (no branch)" carry no usable branch.
    if header.starts_with("No commits yet on ") {
        status.branch = Some(header["No commits yet on ".len()..].to_string());
        return;
    }
    if header.starts_with("HEAD ") {
        return;
    }

    let (name_part, counters) = match header.split_once(" [") {
        Some((name, rest)) => (name, rest.trim_end_matches(']')),
        None => (header, ""),
    };
    let branch = match name_part.split_once("...") {
        Some((local, _upstream)) => local,
        None => name_part,
    };
    status.branch = Some(branch.to_string());

    for part in counters.split(',') {
        let part = part.trim();
        if let Some(n) = part.strip_prefix("ahead ") {
            status.ahead = n.parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            status.behind = n.parse().unwrap_or(0);
        }
    }
}

/// Strip porcelain quoting from paths containing special characters.
fn unquote(path: &str) -> String {
    if path.len() >= 2 && path.starts_with('"') && path.ends_with('"') {
        path[1..path.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        path.to_string()
    }
}

/// One classified file entry in the staged or changed bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatusEntry {
    /// Path relative to the repository root.
    pub relative_path: String,
    /// Path relative to the vault root (`folder_id + "/" + relative_path`).
    pub vault_path: String,
    /// Raw index-column code.
    pub index_code: char,
    /// Raw working-tree-column code.
    pub working_tree_code: char,
    /// Display classification for this bucket.
    pub display_status: DisplayStatus,
}

/// Normalized per-repository status snapshot.
///
/// Recomputed on demand; the registry never caches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoStatus {
    /// Folder id of the repository this snapshot describes.
    pub folder_id: String,
    /// Current branch name, if HEAD is on a branch.
    pub current_branch: Option<String>,
    /// Entries with index (staged) changes.
    pub staged: Vec<FileStatusEntry>,
    /// Entries with working-tree changes.
    pub changed: Vec<FileStatusEntry>,
    /// Vault paths of untracked files.
    pub untracked: Vec<String>,
    /// Vault paths of conflicted files.
    pub conflicted: Vec<String>,
    /// Commits ahead of upstream.
    pub ahead: usize,
    /// Commits behind upstream.
    pub behind: usize,
}

impl RepoStatus {
    /// Whether any work exists that an auto-commit cycle could capture.
    pub fn has_pending_work(&self) -> bool {
        !self.staged.is_empty()
            || !self.changed.is_empty()
            || !self.untracked.is_empty()
            || !self.conflicted.is_empty()
    }
}

/// Run the status translation algorithm over a raw snapshot.
///
/// Deterministic: the same raw input always yields the same buckets, in
/// input order. See the module docs for the precedence rules.
pub fn translate(folder_id: &str, raw: &RawStatus) -> RepoStatus {
    let mut status = RepoStatus {
        folder_id: folder_id.to_string(),
        current_branch: raw.branch.clone(),
        ahead: raw.ahead,
        behind: raw.behind,
        ..RepoStatus::default()
    };

    for entry in &raw.entries {
        let vault_path = VaultPaths::vault_path(folder_id, &entry.path);

        if entry.index == '?' && entry.worktree == '?' {
            status.untracked.push(vault_path);
            continue;
        }
        if entry.index == 'U' || entry.worktree == 'U' {
            status.conflicted.push(vault_path);
            continue;
        }

        if entry.index != ' ' && entry.index != '?' {
            status.staged.push(FileStatusEntry {
                relative_path: entry.path.clone(),
                vault_path: vault_path.clone(),
                index_code: entry.index,
                working_tree_code: entry.worktree,
                display_status: DisplayStatus::from_code(entry.index),
            });
        }
        if entry.worktree != ' ' && entry.worktree != '?' {
            status.changed.push(FileStatusEntry {
                relative_path: entry.path.clone(),
                vault_path,
                index_code: entry.index,
                working_tree_code: entry.worktree,
                display_status: DisplayStatus::from_code(entry.worktree),
            });
        }
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(index: char, worktree: char, path: &str) -> RawStatusEntry {
        RawStatusEntry {
            index,
            worktree,
            path: path.to_string(),
        }
    }

    #[test]
    fn code_mapping_is_exact() {
        assert_eq!(DisplayStatus::from_code('M'), DisplayStatus::Modified);
        assert_eq!(DisplayStatus::from_code('A'), DisplayStatus::Added);
        assert_eq!(DisplayStatus::from_code('D'), DisplayStatus::Deleted);
        assert_eq!(DisplayStatus::from_code('R'), DisplayStatus::Renamed);
        assert_eq!(DisplayStatus::from_code('?'), DisplayStatus::Untracked);
        assert_eq!(DisplayStatus::from_code('U'), DisplayStatus::Unmerged);
        // Unknown codes fall back to Modified.
        assert_eq!(DisplayStatus::from_code('C'), DisplayStatus::Modified);
        assert_eq!(DisplayStatus::from_code('T'), DisplayStatus::Modified);
    }

    #[test]
    fn untracked_checked_before_everything() {
        let raw = RawStatus {
            entries: vec![entry('?', '?', "new.md")],
            ..RawStatus::default()
        };
        let status = translate("notes", &raw);
        assert_eq!(status.untracked, vec!["notes/new.md"]);
        assert!(status.staged.is_empty());
        assert!(status.changed.is_empty());
        assert!(status.conflicted.is_empty());
    }

    #[test]
    fn conflict_checked_before_staged_and_changed() {
        let raw = RawStatus {
            entries: vec![entry('U', 'U', "war.md"), entry('A', 'U', "peace.md")],
            ..RawStatus::default()
        };
        let status = translate("", &raw);
        assert_eq!(status.conflicted, vec!["war.md", "peace.md"]);
        assert!(status.staged.is_empty());
        assert!(status.changed.is_empty());
    }

    #[test]
    fn one_path_can_be_staged_and_changed() {
        // Staged modification plus a further working-tree edit.
        let raw = RawStatus {
            entries: vec![entry('M', 'M', "a.md")],
            ..RawStatus::default()
        };
        let status = translate("notes", &raw);
        assert_eq!(status.staged.len(), 1);
        assert_eq!(status.changed.len(), 1);
        assert_eq!(status.staged[0].vault_path, "notes/a.md");
        assert_eq!(status.staged[0].display_status, DisplayStatus::Modified);
        assert_eq!(status.changed[0].display_status, DisplayStatus::Modified);
    }

    #[test]
    fn space_columns_emit_nothing() {
        let raw = RawStatus {
            entries: vec![entry('M', ' ', "staged.md"), entry(' ', 'D', "gone.md")],
            ..RawStatus::default()
        };
        let status = translate("", &raw);
        assert_eq!(status.staged.len(), 1);
        assert_eq!(status.staged[0].relative_path, "staged.md");
        assert_eq!(status.changed.len(), 1);
        assert_eq!(status.changed[0].display_status, DisplayStatus::Deleted);
    }

    #[test]
    fn root_repo_vault_paths_have_no_prefix() {
        let raw = RawStatus {
            entries: vec![entry('?', '?', "todo.md")],
            ..RawStatus::default()
        };
        let status = translate("", &raw);
        assert_eq!(status.untracked, vec!["todo.md"]);
    }

    #[test]
    fn parse_branch_header_with_counters() {
        let raw = RawStatus::parse_porcelain("## main...origin/main [ahead 2, behind 1]\n");
        assert_eq!(raw.branch.as_deref(), Some("main"));
        assert_eq!(raw.ahead, 2);
        assert_eq!(raw.behind, 1);
    }

    #[test]
    fn parse_branch_header_without_upstream() {
        let raw = RawStatus::parse_porcelain("## main\n M a.md\n");
        assert_eq!(raw.branch.as_deref(), Some("main"));
        assert_eq!(raw.ahead, 0);
        assert_eq!(raw.entries.len(), 1);
        assert_eq!(raw.entries[0].index, ' ');
        assert_eq!(raw.entries[0].worktree, 'M');
    }

    #[test]
    fn parse_no_commits_yet_header() {
        let raw = RawStatus::parse_porcelain("## No commits yet on main\n?? a.md\n");
        assert_eq!(raw.branch.as_deref(), Some("main"));
        assert_eq!(raw.entries.len(), 1);
    }

    #[test]
    fn parse_detached_head_has_no_branch() {
        let raw = RawStatus::parse_porcelain("## HEAD (no branch)\n");
        assert_eq!(raw.branch, None);
    }

    #[test]
    fn parse_rename_record_keeps_target() {
        let raw = RawStatus::parse_porcelain("R  old.md -> new.md\n");
        assert_eq!(raw.entries.len(), 1);
        assert_eq!(raw.entries[0].index, 'R');
        assert_eq!(raw.entries[0].path, "new.md");
    }

    #[test]
    fn parse_quoted_path() {
        let raw = RawStatus::parse_porcelain("?? \"with space.md\"\n");
        assert_eq!(raw.entries[0].path, "with space.md");
    }

    #[test]
    fn has_pending_work() {
        let mut status = RepoStatus::default();
        assert!(!status.has_pending_work());
        status.untracked.push("a.md".into());
        assert!(status.has_pending_work());
    }

    proptest! {
        // Translation is deterministic and buckets stay disjoint per record:
        // any single record lands in untracked or conflicted exclusively, or
        // contributes at most one staged and one changed entry.
        #[test]
        fn prop_translate_deterministic_and_bounded(
            codes in proptest::collection::vec(
                (prop_oneof![Just(' '), Just('M'), Just('A'), Just('D'), Just('R'), Just('?'), Just('U')],
                 prop_oneof![Just(' '), Just('M'), Just('A'), Just('D'), Just('R'), Just('?'), Just('U')]),
                0..20,
            )
        ) {
            let raw = RawStatus {
                entries: codes
                    .iter()
                    .enumerate()
                    .map(|(i, (x, y))| RawStatusEntry {
                        index: *x,
                        worktree: *y,
                        path: format!("f{}.md", i),
                    })
                    .collect(),
                ..RawStatus::default()
            };

            let first = translate("notes", &raw);
            let second = translate("notes", &raw);
            prop_assert_eq!(&first, &second);

            let classified = first.staged.len().max(first.changed.len())
                + first.untracked.len()
                + first.conflicted.len();
            prop_assert!(classified <= raw.entries.len());
        }
    }
}
