//! git::process
//!
//! Real [`GitClient`] implementation shelling out to the git binary.
//!
//! # Design
//!
//! Every operation spawns one short-lived `git -C <dir> ...` process via
//! tokio and interprets its output. The binary location is configurable
//! (vault settings may point at a non-PATH install); the default is `git`
//! resolved from `PATH`.
//!
//! stderr from a failing process is preserved verbatim in
//! [`GitError::CommandFailed`] so user-initiated operations can surface the
//! underlying message intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::client::{GitClient, LogEntry, Remote};
use super::status::RawStatus;
use super::GitError;

/// Field separator in the custom `git log` pretty format.
const LOG_FIELD_SEP: char = '\u{1f}';

/// Git client backed by the external git executable.
pub struct CommandGitClient {
    /// Binary name or absolute path.
    binary: PathBuf,
}

impl CommandGitClient {
    /// Client using `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("git"),
        }
    }

    /// Client using an explicit binary location.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run git inside `dir` and return trimmed stdout on success.
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = self.raw_output(Some(dir), args).await?;
        Self::require_success(args, output).map(|stdout| stdout.trim().to_string())
    }

    /// Run git without a working directory (bootstrap operations).
    async fn run_bare(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.raw_output(None, args).await?;
        Self::require_success(args, output).map(|stdout| stdout.trim().to_string())
    }

    async fn raw_output(
        &self,
        dir: Option<&Path>,
        args: &[&str],
    ) -> Result<std::process::Output, GitError> {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args);

        trace!(binary = %self.binary.display(), ?args, "running git");

        cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                warn!(binary = %self.binary.display(), "git binary not found");
                GitError::BinaryNotFound {
                    binary: self.binary.display().to_string(),
                }
            } else {
                GitError::Io(e)
            }
        })
    }

    fn require_success(args: &[&str], output: std::process::Output) -> Result<String, GitError> {
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(GitError::CommandFailed {
                args: args.iter().map(|s| s.to_string()).collect(),
                stderr,
            })
        }
    }
}

impl Default for CommandGitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitClient for CommandGitClient {
    async fn is_repository(&self, path: &Path) -> bool {
        self.run(path, &["rev-parse", "--is-inside-work-tree"])
            .await
            .map(|out| out == "true")
            .unwrap_or(false)
    }

    async fn init(&self, path: &Path) -> Result<(), GitError> {
        tokio::fs::create_dir_all(path).await?;
        self.run(path, &["init"]).await?;
        debug!(path = %path.display(), "initialized repository");
        Ok(())
    }

    async fn clone_repo(&self, url: &str, path: &Path) -> Result<(), GitError> {
        let target = path.display().to_string();
        self.run_bare(&["clone", url, &target]).await?;
        debug!(path = %target, "cloned repository");
        Ok(())
    }

    async fn status(&self, path: &Path) -> Result<RawStatus, GitError> {
        let output = self
            .run(path, &["status", "--porcelain=v1", "--branch"])
            .await?;
        Ok(RawStatus::parse_porcelain(&output))
    }

    async fn stage(&self, path: &Path, files: &[String]) -> Result<(), GitError> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend(files.iter().map(String::as_str));
        self.run(path, &args).await?;
        Ok(())
    }

    async fn stage_all(&self, path: &Path) -> Result<(), GitError> {
        self.run(path, &["add", "-A"]).await?;
        debug!(path = %path.display(), "staged all changes");
        Ok(())
    }

    async fn unstage(&self, path: &Path, files: &[String]) -> Result<(), GitError> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["reset", "--"];
        args.extend(files.iter().map(String::as_str));
        self.run(path, &args).await?;
        Ok(())
    }

    async fn unstage_all(&self, path: &Path) -> Result<(), GitError> {
        self.run(path, &["reset"]).await?;
        Ok(())
    }

    async fn discard(&self, path: &Path, files: &[String]) -> Result<(), GitError> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["checkout", "HEAD", "--"];
        args.extend(files.iter().map(String::as_str));
        self.run(path, &args).await?;
        debug!(path = %path.display(), count = files.len(), "discarded working-tree edits");
        Ok(())
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<String, GitError> {
        let args = ["commit", "-m", message];
        let output = self.raw_output(Some(path), &args).await?;

        if !output.status.success() {
            // Empty commits exit 1 with the explanation on stdout.
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stdout.contains("nothing to commit")
                || stdout.contains("nothing added to commit")
                || stderr.contains("nothing to commit")
            {
                return Err(GitError::NothingToCommit);
            }
            return Err(GitError::CommandFailed {
                args: args.iter().map(|s| s.to_string()).collect(),
                stderr: stderr.trim().to_string(),
            });
        }

        let sha = self.run(path, &["rev-parse", "HEAD"]).await?;
        debug!(path = %path.display(), sha = %sha, "created commit");
        Ok(sha)
    }

    async fn diff_file(&self, path: &Path, file: &str, staged: bool) -> Result<String, GitError> {
        let args: Vec<&str> = if staged {
            vec!["diff", "--cached", "--", file]
        } else {
            vec!["diff", "--", file]
        };
        self.run(path, &args).await
    }

    async fn log(&self, path: &Path, limit: usize) -> Result<Vec<LogEntry>, GitError> {
        let count = limit.to_string();
        let output = self
            .run(
                path,
                &[
                    "log",
                    "--max-count",
                    &count,
                    "--name-only",
                    "--pretty=format:%H\u{1f}%an\u{1f}%aI\u{1f}%s",
                ],
            )
            .await?;
        parse_log(&output)
    }

    async fn current_branch(&self, path: &Path) -> Result<String, GitError> {
        self.run(path, &["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    async fn branches(&self, path: &Path) -> Result<Vec<String>, GitError> {
        let output = self
            .run(path, &["branch", "--list", "--format=%(refname:short)"])
            .await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn checkout(&self, path: &Path, branch: &str) -> Result<(), GitError> {
        self.run(path, &["checkout", branch]).await?;
        debug!(path = %path.display(), branch, "checked out branch");
        Ok(())
    }

    async fn remotes(&self, path: &Path) -> Result<Vec<Remote>, GitError> {
        let output = self.run(path, &["remote", "-v"]).await?;
        let mut remotes = Vec::new();
        for line in output.lines() {
            // Layout: "name\turl (fetch|push)" — keep fetch entries only.
            let mut parts = line.split_whitespace();
            let (Some(name), Some(url), Some(kind)) =
                (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            if kind == "(fetch)" {
                remotes.push(Remote {
                    name: name.to_string(),
                    url: url.to_string(),
                });
            }
        }
        Ok(remotes)
    }

    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), GitError> {
        self.run(path, &["remote", "add", name, url]).await?;
        debug!(path = %path.display(), name, "added remote");
        Ok(())
    }

    async fn has_upstream(&self, path: &Path) -> bool {
        self.run(
            path,
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
        )
        .await
        .is_ok()
    }

    async fn push(
        &self,
        path: &Path,
        remote: &str,
        branch: &str,
        set_upstream: bool,
    ) -> Result<(), GitError> {
        if set_upstream {
            self.run(path, &["push", "--set-upstream", remote, branch])
                .await?;
        } else {
            self.run(path, &["push"]).await?;
        }
        debug!(path = %path.display(), remote, branch, set_upstream, "pushed");
        Ok(())
    }

    async fn pull(&self, path: &Path) -> Result<(), GitError> {
        self.run(path, &["pull"]).await?;
        debug!(path = %path.display(), "pulled");
        Ok(())
    }

    async fn check_ignore(&self, path: &Path, file: &str) -> bool {
        self.run(path, &["check-ignore", "-q", "--", file])
            .await
            .is_ok()
    }

    async fn set_local_config(
        &self,
        path: &Path,
        key: &str,
        value: &str,
    ) -> Result<(), GitError> {
        self.run(path, &["config", "--local", key, value]).await?;
        Ok(())
    }
}

/// Parse `git log` output in the custom field-separated pretty format.
///
/// Header lines carry the field separator; the non-empty lines that follow
/// a header (until the next header) are the files touched by that commit.
fn parse_log(output: &str) -> Result<Vec<LogEntry>, GitError> {
    let mut entries: Vec<LogEntry> = Vec::new();

    for line in output.lines() {
        if line.contains(LOG_FIELD_SEP) {
            let mut fields = line.split(LOG_FIELD_SEP);
            let (Some(hash), Some(author), Some(date), Some(subject)) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(GitError::UnexpectedOutput(format!(
                    "malformed log header: {line}"
                )));
            };
            let date = chrono::DateTime::parse_from_rfc3339(date).map_err(|e| {
                GitError::UnexpectedOutput(format!("unparseable commit date '{date}': {e}"))
            })?;
            entries.push(LogEntry {
                full_hash: hash.to_string(),
                short_hash: hash.chars().take(7).collect(),
                message: subject.to_string(),
                author_name: author.to_string(),
                date,
                changed_files: Vec::new(),
            });
        } else if !line.trim().is_empty() {
            if let Some(entry) = entries.last_mut() {
                entry.changed_files.push(line.trim().to_string());
            }
        }
    }

    Ok(entries)
}
