//! scheduler
//!
//! Unattended commit/push cycles, one recurring timer per repository.
//!
//! # Design
//!
//! The firing logic is a pure function, [`decide`]: given a status
//! snapshot, the repository configuration and the current time it yields a
//! [`CycleAction`] — skip, commit, or commit-and-push. The timer task is a
//! thin driver around it, so the interesting behavior is unit-testable
//! without real timers or a real clock.
//!
//! # Failure isolation
//!
//! Every error inside a cycle is caught and logged by the task loop; a
//! transient push failure never disables subsequent firings. Nothing from
//! a background cycle ever propagates to a foreground caller.
//!
//! # Cancellation
//!
//! [`SchedulerHandle::stop`] signals shutdown and aborts the task. The
//! registry stops a repository's handle before discarding the instance, so
//! a fired timer can never reference an unregistered folder id; registry
//! teardown stops every handle unconditionally.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::core::config::RepoConfig;
use crate::credentials::CredentialSetup;
use crate::git::RepoStatus;
use crate::registry::{RegistryError, RepoInstance};

/// Substitution token in commit message templates.
const DATE_TOKEN: &str = "{{date}}";

/// What one auto-commit firing should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleAction {
    /// Nothing pending; no commit, no push.
    Skip,
    /// Stage everything and commit with the given message.
    Commit {
        /// Rendered commit message.
        message: String,
    },
    /// Stage, commit, then push.
    CommitAndPush {
        /// Rendered commit message.
        message: String,
    },
}

/// What one cycle actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No pending work; nothing happened.
    Skipped,
    /// A commit was created.
    Committed,
    /// A commit was created and pushed.
    Pushed,
}

/// Render a commit message template at a given instant.
///
/// `{{date}}` expands to ISO-8601 with milliseconds in UTC, e.g.
/// `2024-01-01T00:00:00.000Z`.
pub fn render_commit_message(template: &str, now: DateTime<Utc>) -> String {
    template.replace(DATE_TOKEN, &now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Decide what an auto-commit firing should do.
///
/// Pure: same inputs, same action. Skips when the status shows no pending
/// work of any kind (no empty commits); otherwise commits, and pushes too
/// when `auto_push` is set.
pub fn decide(status: &RepoStatus, config: &RepoConfig, now: DateTime<Utc>) -> CycleAction {
    if !status.has_pending_work() {
        return CycleAction::Skip;
    }
    let message = render_commit_message(&config.commit_message_template, now);
    if config.auto_push {
        CycleAction::CommitAndPush { message }
    } else {
        CycleAction::Commit { message }
    }
}

/// Run one complete auto-commit cycle against an instance.
///
/// Holds the instance's operation lock for the whole stage → commit →
/// push sequence so a manual operation can never interleave with it.
pub async fn run_cycle(
    instance: &RepoInstance,
    credentials: &CredentialSetup,
) -> Result<CycleOutcome, RegistryError> {
    let _guard = instance.lock_ops().await;

    let status = instance.status_unlocked().await?;
    match decide(&status, instance.config(), Utc::now()) {
        CycleAction::Skip => Ok(CycleOutcome::Skipped),
        CycleAction::Commit { message } => {
            instance.stage_all_unlocked().await?;
            instance.commit_unlocked(&message).await?;
            Ok(CycleOutcome::Committed)
        }
        CycleAction::CommitAndPush { message } => {
            instance.stage_all_unlocked().await?;
            instance.commit_unlocked(&message).await?;
            instance.push_unlocked(credentials).await?;
            Ok(CycleOutcome::Pushed)
        }
    }
}

/// Handle to one repository's recurring auto-commit task.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Spawn the recurring timer for an instance.
    ///
    /// Fires every `interval_minutes × 60s`; the immediate first tick of
    /// the interval is consumed so the first real firing happens one full
    /// interval after start.
    pub fn spawn(instance: Arc<RepoInstance>, credentials: Arc<CredentialSetup>) -> Self {
        let minutes = instance.config().auto_commit_interval_minutes.max(1) as u64;
        let period = Duration::from_secs(minutes * 60);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        match run_cycle(&instance, &credentials).await {
                            Ok(outcome) => {
                                debug!(
                                    folder_id = %instance.folder_id(),
                                    ?outcome,
                                    "auto-commit cycle finished"
                                );
                            }
                            Err(e) => {
                                // Logged and dropped: the next firing must
                                // still happen.
                                warn!(
                                    folder_id = %instance.folder_id(),
                                    error = %e,
                                    "auto-commit cycle failed"
                                );
                            }
                        }
                    }
                }
            }
        });

        Self {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Signal shutdown and cancel the task.
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}
