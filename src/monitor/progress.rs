//! Background progress monitor for the agent phase.
//!
//! While the agent process runs, the monitor periodically asks git which
//! non-test files changed, diffs them, and reports a compact summary
//! whenever the diff text differs from the last one it saw. It only reads
//! the workspace; every error is logged and swallowed.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::exercises::is_test_file;
use crate::workspace::GitWorkspace;

/// Default interval between checks.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(8);

/// Diffs longer than this are summarized without their body in logs.
const MAX_LOGGED_DIFF_LINES: usize = 50;

/// Lines added and removed in a unified diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
}

impl DiffSummary {
    /// Counts `+`/`-` lines, ignoring the `+++`/`---` file headers.
    pub fn from_diff(diff: &str) -> Self {
        diff.lines().fold(Self::default(), |mut acc, line| {
            if line.starts_with('+') && !line.starts_with("+++") {
                acc.added += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                acc.removed += 1;
            }
            acc
        })
    }
}

/// A change observed by the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The workspace diff differs from the last one seen.
    Changed {
        exercise: String,
        summary: DiffSummary,
        diff: String,
    },
    /// Previously seen changes are gone.
    Reset { exercise: String },
}

/// One progress check against a workspace, remembering the last diff seen.
#[derive(Debug)]
pub struct ProgressProbe {
    exercise: String,
    workspace: GitWorkspace,
    last_diff: String,
}

impl ProgressProbe {
    pub fn new(exercise: impl Into<String>, workspace: GitWorkspace) -> Self {
        Self {
            exercise: exercise.into(),
            workspace,
            last_diff: String::new(),
        }
    }

    /// Queries the workspace and returns an event if anything changed since
    /// the previous check.
    ///
    /// A failed query yields `None` and leaves the remembered diff untouched.
    pub async fn check(&mut self) -> Option<ProgressEvent> {
        match self.current_diff().await {
            Ok(diff) => self.observe(diff),
            Err(e) => {
                debug!(exercise = %self.exercise, error = %e, "Progress check failed");
                None
            }
        }
    }

    /// Compares `diff` with the last seen diff and updates it.
    pub fn observe(&mut self, diff: String) -> Option<ProgressEvent> {
        if diff == self.last_diff {
            return None;
        }
        let previous = std::mem::replace(&mut self.last_diff, diff);
        if self.last_diff.is_empty() {
            debug!(exercise = %self.exercise, previous_len = previous.len(), "Changes disappeared");
            return Some(ProgressEvent::Reset {
                exercise: self.exercise.clone(),
            });
        }
        Some(ProgressEvent::Changed {
            exercise: self.exercise.clone(),
            summary: DiffSummary::from_diff(&self.last_diff),
            diff: self.last_diff.clone(),
        })
    }

    async fn current_diff(&self) -> Result<String, crate::error::VcsError> {
        let files: Vec<String> = self
            .workspace
            .changed_files()
            .await?
            .into_iter()
            .filter(|f| !is_test_file(f))
            .collect();
        if files.is_empty() {
            return Ok(String::new());
        }
        Ok(self.workspace.diff(&files).await?.trim().to_string())
    }
}

/// A background task that runs a [`ProgressProbe`] on an interval.
///
/// The first check happens immediately. Call [`ProgressMonitor::stop`] to
/// cancel; an in-flight check is allowed to finish first so no git process
/// is left holding the repository lock.
pub struct ProgressMonitor {
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressMonitor {
    /// Starts monitoring.
    ///
    /// Events are logged and, when `events` is given, also sent there. A
    /// closed receiver does not stop the monitor.
    pub fn start(
        mut probe: ProgressProbe,
        interval: Duration,
        events: Option<mpsc::UnboundedSender<ProgressEvent>>,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        info!(exercise = %probe.exercise, "Progress monitoring started");

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tick.tick() => {}
                }

                if let Some(event) = probe.check().await {
                    log_event(&event);
                    if let Some(tx) = &events {
                        let _ = tx.send(event);
                    }
                }
            }

            info!(exercise = %probe.exercise, "Progress monitoring stopped");
        });

        Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stops the monitor and waits for the background task to exit.
    /// Calling it again is a no-op.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
    }
}

fn log_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::Changed {
            exercise,
            summary,
            diff,
        } => {
            info!(
                exercise = %exercise,
                added = summary.added,
                removed = summary.removed,
                "Agent changed files"
            );
            let lines = diff.lines().count();
            if lines <= MAX_LOGGED_DIFF_LINES {
                debug!(exercise = %exercise, "Latest changes:\n{}", diff);
            } else {
                debug!(exercise = %exercise, lines, "Latest changes omitted due to length");
            }
        }
        ProgressEvent::Reset { exercise } => {
            info!(exercise = %exercise, "Changes have been reset");
        }
    }
}
