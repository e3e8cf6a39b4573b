//! The recovery manager: periodic sweeps over stuck tasks.
//!
//! Recovery history lives in memory only. It caps how often one task may
//! be auto-recovered; losing it on restart just resets that cap, which is
//! acceptable since the task rows themselves are durable.

use crate::config::RecoveryConfig;
use crate::error::{PostrError, Result};
use crate::id::generate_sweep_id;
use crate::recovery::strategy::{RecoveryStrategy, select};
use crate::recovery::stuck::{StuckReason, classify, detect};
use crate::store::{LogStatus, PublishingLog, Task, TaskStatus, TaskStore, now_ms};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Recovery attempts older than this no longer count toward escalation.
const ATTEMPT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// History entries older than this are dropped entirely.
const HISTORY_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// One recorded recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryAttempt {
    pub at_ms: i64,
    pub reason: StuckReason,
    pub strategy: RecoveryStrategy,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub reset: usize,
    pub retried: usize,
    pub escalated: usize,
    pub manual: usize,
    pub aborted: usize,
    pub skipped: usize,
}

/// Detects stuck tasks and applies escalating recovery strategies.
pub struct RecoveryManager {
    config: RecoveryConfig,
    history: HashMap<i64, Vec<RecoveryAttempt>>,
}

impl RecoveryManager {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            config,
            history: HashMap::new(),
        }
    }

    /// Run one detection-and-recovery pass.
    pub fn sweep(&mut self, store: &mut TaskStore) -> Result<SweepReport> {
        let sweep_id = generate_sweep_id();
        let now = now_ms();
        self.prune_history(now);

        let stuck = detect(store, &self.config)?;
        let mut report = SweepReport {
            scanned: stuck.len(),
            ..Default::default()
        };
        if stuck.is_empty() {
            return Ok(report);
        }
        info!("[{}] recovery sweep found {} stuck task(s)", sweep_id, stuck.len());

        for mut task in stuck {
            let stuck_minutes = task.minutes_since_update(now);
            let reason = classify(&task, stuck_minutes);
            let prior = self.recent_attempts(task.id, now);

            // The attempt budget trumps the per-reason ladder
            let strategy = if prior >= self.config.max_recovery_attempts as usize {
                RecoveryStrategy::ManualIntervention
            } else {
                select(reason, prior)
            };

            info!(
                "[{}] task {} stuck {} min (reason: {}, attempt {}): applying {}",
                sweep_id, task.id, stuck_minutes, reason, prior, strategy
            );

            match self.apply(store, &mut task, strategy) {
                Ok(()) => {
                    self.history.entry(task.id).or_default().push(RecoveryAttempt {
                        at_ms: now,
                        reason,
                        strategy,
                    });
                    match strategy {
                        RecoveryStrategy::ResetToPending => report.reset += 1,
                        RecoveryStrategy::ForceRetry => report.retried += 1,
                        RecoveryStrategy::EscalatePriority => report.escalated += 1,
                        RecoveryStrategy::ManualIntervention => report.manual += 1,
                        RecoveryStrategy::Abort => report.aborted += 1,
                    }
                }
                // The task moved under us: an executor finished or another
                // sweep won. Leave it alone.
                Err(PostrError::VersionConflict { task_id, .. }) => {
                    debug!("[{}] task {} changed during recovery, skipping", sweep_id, task_id);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Recovery attempts recorded for a task, oldest first.
    pub fn history_for(&self, task_id: i64) -> &[RecoveryAttempt] {
        self.history.get(&task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn apply(&self, store: &mut TaskStore, task: &mut Task, strategy: RecoveryStrategy) -> Result<()> {
        match strategy {
            RecoveryStrategy::ResetToPending => {
                task.status = TaskStatus::Pending;
                task.phase = None;
                task.started_at = None;
                store.update_task(task)
            }
            RecoveryStrategy::ForceRetry => {
                task.retry_count += 1;
                task.status = TaskStatus::Retry;
                task.phase = None;
                task.scheduled_at = now_ms();
                store.update_task(task)
            }
            RecoveryStrategy::EscalatePriority => {
                task.priority += 1;
                task.status = TaskStatus::Pending;
                task.phase = None;
                task.started_at = None;
                store.update_task(task)
            }
            RecoveryStrategy::ManualIntervention => {
                warn!("task {} needs manual intervention after repeated recoveries", task.id);
                self.fail_task(store, task, "recovery: manual intervention required")
            }
            RecoveryStrategy::Abort => self.fail_task(store, task, "recovery: task aborted"),
        }
    }

    fn fail_task(&self, store: &mut TaskStore, task: &mut Task, message: &str) -> Result<()> {
        task.status = TaskStatus::Failed;
        task.phase = None;
        task.completed_at = Some(now_ms());
        store.update_task(task)?;

        store.append_log(&PublishingLog {
            id: 0,
            task_id: task.id,
            status: LogStatus::Failed,
            tweet_id: None,
            url: None,
            error_message: Some(message.to_string()),
            duration_seconds: 0.0,
            published_at: now_ms(),
        })?;
        store.record_outcome(task.project_id, now_ms(), false, 0.0)?;
        Ok(())
    }

    fn recent_attempts(&self, task_id: i64, now: i64) -> usize {
        self.history
            .get(&task_id)
            .map(|attempts| {
                attempts
                    .iter()
                    .filter(|a| now - a.at_ms < ATTEMPT_WINDOW_MS)
                    .count()
            })
            .unwrap_or(0)
    }

    fn prune_history(&mut self, now: i64) {
        for attempts in self.history.values_mut() {
            attempts.retain(|a| now - a.at_ms < HISTORY_RETENTION_MS);
        }
        self.history.retain(|_, attempts| !attempts.is_empty());
    }
}
