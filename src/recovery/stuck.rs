//! Stuck-task detection and classification.
//!
//! A task is stuck when it sits in a claimed status (`locked` or
//! `in_progress`) past the timeout for its recorded phase. Classification
//! looks at how long it has been idle plus its retry history to guess at
//! the root cause, which then selects the recovery strategy ladder.

use crate::config::RecoveryConfig;
use crate::engine::executor::{PHASE_PROCESSING, PHASE_RUNNING, PHASE_UPLOADING};
use crate::error::Result;
use crate::store::{Task, TaskStore, now_ms};
use std::fmt;

/// Probable cause of a stuck task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StuckReason {
    Timeout,
    NetworkHang,
    ResourceLock,
    Deadlock,
    Unknown,
}

impl fmt::Display for StuckReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StuckReason::Timeout => "timeout",
            StuckReason::NetworkHang => "network_hang",
            StuckReason::ResourceLock => "resource_lock",
            StuckReason::Deadlock => "deadlock",
            StuckReason::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Find all tasks currently stuck according to the configured phase
/// timeouts.
pub fn detect(store: &TaskStore, config: &RecoveryConfig) -> Result<Vec<Task>> {
    let now = now_ms();
    let cutoffs = [
        (PHASE_RUNNING, now - config.running_timeout_minutes * 60_000),
        (PHASE_PROCESSING, now - config.processing_timeout_minutes * 60_000),
        (PHASE_UPLOADING, now - config.uploading_timeout_minutes * 60_000),
    ];
    let default_cutoff = now - config.default_timeout_minutes * 60_000;
    store.list_stuck(&cutoffs, default_cutoff)
}

/// Classify why a task got stuck from how long it has been idle.
pub fn classify(task: &Task, stuck_minutes: i64) -> StuckReason {
    let phase = task.phase.as_deref().unwrap_or("");
    if stuck_minutes > 30 {
        return match phase {
            PHASE_RUNNING => StuckReason::Timeout,
            PHASE_PROCESSING => StuckReason::ResourceLock,
            _ => StuckReason::Unknown,
        };
    }
    if stuck_minutes >= 15 {
        if task.retry_count > 2 {
            return StuckReason::NetworkHang;
        }
        return StuckReason::Deadlock;
    }
    if stuck_minutes >= 10 {
        return StuckReason::Timeout;
    }
    StuckReason::Unknown
}
