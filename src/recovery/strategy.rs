//! Recovery strategy ladders.
//!
//! Each stuck reason maps to an ordered list of strategies. Repeat
//! recoveries of the same task escalate down the ladder: the first
//! attempt uses the gentlest strategy, later attempts move toward the
//! drastic end.

use crate::recovery::stuck::StuckReason;
use std::fmt;

/// What to do with a stuck task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Put the task back in the ready queue as if never claimed.
    ResetToPending,
    /// Reschedule as an immediately claimable retry, counting the attempt.
    ForceRetry,
    /// Bump priority and reset, so the task wins the next claim race.
    EscalatePriority,
    /// Park the task for a human.
    ManualIntervention,
    /// Cancel the task outright.
    Abort,
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecoveryStrategy::ResetToPending => "reset_to_pending",
            RecoveryStrategy::ForceRetry => "force_retry",
            RecoveryStrategy::EscalatePriority => "escalate_priority",
            RecoveryStrategy::ManualIntervention => "manual_intervention",
            RecoveryStrategy::Abort => "abort",
        };
        write!(f, "{}", s)
    }
}

/// The escalation ladder for a stuck reason.
pub fn strategies_for(reason: StuckReason) -> &'static [RecoveryStrategy] {
    use RecoveryStrategy::*;
    match reason {
        StuckReason::Timeout => &[ResetToPending, ForceRetry, ManualIntervention],
        StuckReason::NetworkHang => &[ForceRetry, ResetToPending, ManualIntervention],
        StuckReason::ResourceLock => &[ResetToPending, EscalatePriority, ManualIntervention],
        StuckReason::Deadlock => &[ResetToPending, EscalatePriority, ManualIntervention],
        StuckReason::Unknown => &[ResetToPending, ManualIntervention, Abort],
    }
}

/// Pick the strategy for recovery attempt `attempt` (0-based). Attempts
/// past the end of the ladder stay on its last rung.
pub fn select(reason: StuckReason, attempt: usize) -> RecoveryStrategy {
    let ladder = strategies_for(reason);
    ladder[attempt.min(ladder.len() - 1)]
}
