//! Quota allocation across projects.
//!
//! Splits a target task count across active projects proportionally to their
//! priority weights.

use crate::store::Project;

/// Minimum weight any project carries, regardless of its priority value.
pub const MIN_WEIGHT: i64 = 1;

/// Allocate `total` tasks across projects proportionally to priority.
///
/// Returns (project_id, quota) pairs in input order. Weight is
/// `max(1, priority)`, so zero or negative priorities still get a share.
/// Every project except the last receives `floor(weight/total_weight *
/// total)`; the last absorbs whatever remains, so the quotas always sum to
/// exactly `total`. The remainder landing on the final project is
/// order-dependent; tests pin that behavior.
pub fn allocate(projects: &[Project], total: usize) -> Vec<(i64, usize)> {
    if projects.is_empty() || total == 0 {
        return Vec::new();
    }

    let weights: Vec<i64> = projects.iter().map(|p| p.priority.max(MIN_WEIGHT)).collect();
    let total_weight: i64 = weights.iter().sum();

    let mut quotas = Vec::with_capacity(projects.len());
    let mut allocated = 0usize;

    for (i, project) in projects.iter().enumerate() {
        let quota = if i == projects.len() - 1 {
            total - allocated
        } else {
            (weights[i] as f64 / total_weight as f64 * total as f64).floor() as usize
        };
        allocated += quota;
        quotas.push((project.id, quota));
    }

    tracing::debug!(total, total_weight, ?quotas, "allocated daily quotas");
    quotas
}
