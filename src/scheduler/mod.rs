//! Scheduling: quota allocation and publish-slot generation.
//!
//! This module provides:
//! - **Quota allocation**: splits a daily task target across active projects
//!   proportionally to priority weight, sum-exact.
//! - **Slot generation**: optimal-hour-biased timestamps inside a window,
//!   multi-day distribution, blackout adjustment, and minimum-interval
//!   spacing.
//!
//! Both halves are pure computation with injected randomness; persistence
//! and logging stay with the callers.

mod quota;
mod slots;

pub use quota::{MIN_WEIGHT, allocate};
pub use slots::{adjust_for_blackout, generate, generate_multi_day, space_out};
