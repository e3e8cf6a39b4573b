//! Stuck-task recovery: detection, cause classification, escalating
//! strategies, and the sweep manager that applies them.

pub mod manager;
pub mod strategy;
pub mod stuck;

pub use manager::{RecoveryAttempt, RecoveryManager, SweepReport};
pub use strategy::{RecoveryStrategy, strategies_for};
pub use stuck::{StuckReason, classify, detect};
