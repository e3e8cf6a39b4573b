//! ID generation utilities for Postr
//!
//! Provides functions for generating correlation identifiers for publishing
//! runs and log entries. Task and project rows use SQLite rowids; these ids
//! tag things that never touch the database index.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique batch-run ID
///
/// Format: `run-{timestamp_ms}-{random_hex}`
/// Example: `run-1738300800123-a1b2`
pub fn generate_run_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("run-{}-{:04x}", timestamp, random)
}

/// Generate a recovery-sweep ID
///
/// Format: `sweep-{timestamp_ms}-{random_hex}`
pub fn generate_sweep_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("sweep-{}-{:04x}", timestamp, random)
}
