//! Task execution engine: claim semantics, the publish pipeline, and
//! retry classification with exponential backoff.

pub mod executor;
pub mod retry;

pub use executor::{BatchReport, TaskExecutor};
pub use retry::{RetryPolicy, is_recoverable};
