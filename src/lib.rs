//! Postr - scheduled social media publishing daemon
//!
//! Postr scans per-project content sources for media files, creates
//! publishing tasks on a quota-driven schedule, executes them against
//! HTTP generation and publish backends with retry and backoff, and
//! recovers tasks that get stuck mid-flight.
//!
//! # Architecture
//!
//! - `scheduler` - quota allocation across projects and publish-slot
//!   generation within daily windows
//! - `creator` - media scanning, sidecar metadata resolution, and task
//!   creation
//! - `engine` - claim-based task execution with retry classification
//! - `publish` - collaborator traits plus HTTP implementations
//! - `recovery` - stuck-task detection, classification, and escalating
//!   recovery strategies
//! - `store` - rusqlite-backed persistence with optimistic versioning
//! - `daemon` - the long-running loops tying it all together

pub mod cli;
pub mod config;
pub mod creator;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod id;
pub mod publish;
pub mod recovery;
pub mod scheduler;
pub mod store;

pub use error::{PostrError, Result};
