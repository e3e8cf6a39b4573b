//! Task creation: media scanning, content metadata resolution, and the
//! orchestration layer that turns quotas into scheduled task records.

pub mod metadata;
pub mod orchestrator;

pub use metadata::resolve_content;
pub use orchestrator::{CreationReport, TaskCreator, scan_media};
