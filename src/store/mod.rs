//! Persistence layer: typed records and the SQLite-backed TaskStore.

mod records;
mod task_store;

pub use records::{
    AnalyticsHourly, ContentData, ContentSource, LogStatus, MediaType, Project, ProjectStatus, PublishingLog, Task,
    TaskStatus, hour_bucket, now_ms,
};
pub use task_store::{TaskStore, compute_workspace_hash};
