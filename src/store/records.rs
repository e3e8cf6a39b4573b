//! Record types for TaskStore persistence.
//!
//! This module defines the entities the publishing pipeline works with:
//! projects, content sources, publishing tasks, the append-only publishing
//! log, and hourly analytics rollups. Tasks carry a `version` counter used
//! for optimistic locking on every update.

use serde::{Deserialize, Serialize};

pub use crate::id::now_ms;

/// A publishing project. Only active projects take part in quota
/// allocation and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// SQLite rowid (0 until inserted)
    pub id: i64,

    /// Unique project name
    pub name: String,

    /// Positive integer weight used by quota allocation
    pub priority: i64,

    /// Current status
    pub status: ProjectStatus,

    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

impl Project {
    /// Create a new active project with the given name and priority.
    pub fn new(name: &str, priority: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            priority,
            status: ProjectStatus::Active,
            created_at: now_ms(),
        }
    }
}

/// Project status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Paused,
    Inactive,
}

impl ProjectStatus {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Inactive => "inactive",
        }
    }

    /// Parse from the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "paused" => Some(ProjectStatus::Paused),
            "inactive" => Some(ProjectStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scannable location yielding candidate media files for one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentSource {
    /// SQLite rowid (0 until inserted)
    pub id: i64,

    pub project_id: i64,

    /// Scan root on disk
    pub path: String,

    /// Language tag used for sidecar metadata lookup ("en", "de", ...)
    pub language: String,

    /// Media files seen on the last scan
    pub total_items: i64,

    /// Media files that have ever had a task created
    pub used_items: i64,
}

impl ContentSource {
    /// Create a new content source for a project.
    pub fn new(project_id: i64, path: &str, language: &str) -> Self {
        Self {
            id: 0,
            project_id,
            path: path.to_string(),
            language: language.to_string(),
            total_items: 0,
            used_items: 0,
        }
    }
}

/// The central mutable entity: one scheduled publish of one media file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// SQLite rowid (0 until inserted)
    pub id: i64,

    pub project_id: i64,
    pub source_id: i64,

    /// Absolute path to the media file; unique per project
    pub media_path: String,

    /// Derived content payload (text, hashtags, language, ...)
    pub content_data: ContentData,

    /// When this task should be published (Unix ms)
    pub scheduled_at: i64,

    /// Higher runs sooner
    pub priority: i64,

    pub status: TaskStatus,

    /// Execution sub-state written by the engine, read by recovery:
    /// "running" | "processing" | "uploading"
    pub phase: Option<String>,

    pub retry_count: u32,

    /// Optimistic-lock counter, incremented on every update
    pub version: i64,

    /// External post URL once published
    pub posted_url: Option<String>,

    /// Unix timestamps in milliseconds
    pub created_at: i64,
    pub updated_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(project_id: i64, source_id: i64, media_path: &str, content: ContentData, scheduled_at: i64) -> Self {
        let now = now_ms();
        Self {
            id: 0,
            project_id,
            source_id,
            media_path: media_path.to_string(),
            content_data: content,
            scheduled_at,
            priority: 0,
            status: TaskStatus::Pending,
            phase: None,
            retry_count: 0,
            version: 0,
            posted_url: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Update the timestamp to now.
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Minutes since the last update.
    pub fn minutes_since_update(&self, now: i64) -> i64 {
        (now - self.updated_at) / 60_000
    }
}

/// Task status state machine.
///
/// `Retry` is claimable exactly like `Pending`; `Locked` and `InProgress`
/// act as a cooperative lock that the recovery manager can break.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its scheduled time
    Pending,
    /// Claimed but not yet executing
    Locked,
    /// Actively generating/publishing
    InProgress,
    /// Failed recoverably, rescheduled with backoff
    Retry,
    /// Published
    Success,
    /// Retry budget exhausted or non-recoverable error
    Failed,
}

impl TaskStatus {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Locked => "locked",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Retry => "retry",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
        }
    }

    /// Parse from the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "locked" => Some(TaskStatus::Locked),
            "in_progress" => Some(TaskStatus::InProgress),
            "retry" => Some(TaskStatus::Retry),
            "success" => Some(TaskStatus::Success),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }

    /// Check if the execution engine may claim a task in this status.
    pub fn is_claimable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Retry)
    }

    /// Statuses that block creating another task for the same media path.
    pub fn blocks_duplicate(&self) -> bool {
        matches!(
            self,
            TaskStatus::Pending | TaskStatus::Locked | TaskStatus::InProgress | TaskStatus::Success
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Media kind, dispatched by file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Image,
}

impl MediaType {
    /// Classify a media path by extension. `.mp4`/`.mov` use the video
    /// upload path; everything else is treated as an image.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if lower.ends_with(".mp4") || lower.ends_with(".mov") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

/// Typed content payload attached to a task.
///
/// The source system kept this as a free-form JSON dict; modeling it as a
/// struct catches malformed entries at parse time instead of publish time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentData {
    /// Title or caption seed for the generation API
    pub title: String,

    /// Longer description, empty when only a placeholder was available
    pub description: String,

    pub hashtags: Vec<String>,

    pub media_type: MediaType,

    pub language: String,

    /// Unix timestamp in milliseconds
    pub generated_at: i64,

    /// Sidecar metadata file this payload came from, if any
    pub metadata_path: Option<String>,
}

impl ContentData {
    /// Synthesize a placeholder payload from a media filename stem.
    ///
    /// Used when no sidecar metadata file validates; the generation API is
    /// expected to produce a caption from the filename alone.
    pub fn placeholder(media_path: &str, language: &str) -> Self {
        let stem = std::path::Path::new(media_path)
            .file_stem()
            .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
            .unwrap_or_default();
        Self {
            title: stem,
            description: String::new(),
            hashtags: Vec::new(),
            media_type: MediaType::from_path(media_path),
            language: language.to_string(),
            generated_at: now_ms(),
            metadata_path: None,
        }
    }
}

/// One append-only record of one execution attempt. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishingLog {
    /// SQLite rowid (0 until inserted)
    pub id: i64,

    pub task_id: i64,

    /// Outcome of the attempt
    pub status: LogStatus,

    /// External post identifier, when the platform returned one
    pub tweet_id: Option<String>,

    pub url: Option<String>,

    pub error_message: Option<String>,

    pub duration_seconds: f64,

    /// Unix timestamp in milliseconds
    pub published_at: i64,
}

/// Outcome recorded in the publishing log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Retry,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Retry => "retry",
            LogStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(LogStatus::Success),
            "retry" => Some(LogStatus::Retry),
            "failed" => Some(LogStatus::Failed),
            _ => None,
        }
    }
}

/// Per-(project, hour) rollup of publish outcomes. At most one row exists
/// per (project_id, hour_ts); completions upsert into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsHourly {
    pub project_id: i64,

    /// Hour bucket: Unix ms truncated to the hour
    pub hour_ts: i64,

    pub successful: i64,
    pub failed: i64,
    pub total_duration_seconds: f64,
}

/// Truncate a Unix-ms timestamp to its hour bucket.
pub fn hour_bucket(ts_ms: i64) -> i64 {
    ts_ms - ts_ms.rem_euclid(3_600_000)
}
