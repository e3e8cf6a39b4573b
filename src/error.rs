//! Error types for Postr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Postr
#[derive(Debug, Error)]
pub enum PostrError {
    /// Project not found in storage
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Task not found in storage
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Optimistic-lock version mismatch on a task update
    #[error("Version conflict on task {task_id}: expected {expected}")]
    VersionConflict { task_id: i64, expected: i64 },

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Content generation API error
    #[error("Generation error: {0}")]
    Generation(String),

    /// Publishing API error
    #[error("Publish error: {0}")]
    Publish(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for PostrError {
    fn from(e: rusqlite::Error) -> Self {
        PostrError::Storage(e.to_string())
    }
}

/// Result type alias for Postr operations
pub type Result<T> = std::result::Result<T, PostrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_not_found_error() {
        let err = PostrError::ProjectNotFound("travel-vlogs".to_string());
        assert_eq!(err.to_string(), "Project not found: travel-vlogs");
    }

    #[test]
    fn test_task_not_found_error() {
        let err = PostrError::TaskNotFound(42);
        assert_eq!(err.to_string(), "Task not found: 42");
    }

    #[test]
    fn test_version_conflict_error() {
        let err = PostrError::VersionConflict {
            task_id: 7,
            expected: 3,
        };
        assert_eq!(err.to_string(), "Version conflict on task 7: expected 3");
    }

    #[test]
    fn test_storage_error() {
        let err = PostrError::Storage("database locked".to_string());
        assert_eq!(err.to_string(), "Storage error: database locked");
    }

    #[test]
    fn test_publish_error() {
        let err = PostrError::Publish("rate limited".to_string());
        assert_eq!(err.to_string(), "Publish error: rate limited");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PostrError = io_err.into();
        assert!(matches!(err, PostrError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: PostrError = json_err.into();
        assert!(matches!(err, PostrError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(PostrError::InvalidState("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
