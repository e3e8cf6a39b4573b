//! Trait definitions for the external publishing collaborators.
//!
//! The execution engine only talks to these traits. Production wires in
//! the HTTP implementations; tests substitute in-memory fakes.

use crate::error::Result;
use crate::publish::types::{GeneratedText, PublishResult};
use crate::store::{ContentData, Project};
use async_trait::async_trait;
use std::path::Path;

/// Produces the final caption text for a task from its content payload.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, content: &ContentData, media_filename: &str, project: &Project) -> Result<GeneratedText>;
}

/// Publishes media to the remote platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_video(&self, media_path: &Path, caption: &str) -> Result<PublishResult>;

    async fn publish_images(&self, media_paths: &[&Path], caption: &str) -> Result<PublishResult>;
}
