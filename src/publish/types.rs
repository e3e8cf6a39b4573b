//! Request and response types shared between the execution engine and
//! the publishing backends.

use crate::store::MediaType;
use serde::{Deserialize, Serialize};

/// Caption text produced by the content generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    /// Wall-clock latency of the generation call.
    pub latency_ms: u64,
}

/// Result of a successful publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    /// Identifier the remote platform assigned to the post.
    pub external_id: String,
    /// Public URL of the published post, when the platform returns one.
    pub url: Option<String>,
    pub latency_ms: u64,
}

/// Wire payload for a publish request.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub media_path: String,
    pub media_type: MediaType,
    pub caption: String,
}

/// Wire payload returned by the publish endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishResponse {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Wire payload returned by the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
}
