//! HTTP implementations of the publishing collaborators.
//!
//! Both clients talk JSON to a local gateway service that fronts the
//! actual platform APIs. Error messages preserve the HTTP status class
//! so the retry classifier can distinguish transient failures (5xx,
//! timeouts) from permanent ones (auth, validation).

use crate::config::ApiConfig;
use crate::error::{PostrError, Result};
use crate::publish::client::{ContentGenerator, Publisher};
use crate::publish::types::{GeneratedText, GenerationResponse, PublishRequest, PublishResponse, PublishResult};
use crate::store::{ContentData, MediaType, Project};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::{Duration, Instant};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn build_client(timeout_secs: u64) -> Result<Client> {
    let timeout = if timeout_secs == 0 { DEFAULT_TIMEOUT_SECS } else { timeout_secs };
    Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()
        .map_err(|e| PostrError::Config(format!("failed to create HTTP client: {}", e)))
}

/// Render an HTTP failure so the status class survives into the message.
fn status_error(status: reqwest::StatusCode, body: &str) -> String {
    if status.is_server_error() {
        format!("server error {}: {}", status.as_u16(), body)
    } else {
        format!("{} {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("error"), body)
    }
}

/// Caption generation over HTTP.
pub struct HttpContentGenerator {
    client: Client,
    url: String,
}

impl HttpContentGenerator {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            url: config.generation_url.clone(),
        })
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, content: &ContentData, media_filename: &str, project: &Project) -> Result<GeneratedText> {
        let body = json!({
            "title": content.title,
            "description": content.description,
            "hashtags": content.hashtags,
            "language": content.language,
            "media_filename": media_filename,
            "project": project.name,
        });

        debug!("requesting caption for {} from {}", media_filename, self.url);
        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PostrError::Generation(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostrError::Generation(status_error(status, &body)));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| PostrError::Generation(format!("invalid response: {}", e)))?;

        Ok(GeneratedText {
            text: parsed.text,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Media publishing over HTTP.
pub struct HttpPublisher {
    client: Client,
    url: String,
}

impl HttpPublisher {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            url: config.publish_url.clone(),
        })
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishResult> {
        debug!("publishing {} to {}", request.media_path, self.url);
        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| PostrError::Publish(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostrError::Publish(status_error(status, &body)));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| PostrError::Publish(format!("invalid response: {}", e)))?;

        Ok(PublishResult {
            external_id: parsed.id,
            url: parsed.url,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish_video(&self, media_path: &Path, caption: &str) -> Result<PublishResult> {
        self.publish(&PublishRequest {
            media_path: media_path.to_string_lossy().to_string(),
            media_type: MediaType::Video,
            caption: caption.to_string(),
        })
        .await
    }

    async fn publish_images(&self, media_paths: &[&Path], caption: &str) -> Result<PublishResult> {
        // The gateway treats multi-image posts as one request keyed by
        // the first path, with the rest joined in.
        let joined = media_paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.publish(&PublishRequest {
            media_path: joined,
            media_type: MediaType::Image,
            caption: caption.to_string(),
        })
        .await
    }
}
