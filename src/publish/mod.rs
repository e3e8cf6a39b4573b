//! Publishing backends: the trait seam the engine executes against and
//! the HTTP gateway implementations used in production.

pub mod client;
pub mod http;
pub mod types;

pub use client::{ContentGenerator, Publisher};
pub use http::{HttpContentGenerator, HttpPublisher};
pub use types::{GeneratedText, PublishResult};
