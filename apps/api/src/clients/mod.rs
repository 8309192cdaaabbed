//! Adapters for the two remote providers: text generation and job listings.
//!
//! Both clients are stateless request/response wrappers: one attempt per
//! call, no retry, no backoff. Every transport, status, or decode fault is
//! converted into a [`ServiceError`] at this boundary; callers decide how to
//! surface it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod jobs;
pub mod llm;

pub use jobs::JobSearchClient;
pub use llm::LlmClient;

/// Uniform failure outcome for any external provider call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One job listing as presented to the user. Read-only; never persisted
/// beyond formatting into a single reply.
#[derive(Debug, Clone, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub employer: String,
    pub city: String,
    pub country: String,
    pub apply_url: String,
}

/// Seam over the language-model provider so the orchestrator can be exercised
/// against fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Seam over the job-listings provider.
#[async_trait]
pub trait JobSearcher: Send + Sync {
    async fn search(&self, query: &str, location: &str) -> Result<Vec<JobPosting>, ServiceError>;
}
