/// Job-listings client — a thin wrapper over a RapidAPI JSearch-style
/// `/search` endpoint.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{JobPosting, JobSearcher, ServiceError};

/// Location used when the caller does not specify one.
pub const DEFAULT_LOCATION: &str = "India";
/// At most this many postings are kept for presentation, in provider order.
pub const MAX_RESULTS: usize = 5;
/// Request budget; a hung listings call must not stall a turn indefinitely.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Missing or empty `data` is a valid empty result, not an error.
    #[serde(default)]
    data: Vec<JobRow>,
}

#[derive(Debug, Deserialize)]
struct JobRow {
    #[serde(default)]
    job_title: String,
    #[serde(default)]
    employer_name: String,
    #[serde(default)]
    job_city: String,
    #[serde(default)]
    job_country: String,
    #[serde(default)]
    job_apply_link: String,
}

impl From<JobRow> for JobPosting {
    fn from(row: JobRow) -> Self {
        JobPosting {
            title: row.job_title,
            employer: row.employer_name,
            city: row.job_city,
            country: row.job_country,
            apply_url: row.job_apply_link,
        }
    }
}

/// Stateless wrapper around the remote listings endpoint. One attempt per
/// call, fixed pagination (page 1, one page).
#[derive(Clone)]
pub struct JobSearchClient {
    client: Client,
    api_key: String,
    api_host: String,
}

impl JobSearchClient {
    pub fn new(api_key: String, api_host: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            api_host,
        }
    }

    async fn search_inner(
        &self,
        query: &str,
        location: &str,
    ) -> Result<Vec<JobPosting>, ServiceError> {
        let response = self
            .client
            .get(format!("https://{}/search", self.api_host))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .query(&[
                ("query", query),
                ("location", location),
                ("page", "1"),
                ("num_pages", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let postings = collect_postings(body.data);
        debug!("Job search returned {} postings", postings.len());
        Ok(postings)
    }
}

#[async_trait]
impl JobSearcher for JobSearchClient {
    async fn search(&self, query: &str, location: &str) -> Result<Vec<JobPosting>, ServiceError> {
        self.search_inner(query, location).await
    }
}

/// Maps provider rows into postings, truncated to [`MAX_RESULTS`] in
/// provider order (no re-ranking).
fn collect_postings(rows: Vec<JobRow>) -> Vec<JobPosting> {
    rows.into_iter()
        .take(MAX_RESULTS)
        .map(JobPosting::from)
        .collect()
}
