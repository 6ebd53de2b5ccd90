//! Firecrawl `/v1/extract` client

use crate::service::{ExtractRequest, ExtractionService};
use crate::ExtractorError;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_API_URL: &str = "https://api.firecrawl.dev";

const SERVICE: &str = "Firecrawl";

/// Settings for [`FirecrawlService`].
///
/// # Examples
/// ```ignore
/// let service = FirecrawlService::new(FirecrawlConfig {
///     api_key: "fc-...".to_string(),
///     poll_interval: Duration::from_millis(500),
///     ..Default::default()
/// })?;
/// ```
#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
    pub api_key: String,
    pub base_url: String,
    pub user_agent: String,
    /// Per-HTTP-request timeout; the pipeline watchdog bounds the whole extraction
    pub request_timeout: Duration,
    /// Gap between status checks of an asynchronous extract job
    pub poll_interval: Duration,
    pub headers: Option<HeaderMap>,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_API_URL.to_string(),
            user_agent: "course_extractor/0.1.0".to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            headers: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Job state reported by the extract endpoint
#[derive(Debug, PartialEq)]
enum JobState {
    Done(Option<Value>),
    Pending(String),
}

/// Client for Firecrawl's `/v1/extract` endpoint
#[derive(Clone)]
pub struct FirecrawlService {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl FirecrawlService {
    pub fn new(config: FirecrawlConfig) -> Result<Self, ExtractorError> {
        if config.api_key.trim().is_empty() {
            return Err(ExtractorError::InvalidConfiguration(
                "Firecrawl API key cannot be empty".to_string(),
            ));
        }

        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(2);

        if let Some(headers) = config.headers {
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder.build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            ExtractorError::InvalidConfiguration(format!("Failed to initialize HTTP client: {e}"))
        })?;

        debug!(base_url = %config.base_url, "Firecrawl client initialized");
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            poll_interval: config.poll_interval,
        })
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, ExtractorError> {
        Self::new(FirecrawlConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    #[instrument(level = "debug", skip(self, request), err)]
    async fn start_job(&self, request: &ExtractRequest) -> Result<JobState, ExtractorError> {
        let url = format!("{}/v1/extract", self.base_url);
        debug!(urls = ?request.urls, "Submitting extract job");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        job_state(body)
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn poll_job(&self, id: &str) -> Result<JobState, ExtractorError> {
        let url = format!("{}/v1/extract/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let mut body = read_body(response).await?;
        // status responses do not always repeat the job id
        if body.id.is_none() {
            body.id = Some(id.to_string());
        }
        job_state(body)
    }
}

#[async_trait]
impl ExtractionService for FirecrawlService {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<Option<Value>, ExtractorError> {
        let mut state = self.start_job(request).await?;

        loop {
            match state {
                JobState::Done(data) => {
                    debug!(has_data = data.is_some(), "Extract job finished");
                    return Ok(data);
                }
                JobState::Pending(id) => {
                    tokio::time::sleep(self.poll_interval).await;
                    state = self.poll_job(&id).await?;
                }
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> ExtractorError {
    if e.is_timeout() {
        warn!(error = %e, "Firecrawl request timed out");
        ExtractorError::TimeoutError(e.to_string())
    } else {
        error!(error = %e, "Failed to send request to Firecrawl");
        ExtractorError::FetchError(e.to_string())
    }
}

async fn read_body(response: reqwest::Response) -> Result<ExtractResponse, ExtractorError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let text = response.text().await.unwrap_or_default();
        return Err(ExtractorError::RateLimitError(text));
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ExtractorError::ExternalServiceError {
            service: SERVICE.to_string(),
            message: format!("API returned status {status}: {text}"),
        });
    }

    response.json::<ExtractResponse>().await.map_err(|e| {
        error!(error = %e, "Failed to parse Firecrawl response");
        ExtractorError::ExternalServiceError {
            service: SERVICE.to_string(),
            message: e.to_string(),
        }
    })
}

fn job_state(body: ExtractResponse) -> Result<JobState, ExtractorError> {
    if body.success == Some(false) {
        return Err(ExtractorError::ExternalServiceError {
            service: SERVICE.to_string(),
            message: body.error.unwrap_or_else(|| "request was not successful".to_string()),
        });
    }

    let status = body.status.unwrap_or_default();
    match status.as_str() {
        "failed" | "cancelled" => Err(ExtractorError::ExternalServiceError {
            service: SERVICE.to_string(),
            message: body
                .error
                .unwrap_or_else(|| format!("extract job {status}")),
        }),
        "completed" => Ok(JobState::Done(body.data.filter(|d| !d.is_null()))),
        _ => match (body.data.filter(|d| !d.is_null()), body.id) {
            // synchronous replies carry the data without a status
            (Some(data), _) if status.is_empty() => Ok(JobState::Done(Some(data))),
            (_, Some(id)) => Ok(JobState::Pending(id)),
            (data, None) => Ok(JobState::Done(data)),
        },
    }
}
