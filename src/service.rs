//! Extraction service abstraction
//!
//! The hosted service does all crawling and field extraction. This module only
//! describes what is asked of it and what comes back, so the pipeline can run
//! against Firecrawl in production and against [`MockService`] in tests.

use crate::course::{course_schema, COURSE_PROMPT};
use crate::ExtractorError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// A single extraction request as sent to the service
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Pages to extract from
    pub urls: Vec<String>,
    /// Natural-language instruction for the extraction model
    pub prompt: String,
    /// JSON schema of the expected object
    pub schema: Value,
    /// Let the service follow links outside the given pages
    pub enable_web_search: bool,
}

impl ExtractRequest {
    /// The fixed course-details request for one page
    pub fn course(url: &str) -> Result<Self, ExtractorError> {
        Ok(Self {
            urls: vec![url.to_string()],
            prompt: COURSE_PROMPT.to_string(),
            schema: course_schema()?,
            enable_web_search: false,
        })
    }
}

/// Trait for extraction backends
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Get the name of the service
    fn name(&self) -> &str;

    /// Run one extraction. `Ok(None)` means the service answered but returned no data.
    async fn extract(&self, request: &ExtractRequest) -> Result<Option<Value>, ExtractorError>;
}

#[derive(Clone)]
enum MockReply {
    Data(Value),
    Empty,
    Error(String),
}

/// Canned extraction service for tests and offline demos.
///
/// Replies are keyed by the first URL of the request. Unknown URLs get an
/// empty reply.
#[derive(Clone, Default)]
pub struct MockService {
    replies: HashMap<String, MockReply>,
    delays: HashMap<String, Duration>,
    requests: Arc<Mutex<Vec<ExtractRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: impl Into<String>, data: Value) -> Self {
        self.replies.insert(url.into(), MockReply::Data(data));
        self
    }

    pub fn with_empty(mut self, url: impl Into<String>) -> Self {
        self.replies.insert(url.into(), MockReply::Empty);
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies.insert(url.into(), MockReply::Error(message.into()));
        self
    }

    /// Make replies for `url` take `delay` before they arrive
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<ExtractRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExtractionService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<Option<Value>, ExtractorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let url = request.urls.first().map(String::as_str).unwrap_or_default();
        debug!(url = %url, "Mock extraction");

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.replies.get(url) {
            Some(MockReply::Data(data)) => Ok(Some(data.clone())),
            Some(MockReply::Error(message)) => Err(ExtractorError::ExternalServiceError {
                service: "mock".to_string(),
                message: message.clone(),
            }),
            Some(MockReply::Empty) | None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_course_request_body() {
        let request = ExtractRequest::course("https://www.brighton.ac.uk/courses/study/x.aspx").unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["urls"], json!(["https://www.brighton.ac.uk/courses/study/x.aspx"]));
        assert_eq!(body["enableWebSearch"], json!(false));
        assert!(body["prompt"].as_str().unwrap().contains("entry requirements"));
        assert!(body["schema"]["properties"].get("course_name").is_some());
    }

    #[tokio::test]
    async fn test_mock_service_replies() {
        let service = MockService::new()
            .with_response("https://a.example", json!({"course_name": "A"}))
            .with_error("https://b.example", "boom");

        let a = ExtractRequest::course("https://a.example").unwrap();
        let b = ExtractRequest::course("https://b.example").unwrap();
        let c = ExtractRequest::course("https://c.example").unwrap();

        assert_eq!(
            service.extract(&a).await.unwrap(),
            Some(json!({"course_name": "A"}))
        );
        assert!(service.extract(&b).await.is_err());
        assert_eq!(service.extract(&c).await.unwrap(), None);
        assert_eq!(service.requests().len(), 3);
    }
}
