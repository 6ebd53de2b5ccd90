//! Sequential, timeout-bounded extraction loop
//!
//! URLs are handled one at a time. Each service call runs on its own task and
//! is abandoned once the watchdog limit passes. Failures become status
//! messages on the stream; nothing is raised to the caller. A fixed delay
//! separates consecutive URLs.

use crate::collection::CourseCollection;
use crate::course::{payload_items, CourseRecord};
use crate::display::{log_course_card, log_error_card};
use crate::export::save_json;
use crate::service::{ExtractRequest, ExtractionService};
use crate::ExtractorError;
use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(3);

/// Filename written by [`extract_all_courses`]
pub const BATCH_OUTPUT_FILE: &str = "courses_full.json";

/// Timing knobs for the extraction loop
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Watchdog limit for a single extraction call
    pub timeout: Duration,
    /// Delay between consecutive URLs
    pub throttle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            throttle: DEFAULT_THROTTLE,
        }
    }
}

/// Progress report for one URL
#[derive(Clone, Debug, PartialEq)]
pub enum StatusMessage {
    Started {
        index: usize,
        total: usize,
        url: String,
    },
    TimedOut {
        url: String,
        limit: Duration,
    },
    Failed {
        url: String,
        error: String,
    },
    NoData {
        url: String,
    },
    Completed {
        url: String,
        records: usize,
    },
}

impl StatusMessage {
    pub fn url(&self) -> &str {
        match self {
            StatusMessage::Started { url, .. }
            | StatusMessage::TimedOut { url, .. }
            | StatusMessage::Failed { url, .. }
            | StatusMessage::NoData { url }
            | StatusMessage::Completed { url, .. } => url,
        }
    }

    /// True for the outcomes that produced no records
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StatusMessage::TimedOut { .. } | StatusMessage::Failed { .. } | StatusMessage::NoData { .. }
        )
    }

    /// True for the final message of a URL
    pub fn is_outcome(&self) -> bool {
        !matches!(self, StatusMessage::Started { .. })
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Started { index, total, url } => {
                write!(f, "[{index}/{total}] Extracting from {url}")
            }
            StatusMessage::TimedOut { url, limit } => {
                write!(f, "⏰ Timeout extracting {url} ({}s limit)", limit.as_secs())
            }
            StatusMessage::Failed { url, error } => {
                write!(f, "❌ Error extracting {url}: {error}")
            }
            StatusMessage::NoData { url } => write!(f, "⚠️ No data for {url}"),
            StatusMessage::Completed { url, records } => {
                write!(f, "✅ Extracted {records} course(s) from {url}")
            }
        }
    }
}

/// Item yielded by [`CourseExtractor::extract_courses`]
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractionEvent {
    Status(StatusMessage),
    Course(CourseRecord),
}

impl ExtractionEvent {
    pub fn as_course(&self) -> Option<&CourseRecord> {
        match self {
            ExtractionEvent::Course(course) => Some(course),
            ExtractionEvent::Status(_) => None,
        }
    }

    pub fn as_status(&self) -> Option<&StatusMessage> {
        match self {
            ExtractionEvent::Status(status) => Some(status),
            ExtractionEvent::Course(_) => None,
        }
    }
}

impl fmt::Display for ExtractionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionEvent::Status(status) => status.fmt(f),
            ExtractionEvent::Course(course) => {
                write!(f, "🎓 {} ({})", course.display_name(), course.source_url)
            }
        }
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = ExtractionEvent> + Send>>;

/// Runs course extraction over a list of URLs
#[derive(Clone)]
pub struct CourseExtractor {
    service: Arc<dyn ExtractionService>,
    config: PipelineConfig,
}

impl CourseExtractor {
    pub fn new(service: Arc<dyn ExtractionService>) -> Self {
        Self::with_config(service, PipelineConfig::default())
    }

    pub fn with_config(service: Arc<dyn ExtractionService>, config: PipelineConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Lazily extract courses from `urls`.
    ///
    /// For every URL one `Started` status is yielded, followed by zero or more
    /// `Course` events and exactly one outcome status (`Completed`, `NoData`,
    /// `Failed` or `TimedOut`). Nothing happens until the stream is polled.
    pub fn extract_courses<I>(&self, urls: I) -> EventStream
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let service = Arc::clone(&self.service);
        let config = self.config.clone();

        Box::pin(stream! {
            let total = urls.len();
            for (i, url) in urls.into_iter().enumerate() {
                if i > 0 && !config.throttle.is_zero() {
                    debug!(delay = ?config.throttle, "Waiting before next URL");
                    tokio::time::sleep(config.throttle).await;
                }

                yield ExtractionEvent::Status(StatusMessage::Started {
                    index: i + 1,
                    total,
                    url: url.clone(),
                });

                let data = match run_with_watchdog(&service, &url, config.timeout).await {
                    Ok(data) => data,
                    Err(status) => {
                        yield ExtractionEvent::Status(status);
                        continue;
                    }
                };

                let records: Vec<CourseRecord> = payload_items(data)
                    .into_iter()
                    .filter_map(|item| CourseRecord::from_value(Value::Object(item), &url))
                    .collect();

                if records.is_empty() {
                    info!(url = %url, "Service returned no course objects");
                    yield ExtractionEvent::Status(StatusMessage::NoData { url });
                    continue;
                }

                let count = records.len();
                for record in records {
                    yield ExtractionEvent::Course(record);
                }
                info!(url = %url, records = count, "Extraction completed");
                yield ExtractionEvent::Status(StatusMessage::Completed { url, records: count });
            }
        })
    }
}

/// One service call under the watchdog. Every failure comes back as the status to report.
async fn run_with_watchdog(
    service: &Arc<dyn ExtractionService>,
    url: &str,
    limit: Duration,
) -> Result<Value, StatusMessage> {
    let failed = |error: String| StatusMessage::Failed {
        url: url.to_string(),
        error,
    };

    let request = ExtractRequest::course(url).map_err(|e| failed(e.to_string()))?;
    let service = Arc::clone(service);
    debug!(url = %url, service = service.name(), "Starting extraction");

    let mut handle = tokio::spawn(async move { service.extract(&request).await });

    match tokio::time::timeout(limit, &mut handle).await {
        Err(_) => {
            handle.abort();
            warn!(url = %url, limit = ?limit, "Extraction timed out");
            Err(StatusMessage::TimedOut {
                url: url.to_string(),
                limit,
            })
        }
        Ok(Err(join_error)) => {
            warn!(url = %url, error = %join_error, "Extraction task did not finish");
            Err(failed(format!("extraction task failed: {join_error}")))
        }
        Ok(Ok(Err(e))) => {
            log_error_card(url, &e);
            Err(failed(e.to_string()))
        }
        Ok(Ok(Ok(None))) | Ok(Ok(Ok(Some(Value::Null)))) => {
            info!(url = %url, "No result");
            Err(StatusMessage::NoData {
                url: url.to_string(),
            })
        }
        Ok(Ok(Ok(Some(data)))) => Ok(data),
    }
}

/// Totals gathered while draining an extraction stream
#[derive(Debug, Default)]
pub struct ExtractionSummary {
    pub courses: CourseCollection,
    pub attempted: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub messages: Vec<String>,
}

/// Drain `events` into a deduplicated collection, calling `on_event` for each event as it arrives.
pub async fn collect_courses<S, F>(events: S, mut on_event: F) -> ExtractionSummary
where
    S: Stream<Item = ExtractionEvent>,
    F: FnMut(&ExtractionEvent, &CourseCollection),
{
    let mut summary = ExtractionSummary::default();
    futures::pin_mut!(events);

    while let Some(event) = events.next().await {
        match &event {
            ExtractionEvent::Status(status) => {
                match status {
                    StatusMessage::Started { .. } => summary.attempted += 1,
                    s if s.is_failure() => summary.failed += 1,
                    _ => {}
                }
                summary.messages.push(status.to_string());
            }
            ExtractionEvent::Course(course) => {
                if !summary.courses.insert(course.clone()) {
                    debug!(course = course.display_name(), "Skipping duplicate or unnamed course");
                    summary.duplicates += 1;
                }
            }
        }
        on_event(&event, &summary.courses);
    }

    summary
}

/// Batch entry point: extract every URL, keep unique courses and write them to `output`.
pub async fn extract_all_courses<I>(
    extractor: &CourseExtractor,
    urls: I,
    output: impl AsRef<Path>,
) -> Result<Vec<CourseRecord>, ExtractorError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let summary = collect_courses(extractor.extract_courses(urls), |event, _| {
        if let ExtractionEvent::Status(status) = event {
            info!("{status}");
        }
    })
    .await;

    let courses = summary.courses.into_records();
    for (i, course) in courses.iter().enumerate() {
        log_course_card(course, i);
    }
    save_json(output, &courses)?;
    Ok(courses)
}
