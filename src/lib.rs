//! Extract structured course details from university course pages.
//!
//! URLs are validated locally, sent one at a time to a hosted extraction
//! service, and the returned objects are normalized into [`CourseRecord`]s
//! that are deduplicated by course name.

mod collection;
mod config;
mod course;
mod display;
mod error;
mod export;
mod firecrawl;
#[cfg(feature = "logging")]
mod logging;
mod pipeline;
mod service;
mod utils;
mod validation;

pub use collection::{CollectionStats, CourseCollection, CourseFilter, SortKey};
pub use config::{ApiKeyValidator, AppConfig};
pub use course::{course_schema, payload_items, CourseRecord, COURSE_FIELDS, COURSE_PROMPT};
pub use display::{log_course_card, log_error_card, render_course_card};
pub use error::ExtractorError;
pub use export::{load_json, save_json, to_json_pretty, DEFAULT_OUTPUT_FILE};
pub use firecrawl::{FirecrawlConfig, FirecrawlService, DEFAULT_API_URL};
#[cfg(feature = "logging")]
pub use logging::{setup_logging, LogConfig, LogLevelGuard};
pub use pipeline::{
    collect_courses, extract_all_courses, CourseExtractor, EventStream, ExtractionEvent,
    ExtractionSummary, PipelineConfig, StatusMessage, BATCH_OUTPUT_FILE, DEFAULT_THROTTLE,
    DEFAULT_TIMEOUT,
};
pub use service::{ExtractRequest, ExtractionService, MockService};
pub use utils::truncate_str;
pub use validation::{
    parse_url_list, InvalidUrl, UrlBatch, UrlValidationConfig, UrlValidator, ValidUrl,
};

/// Course pages used by the `--sample` option and in demos
pub const SAMPLE_URLS: [&str; 5] = [
    "https://www.liverpool.ac.uk/courses/accounting-and-finance-bsc-hons",
    "https://www.leedsbeckett.ac.uk/courses/applied-sports-studies-tennis-bsc",
    "https://www.leedsbeckett.ac.uk/courses/accounting-finance-ba",
    "https://www.brighton.ac.uk/courses/study/secondary-biology-pgce.aspx",
    "https://www.hw.ac.uk/study/postgraduate/actuarial-management-with-data-science",
];
