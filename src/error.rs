use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("URL scheme not allowed: {0}")]
    InvalidUrlScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Domain is blocked: {0}")]
    DomainBlocked(String),

    #[error("Domain is not in the allowed list: {0}")]
    DomainNotAllowed(String),

    #[error("Failed to reach extraction service: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("External service error: {service} - {message}")]
    ExternalServiceError { service: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ExtractorError {
    /// Whether the error was raised while checking user input, before any network use.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ExtractorError::UrlParseError(_)
                | ExtractorError::InvalidUrlScheme(_)
                | ExtractorError::MissingHost(_)
                | ExtractorError::DomainBlocked(_)
                | ExtractorError::DomainNotAllowed(_)
        )
    }

    pub fn log(&self) {
        match self {
            ExtractorError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            ExtractorError::InvalidUrlScheme(scheme) => {
                warn!(scheme = %scheme, "URL scheme rejected");
            }
            ExtractorError::MissingHost(url) => {
                warn!(url = %url, "URL has no host");
            }
            ExtractorError::DomainBlocked(host) => {
                warn!(host = %host, "Domain blocked");
            }
            ExtractorError::DomainNotAllowed(host) => {
                warn!(host = %host, "Domain not in allow list");
            }
            ExtractorError::FetchError(e) => {
                error!(error = %e, "Extraction request failed");
            }
            ExtractorError::TimeoutError(e) => {
                warn!(error = %e, "Extraction timed out");
            }
            ExtractorError::RateLimitError(e) => {
                warn!(error = %e, "Rate limit exceeded");
            }
            ExtractorError::ExternalServiceError { service, message } => {
                error!(
                    service = %service,
                    error = %message,
                    "External service error occurred"
                );
            }
            ExtractorError::ParseError(e) => {
                error!(error = %e, "JSON parsing failed");
            }
            ExtractorError::IoError(e) => {
                error!(error = %e, "File operation failed");
            }
            ExtractorError::InvalidConfiguration(e) => {
                error!(error = %e, "Invalid configuration");
            }
        }
    }
}
