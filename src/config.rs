//! Environment configuration and API key validation

use crate::firecrawl::{FirecrawlConfig, FirecrawlService, DEFAULT_API_URL};
use crate::pipeline::PipelineConfig;
use crate::ExtractorError;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// API key validation utilities
pub struct ApiKeyValidator;

impl ApiKeyValidator {
    /// Validate Firecrawl API key format
    pub fn validate_firecrawl_key(api_key: &str) -> Result<(), ExtractorError> {
        if api_key.is_empty() {
            return Err(ExtractorError::InvalidConfiguration(
                "Firecrawl API key cannot be empty".to_string(),
            ));
        }

        if !api_key.starts_with("fc-") {
            return Err(ExtractorError::InvalidConfiguration(
                "Firecrawl API key must start with 'fc-'".to_string(),
            ));
        }

        if api_key.len() < 12 {
            return Err(ExtractorError::InvalidConfiguration(
                "Firecrawl API key appears to be too short".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings read from the process environment (and `.env`, if present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub firecrawl_api_key: String,
    pub firecrawl_api_url: String,
    pub timeout: Duration,
    pub delay: Duration,
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Load `.env` and read the configuration. `FIRECRAWL_API_KEY` is required.
    pub fn from_env() -> Result<Self, ExtractorError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ExtractorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let firecrawl_api_key = lookup("FIRECRAWL_API_KEY").ok_or_else(|| {
            ExtractorError::InvalidConfiguration(
                "FIRECRAWL_API_KEY not set in environment or .env file".to_string(),
            )
        })?;
        ApiKeyValidator::validate_firecrawl_key(firecrawl_api_key.trim())?;

        let defaults = PipelineConfig::default();
        let config = Self {
            firecrawl_api_key: firecrawl_api_key.trim().to_string(),
            firecrawl_api_url: lookup("FIRECRAWL_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: parse_or(&lookup, "EXTRACT_TIMEOUT_SECS", defaults.timeout.as_secs())
                .map(Duration::from_secs)?,
            delay: parse_or(&lookup, "EXTRACT_DELAY_SECS", defaults.throttle.as_secs())
                .map(Duration::from_secs)?,
            poll_interval: parse_or(&lookup, "EXTRACT_POLL_INTERVAL_MS", 1000)
                .map(Duration::from_millis)?,
        };

        debug!(
            api_url = %config.firecrawl_api_url,
            timeout = ?config.timeout,
            delay = ?config.delay,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            timeout: self.timeout,
            throttle: self.delay,
        }
    }

    pub fn firecrawl_config(&self) -> FirecrawlConfig {
        FirecrawlConfig {
            api_key: self.firecrawl_api_key.clone(),
            base_url: self.firecrawl_api_url.clone(),
            poll_interval: self.poll_interval,
            ..Default::default()
        }
    }

    /// Create the Firecrawl service described by this configuration
    pub fn firecrawl_service(&self) -> Result<FirecrawlService, ExtractorError> {
        FirecrawlService::new(self.firecrawl_config())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ExtractorError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            ExtractorError::InvalidConfiguration(format!("{key} must be a valid number, got '{raw}'"))
        }),
        None => Ok(default),
    }
}
