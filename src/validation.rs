//! Checking user-supplied course URLs before they reach the extraction service

use crate::error::ExtractorError;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Configuration for URL validation
#[derive(Debug, Clone)]
pub struct UrlValidationConfig {
    /// Allowed URL schemes (default: ["http", "https"])
    pub allowed_schemes: HashSet<String>,
    /// Domain blacklist
    pub blocked_domains: HashSet<String>,
    /// Domain whitelist (if not empty, only these domains are allowed)
    pub allowed_domains: HashSet<String>,
}

impl Default for UrlValidationConfig {
    fn default() -> Self {
        let mut allowed_schemes = HashSet::new();
        allowed_schemes.insert("http".to_string());
        allowed_schemes.insert("https".to_string());

        Self {
            allowed_schemes,
            blocked_domains: HashSet::new(),
            allowed_domains: HashSet::new(),
        }
    }
}

/// A line of user input that did not pass validation.
#[derive(Debug)]
pub struct InvalidUrl {
    pub input: String,
    pub reason: ExtractorError,
}

/// A line of user input that passed validation. `input` is the trimmed line as typed.
#[derive(Debug, Clone)]
pub struct ValidUrl {
    pub input: String,
    pub url: Url,
}

/// Result of splitting user input into URLs, order preserved within each list.
#[derive(Debug, Default)]
pub struct UrlBatch {
    pub valid: Vec<ValidUrl>,
    pub invalid: Vec<InvalidUrl>,
}

impl UrlBatch {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }

    /// Valid URLs exactly as entered, without the parser's normalization
    pub fn valid_strings(&self) -> Vec<String> {
        self.valid.iter().map(|valid| valid.input.clone()).collect()
    }
}

/// Checks that course URLs are well formed before anything is sent to the extraction service
#[derive(Clone)]
pub struct UrlValidator {
    config: UrlValidationConfig,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::with_default_config()
    }
}

impl UrlValidator {
    pub fn new(config: UrlValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(UrlValidationConfig::default())
    }

    /// Validates a URL string: it must parse and carry both a scheme and a host
    pub fn validate(&self, url_str: &str) -> Result<Url, ExtractorError> {
        let url = Url::parse(url_str.trim())?;

        if !self.config.allowed_schemes.contains(url.scheme()) {
            return Err(ExtractorError::InvalidUrlScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ExtractorError::MissingHost(url_str.trim().to_string()))?;

        if !self.config.allowed_domains.is_empty() {
            if !self.is_domain_allowed(host) {
                return Err(ExtractorError::DomainNotAllowed(host.to_string()));
            }
        } else if self.is_domain_blocked(host) {
            return Err(ExtractorError::DomainBlocked(host.to_string()));
        }

        Ok(url)
    }

    /// Splits newline-separated input, drops blank lines and sorts each line into valid or invalid.
    pub fn parse_url_list(&self, text: &str) -> UrlBatch {
        let mut batch = UrlBatch::default();

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            match self.validate(line) {
                Ok(url) => batch.valid.push(ValidUrl {
                    input: line.to_string(),
                    url,
                }),
                Err(reason) => {
                    debug!(input = %line, error = %reason, "Rejected URL");
                    batch.invalid.push(InvalidUrl {
                        input: line.to_string(),
                        reason,
                    });
                }
            }
        }

        batch
    }

    fn is_domain_allowed(&self, host: &str) -> bool {
        self.config
            .allowed_domains
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }

    fn is_domain_blocked(&self, host: &str) -> bool {
        self.config
            .blocked_domains
            .iter()
            .any(|blocked| host == blocked || host.ends_with(&format!(".{blocked}")))
    }
}

/// Parse newline-separated URLs with the default validator.
pub fn parse_url_list(text: &str) -> UrlBatch {
    UrlValidator::with_default_config().parse_url_list(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validator_schemes() {
        let validator = UrlValidator::with_default_config();

        assert!(validator.validate("https://www.hw.ac.uk/study/postgraduate").is_ok());
        assert!(validator.validate("http://example.com").is_ok());
        assert!(validator.validate("ftp://example.com").is_err());
        assert!(validator.validate("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_url_validator_requires_host() {
        let validator = UrlValidator::with_default_config();

        assert!(matches!(
            validator.validate("www.liverpool.ac.uk/courses"),
            Err(ExtractorError::UrlParseError(_))
        ));
        assert!(validator.validate("https://").is_err());

        let mut config = UrlValidationConfig::default();
        config.allowed_schemes.insert("mailto".to_string());
        let validator = UrlValidator::new(config);
        assert!(matches!(
            validator.validate("mailto:admissions@example.ac.uk"),
            Err(ExtractorError::MissingHost(_))
        ));
    }

    #[test]
    fn test_local_and_private_hosts_are_valid() {
        let batch = parse_url_list(
            "http://localhost:8000/courses/cs\nhttp://10.1.2.3/courses/cs\nhttp://[::1]/courses",
        );

        assert_eq!(batch.valid.len(), 3);
        assert!(batch.invalid.is_empty());
        assert_eq!(batch.valid[0].url.host_str(), Some("localhost"));
    }

    #[test]
    fn test_url_validator_domain_lists() {
        let mut config = UrlValidationConfig::default();
        config.blocked_domains.insert("evil.com".to_string());
        let validator = UrlValidator::new(config);

        assert!(validator.validate("http://evil.com").is_err());
        assert!(validator.validate("http://sub.evil.com").is_err());
        assert!(validator.validate("http://good.com").is_ok());

        let mut config = UrlValidationConfig::default();
        config.allowed_domains.insert("ac.uk".to_string());
        let validator = UrlValidator::new(config);

        assert!(validator.validate("https://www.brighton.ac.uk").is_ok());
        assert!(validator.validate("https://www.cesarritzcolleges.edu").is_err());
    }

    #[test]
    fn test_parse_url_list() {
        let input = "
            https://www.liverpool.ac.uk/courses/accounting-and-finance-bsc-hons

            not a url
            https://www.leedsbeckett.ac.uk/courses/accounting-finance-ba
            ftp://files.example.com/course
        ";
        let batch = parse_url_list(input);

        assert_eq!(batch.valid.len(), 2);
        assert_eq!(batch.invalid.len(), 2);
        assert_eq!(
            batch.valid[0].input,
            "https://www.liverpool.ac.uk/courses/accounting-and-finance-bsc-hons"
        );
        assert_eq!(batch.invalid[0].input, "not a url");
        assert!(batch.invalid.iter().all(|i| i.reason.is_validation_error()));
    }

    #[test]
    fn test_valid_strings_keep_input_as_typed() {
        let batch = parse_url_list("  https://WWW.CesarRitzColleges.edu  \nhttps://www.hw.ac.uk");

        assert_eq!(
            batch.valid_strings(),
            vec!["https://WWW.CesarRitzColleges.edu", "https://www.hw.ac.uk"]
        );
        assert_eq!(batch.valid[1].url.as_str(), "https://www.hw.ac.uk/");
    }

    #[test]
    fn test_parse_url_list_blank_input() {
        assert!(parse_url_list("   \n\n  ").is_empty());
    }
}
