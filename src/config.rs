//! Explicit runtime configuration.
//!
//! Library code never reads the process environment. The binary builds an
//! [`AppConfig`] once (usually through [`AppConfig::from_env`]) and hands the
//! pieces to the search client and the store at construction time, so tests
//! can inject fake credentials and endpoints directly.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::search::RetryPolicy;

/// Kakao book search endpoint.
pub const DEFAULT_API_URL: &str = "https://dapi.kakao.com/v3/search/book";

/// Environment variable holding the Kakao REST API key.
pub const API_KEY_ENV: &str = "KAKAO_REST_API_KEY";

/// Environment variable overriding the SQLite database path.
pub const DB_PATH_ENV: &str = "BOOKMATCH_DB";

/// Environment variable overriding the search endpoint.
pub const API_URL_ENV: &str = "BOOKMATCH_API_URL";

/// Environment variable overriding the per-request timeout in seconds.
pub const TIMEOUT_ENV: &str = "BOOKMATCH_TIMEOUT_SECS";

/// Default SQLite database file.
pub const DEFAULT_DB_PATH: &str = "books.db";

/// Default timeout for a single page request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between two successful page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(200);

/// Accepted range for the timeout override, in seconds.
const TIMEOUT_SECS_RANGE: std::ops::RangeInclusive<u64> = 1..=300;

/// Pre-flight configuration failures. Always fatal, raised before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No API credential was configured.
    #[error(
        "API key is not configured\n  Suggestion: export {var}='YOUR_REST_API_KEY' before running"
    )]
    MissingApiKey {
        /// Environment variable the binary reads the key from.
        var: &'static str,
    },

    /// Search query is empty or whitespace.
    #[error("search query must not be empty")]
    EmptyQuery,

    /// Page size outside the API's accepted range.
    #[error("page size {size} is out of range (expected 1..=50)")]
    PageSizeOutOfRange {
        /// Rejected value.
        size: u32,
    },

    /// Page ceiling must be at least one.
    #[error("max pages {max_pages} is out of range (expected at least 1)")]
    MaxPagesOutOfRange {
        /// Rejected value.
        max_pages: u32,
    },

    /// Listing limit outside the accepted range.
    #[error("limit {limit} is out of range (expected 1..=100)")]
    LimitOutOfRange {
        /// Rejected value.
        limit: u32,
    },

    /// Search endpoint is not an absolute http(s) URL.
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Rejected URL.
        url: String,
        /// Parse failure or scheme problem.
        reason: String,
    },

    /// Environment variable holds an unusable value.
    #[error("invalid value '{value}' for {var}: expected {expected}")]
    InvalidEnvValue {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
        /// Human description of accepted values.
        expected: &'static str,
    },
}

/// Settings for [`BookSearchClient`](crate::search::BookSearchClient).
#[derive(Clone)]
pub struct SearchConfig {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    page_delay: Duration,
    retry: RetryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            page_delay: DEFAULT_PAGE_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

impl SearchConfig {
    /// Creates a config with the given credential and default settings.
    ///
    /// A blank key is treated as missing.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Overrides the search endpoint (used with wiremock in tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the configured credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when no key is set.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey { var: API_KEY_ENV })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("page_delay", &self.page_delay)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Everything the binary needs to run a command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Search client settings.
    pub search: SearchConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// A missing API key is not an error here; commands that call the API
    /// fail when the search client is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvValue`] for unparseable overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvValue`] for unparseable overrides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = non_empty(DB_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

        let mut search = SearchConfig::new(non_empty(API_KEY_ENV));
        if let Some(url) = non_empty(API_URL_ENV) {
            search = search.with_base_url(url);
        }
        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| TIMEOUT_SECS_RANGE.contains(secs))
                .ok_or(ConfigError::InvalidEnvValue {
                    var: TIMEOUT_ENV,
                    value: raw.clone(),
                    expected: "whole seconds in 1..=300",
                })?;
            search = search.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self { db_path, search })
    }
}
