//! Error types for the search client.

use thiserror::Error;

use crate::config::ConfigError;

use super::retry::{FailureType, RetryPolicy};

/// Terminal failures of [`BookSearchClient::fetch_all`](super::BookSearchClient::fetch_all).
///
/// Any of these aborts the whole fetch; records from earlier pages are not
/// returned.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Pre-flight configuration problem (missing key, bad endpoint).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    Client {
        /// Builder error text.
        reason: String,
    },

    /// Non-retryable HTTP status (4xx other than 429).
    #[error("page {page}: search API returned HTTP {status}: {body}")]
    HttpStatus {
        /// Page being fetched.
        page: u32,
        /// Response status code.
        status: u16,
        /// Response body, truncated for display.
        body: String,
    },

    /// Transient failures persisted past the retry budget.
    #[error(
        "page {page}: request failed after {attempts} attempts (last status: {}): {last_error}",
        .last_status.map_or_else(|| "none".to_string(), |s| s.to_string())
    )]
    RetriesExhausted {
        /// Page being fetched.
        page: u32,
        /// Attempts made for this page.
        attempts: u32,
        /// Status of the last response, if the last attempt got one.
        last_status: Option<u16>,
        /// Message of the last failure.
        last_error: String,
    },

    /// A request failed in a way retrying cannot fix (e.g. invalid request).
    #[error("page {page}: request could not be sent: {reason}")]
    Request {
        /// Page being fetched.
        page: u32,
        /// Underlying error text.
        reason: String,
    },

    /// Successful status but the body is not a search result page.
    #[error("page {page}: malformed search response: {reason}")]
    MalformedResponse {
        /// Page being fetched.
        page: u32,
        /// What was wrong with the body.
        reason: String,
    },
}

impl FetchError {
    /// Page the error is attributed to, when it happened during a page fetch.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::HttpStatus { page, .. }
            | Self::RetriesExhausted { page, .. }
            | Self::Request { page, .. }
            | Self::MalformedResponse { page, .. } => Some(*page),
            Self::Config(_) | Self::Client { .. } => None,
        }
    }

    /// True when the fetch died on failures that were retryable in principle
    /// (the budget ran out), so running it again later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// Last HTTP status observed, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::RetriesExhausted { last_status, .. } => *last_status,
            _ => None,
        }
    }
}

/// Maximum number of response body characters kept in error messages.
const MAX_BODY_CHARS: usize = 300;

/// Failure of a single page attempt, before the retry decision.
#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    /// Response with a non-success status.
    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    /// Request timed out.
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request could not be built.
    #[error("invalid request: {0}")]
    Builder(#[source] reqwest::Error),
}

impl AttemptError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(MAX_BODY_CHARS).collect(),
        }
    }

    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else if error.is_builder() {
            Self::Builder(error)
        } else {
            Self::Network(error)
        }
    }

    pub(crate) fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Timeout(_) | Self::Network(_) | Self::Builder(_) => None,
        }
    }

    /// Classifies the failure for the retry policy.
    pub(crate) fn failure_type(&self, policy: &RetryPolicy) -> FailureType {
        match self {
            Self::Status { status, .. } => policy.classify_status(*status),
            Self::Timeout(_) | Self::Network(_) => FailureType::Transient,
            Self::Builder(_) => FailureType::Permanent,
        }
    }

    /// Converts a non-retryable attempt failure into the terminal error.
    pub(crate) fn into_permanent(self, page: u32) -> FetchError {
        match self {
            Self::Status { status, body } => FetchError::HttpStatus { page, status, body },
            other => FetchError::Request {
                page,
                reason: other.to_string(),
            },
        }
    }

    /// Converts the last transient failure into the budget-exhausted error.
    pub(crate) fn into_exhausted(self, page: u32, attempts: u32) -> FetchError {
        FetchError::RetriesExhausted {
            page,
            attempts,
            last_status: self.http_status(),
            last_error: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message_names_page_and_status() {
        let err = FetchError::RetriesExhausted {
            page: 3,
            attempts: 4,
            last_status: Some(500),
            last_error: "HTTP 500".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("page 3"));
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("500"));
        assert_eq!(err.page(), Some(3));
        assert_eq!(err.status(), Some(500));
        assert!(err.is_transient());
    }

    #[test]
    fn test_retries_exhausted_without_status() {
        let err = FetchError::RetriesExhausted {
            page: 1,
            attempts: 2,
            last_status: None,
            last_error: "network error".to_string(),
        };
        assert!(err.to_string().contains("last status: none"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_attempt_status_body_truncated() {
        let long_body = "x".repeat(1000);
        let AttemptError::Status { body, .. } = AttemptError::status(503, &long_body) else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), MAX_BODY_CHARS);
    }

    #[test]
    fn test_attempt_status_classification() {
        let policy = RetryPolicy::default();
        assert_eq!(
            AttemptError::status(429, "").failure_type(&policy),
            FailureType::RateLimited
        );
        assert_eq!(
            AttemptError::status(502, "").failure_type(&policy),
            FailureType::Transient
        );
        assert_eq!(
            AttemptError::status(401, "").failure_type(&policy),
            FailureType::Permanent
        );
    }

    #[test]
    fn test_permanent_status_maps_to_http_status_error() {
        let err = AttemptError::status(401, "unauthorized").into_permanent(2);
        assert!(matches!(
            err,
            FetchError::HttpStatus { page: 2, status: 401, .. }
        ));
        assert!(err.to_string().contains("unauthorized"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = FetchError::from(ConfigError::EmptyQuery);
        assert_eq!(err.to_string(), ConfigError::EmptyQuery.to_string());
        assert_eq!(err.page(), None);
    }
}
