//! Retry logic with exponential backoff for transient page failures.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying page request errors and determining retry behavior.
//!
//! # Overview
//!
//! When a page request fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - 5xx responses, timeouts, dropped connections
//! - [`FailureType::RateLimited`] - HTTP 429
//! - [`FailureType::Permanent`] - everything else; raised immediately
//!
//! The [`RetryPolicy`] then decides whether to retry the same page and how
//! long to wait, doubling the delay on each failed attempt.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bookmatch_core::search::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let failure = policy.classify_status(503);
//!
//! match policy.should_retry(failure, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_millis(500));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("unexpected: {reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (500ms).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;

/// Classification of page request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: network timeout, 5xx server errors, connection refused.
    Transient,

    /// Server rate limiting (HTTP 429). Retried with the same backoff.
    RateLimited,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 400 Bad Request, 401 Unauthorized, invalid request URL.
    Permanent,
}

impl FailureType {
    /// Returns true for failure types the policy may retry.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }
}

/// Decision on whether to retry a failed page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the request.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_retries`: 3 (4 attempts in total)
/// - `base_delay`: 500ms
/// - `backoff_multiplier`: 2
/// - status classifier: [`classify_http_status`]
///
/// # Delay Calculation
///
/// ```text
/// delay = base_delay * multiplier^(attempt - 1)
/// ```
///
/// With defaults, delays after the first three failures are 0.5s, 1s and 2s.
/// Delays are not capped; the retry budget bounds the total wait.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    max_retries: u32,

    /// Delay after the first failed attempt.
    base_delay: Duration,

    /// Multiplier applied each attempt (2 for doubling).
    backoff_multiplier: u32,

    /// Decides which HTTP statuses are worth retrying.
    status_classifier: fn(u16) -> FailureType,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            status_classifier: classify_http_status,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a retry budget and base delay, other settings default.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Creates a policy with a custom retry budget, using defaults for other settings.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Replaces the HTTP status classifier.
    #[must_use]
    pub fn with_status_classifier(mut self, classifier: fn(u16) -> FailureType) -> Self {
        self.status_classifier = classifier;
        self
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts per page, including the initial one.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Classifies an HTTP status with this policy's classifier.
    #[must_use]
    pub fn classify_status(&self, status: u16) -> FailureType {
        (self.status_classifier)(status)
    }

    /// Determines whether to retry a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if !failure_type.is_retryable() {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt > self.max_retries {
            debug!(attempt, max = self.max_retries, "retry budget spent");
            return RetryDecision::DoNotRetry {
                reason: format!("retry budget ({}) exhausted", self.max_retries),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Delay to wait after `attempt` failed: `base * multiplier^(attempt - 1)`.
    ///
    /// Saturates at [`Duration::MAX`] on overflow.
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        self.backoff_multiplier
            .checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Classifies an HTTP status code into a failure type.
///
/// | Status | Type |
/// |--------|------|
/// | 429 | RateLimited |
/// | 500-599 | Transient |
/// | anything else | Permanent |
///
/// Other 4xx statuses (400, 401, 403, 404, 408, ...) are raised immediately.
#[must_use]
pub fn classify_http_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        500..=599 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}
