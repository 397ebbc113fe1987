//! Paginated book search against the Kakao book search API.
//!
//! # Overview
//!
//! - [`SearchRequest`] - validated query, target field, sort order and paging bounds
//! - [`BookSearchClient`] - fetches pages in order with retry and backoff
//! - [`SearchResults`] - collected records plus what the fetch went through
//! - [`RetryPolicy`] - backoff policy shared by every page request
//!
//! # Example
//!
//! ```no_run
//! use bookmatch_core::config::SearchConfig;
//! use bookmatch_core::search::{BookSearchClient, SearchRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchConfig::new(Some("REST_API_KEY".to_string()));
//! let client = BookSearchClient::new(&config)?;
//! let results = client.fetch_all(&SearchRequest::for_query("데미안")?).await?;
//! println!("{} records", results.records().len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod http_client;
mod retry;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use client::BookSearchClient;
pub use error::FetchError;
pub use http_client::{build_search_http_client, search_user_agent};
pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy,
    classify_http_status,
};

use crate::config::ConfigError;
use crate::record::RawRecord;

/// Largest page size the API accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default page ceiling.
pub const DEFAULT_MAX_PAGES: u32 = 20;

/// Field the search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTarget {
    #[default]
    Title,
    Isbn,
    Publisher,
    Person,
}

impl SearchTarget {
    /// Returns the API parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Isbn => "isbn",
            Self::Publisher => "publisher",
            Self::Person => "person",
        }
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "isbn" => Ok(Self::Isbn),
            "publisher" => Ok(Self::Publisher),
            "person" => Ok(Self::Person),
            _ => Err(format!("invalid search target: {s}")),
        }
    }
}

/// Result ordering requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Accuracy,
    Latest,
}

impl SortOrder {
    /// Returns the API parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Latest => "latest",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accuracy" => Ok(Self::Accuracy),
            "latest" => Ok(Self::Latest),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// A validated search: once built, every field is within the API's limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    target: SearchTarget,
    sort: SortOrder,
    page_size: u32,
    max_pages: u32,
}

impl SearchRequest {
    /// Builds a request from every parameter.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyQuery`] for a blank query
    /// - [`ConfigError::PageSizeOutOfRange`] unless `1 <= page_size <= 50`
    /// - [`ConfigError::MaxPagesOutOfRange`] when `max_pages` is zero
    pub fn new(
        query: impl Into<String>,
        target: SearchTarget,
        sort: SortOrder,
        page_size: u32,
        max_pages: u32,
    ) -> Result<Self, ConfigError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::PageSizeOutOfRange { size: page_size });
        }
        if max_pages == 0 {
            return Err(ConfigError::MaxPagesOutOfRange { max_pages });
        }
        Ok(Self {
            query,
            target,
            sort,
            page_size,
            max_pages,
        })
    }

    /// Title search by accuracy with default paging.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyQuery`] for a blank query.
    pub fn for_query(query: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(
            query,
            SearchTarget::default(),
            SortOrder::default(),
            DEFAULT_PAGE_SIZE,
            DEFAULT_MAX_PAGES,
        )
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn target(&self) -> SearchTarget {
        self.target
    }

    #[must_use]
    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}

/// Outcome of a completed [`BookSearchClient::fetch_all`].
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub(crate) records: Vec<RawRecord>,
    pub(crate) pages_fetched: u32,
    pub(crate) requests_made: u32,
    pub(crate) reached_end: bool,
    pub(crate) total_count: Option<u64>,
    pub(crate) backoff_waits: Vec<Duration>,
}

impl SearchResults {
    /// Records from every page, in API order.
    #[must_use]
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    /// Pages that returned successfully.
    #[must_use]
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// HTTP requests sent, retries included.
    #[must_use]
    pub fn requests_made(&self) -> u32 {
        self.requests_made
    }

    /// True when the API reported `meta.is_end`.
    #[must_use]
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    /// True when the page ceiling stopped the fetch before `meta.is_end`.
    ///
    /// Truncation is not an error: the records gathered so far are complete
    /// pages, there are just more results the API would have served.
    #[must_use]
    pub fn truncated(&self) -> bool {
        !self.reached_end
    }

    /// `meta.total_count` from the last page, when the API sent it.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Backoff sleeps taken before retries, in order.
    #[must_use]
    pub fn backoff_waits(&self) -> &[Duration] {
        &self.backoff_waits
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = SearchRequest::for_query("rust").unwrap();
        assert_eq!(request.query(), "rust");
        assert_eq!(request.target(), SearchTarget::Title);
        assert_eq!(request.sort(), SortOrder::Accuracy);
        assert_eq!(request.page_size(), 50);
        assert_eq!(request.max_pages(), 20);
    }

    #[test]
    fn test_request_rejects_blank_query() {
        assert_eq!(
            SearchRequest::for_query("   ").unwrap_err(),
            ConfigError::EmptyQuery
        );
    }

    #[test]
    fn test_request_page_size_bounds() {
        let build = |size| SearchRequest::new("q", SearchTarget::Title, SortOrder::Latest, size, 1);
        assert!(build(1).is_ok());
        assert!(build(50).is_ok());
        assert_eq!(
            build(0).unwrap_err(),
            ConfigError::PageSizeOutOfRange { size: 0 }
        );
        assert_eq!(
            build(51).unwrap_err(),
            ConfigError::PageSizeOutOfRange { size: 51 }
        );
    }

    #[test]
    fn test_request_rejects_zero_max_pages() {
        let err = SearchRequest::new("q", SearchTarget::Isbn, SortOrder::Accuracy, 10, 0).unwrap_err();
        assert_eq!(err, ConfigError::MaxPagesOutOfRange { max_pages: 0 });
    }

    #[test]
    fn test_target_and_sort_round_trip_strings() {
        for target in [
            SearchTarget::Title,
            SearchTarget::Isbn,
            SearchTarget::Publisher,
            SearchTarget::Person,
        ] {
            assert_eq!(target.as_str().parse::<SearchTarget>().unwrap(), target);
        }
        assert_eq!("latest".parse::<SortOrder>().unwrap(), SortOrder::Latest);
        assert!("newest".parse::<SortOrder>().is_err());
        assert!("author".parse::<SearchTarget>().is_err());
    }

    #[test]
    fn test_results_truncated_unless_end_reached() {
        let mut results = SearchResults::default();
        assert!(results.truncated());
        results.reached_end = true;
        assert!(!results.truncated());
    }
}
