//! Paginated search client.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{ConfigError, SearchConfig};
use crate::record::RawRecord;

use super::error::AttemptError;
use super::http_client::build_search_http_client;
use super::retry::{RetryDecision, RetryPolicy};
use super::{FetchError, SearchRequest, SearchResults};

/// One page of the search API response.
#[derive(Debug, Deserialize)]
struct SearchPage {
    documents: Vec<RawRecord>,
    #[serde(default)]
    meta: Option<SearchMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMeta {
    #[serde(default)]
    is_end: Option<bool>,
    #[serde(default)]
    total_count: Option<u64>,
}

/// Client for the book search API.
///
/// Holds one pooled [`reqwest::Client`] reused for every page of every
/// [`fetch_all`](Self::fetch_all) call.
#[derive(Debug, Clone)]
pub struct BookSearchClient {
    client: Client,
    base_url: Url,
    auth_header: String,
    retry: RetryPolicy,
    page_delay: Duration,
}

impl BookSearchClient {
    /// Creates a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingApiKey`] when no credential is configured
    /// - [`ConfigError::InvalidBaseUrl`] when the endpoint is not an http(s) URL
    /// - [`FetchError::Client`] when the HTTP client cannot be built
    pub fn new(config: &SearchConfig) -> Result<Self, FetchError> {
        let api_key = config.api_key()?;
        let base_url = parse_base_url(config.base_url())?;
        let client = build_search_http_client(config.timeout())?;

        Ok(Self {
            client,
            base_url,
            auth_header: format!("KakaoAK {api_key}"),
            retry: config.retry_policy().clone(),
            page_delay: config.page_delay(),
        })
    }

    /// Endpoint the client sends requests to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches every page of `request` in order.
    ///
    /// Stops when a page reports `meta.is_end` or after `max_pages` pages.
    /// Pages are requested one at a time with the configured pause between
    /// them; a failing page is retried per the [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] aborts the fetch and discards earlier pages.
    #[instrument(
        skip(self, request),
        fields(query = %request.query(), target = %request.target(), sort = %request.sort())
    )]
    pub async fn fetch_all(&self, request: &SearchRequest) -> Result<SearchResults, FetchError> {
        let mut results = SearchResults::default();
        let max_pages = request.max_pages();

        for page in 1..=max_pages {
            let body = self.fetch_page(request, page, &mut results).await?;
            let parsed = parse_page(page, &body)?;
            let meta = parsed.meta.unwrap_or_default();

            debug!(
                page,
                documents = parsed.documents.len(),
                is_end = ?meta.is_end,
                "page fetched"
            );

            results.pages_fetched += 1;
            results.records.extend(parsed.documents);
            if meta.total_count.is_some() {
                results.total_count = meta.total_count;
            }

            if meta.is_end.unwrap_or(false) {
                results.reached_end = true;
                break;
            }

            if page < max_pages && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        if results.truncated() {
            warn!(
                max_pages,
                records = results.records.len(),
                total_count = ?results.total_count,
                "page limit reached before the last page; results are truncated"
            );
        }

        info!(
            pages = results.pages_fetched,
            requests = results.requests_made,
            records = results.records.len(),
            "search fetch complete"
        );

        Ok(results)
    }

    /// Requests one page, retrying transient failures, and returns the body.
    async fn fetch_page(
        &self,
        request: &SearchRequest,
        page: u32,
        results: &mut SearchResults,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.page_url(request, page);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            results.requests_made += 1;
            debug!(page, attempt, "requesting page");

            let error = match self.send(&url).await {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };

            let failure_type = error.failure_type(&self.retry);
            if !failure_type.is_retryable() {
                return Err(error.into_permanent(page));
            }

            match self.retry.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        page,
                        attempt = next_attempt,
                        max_attempts = self.retry.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying page"
                    );
                    results.backoff_waits.push(delay);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(page, attempt, %reason, error = %error, "giving up on page");
                    return Err(error.into_exhausted(page, attempt));
                }
            }
        }
    }

    /// Sends one request; any non-2xx status is an [`AttemptError`].
    async fn send(&self, url: &Url) -> Result<Vec<u8>, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::status(status.as_u16(), &body));
        }

        let body = response.bytes().await.map_err(AttemptError::from_reqwest)?;
        Ok(body.to_vec())
    }

    fn page_url(&self, request: &SearchRequest, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("query", request.query())
            .append_pair("target", request.target().as_str())
            .append_pair("sort", request.sort().as_str())
            .append_pair("page", &page.to_string())
            .append_pair("size", &request.page_size().to_string());
        url
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|error| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: error.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

fn parse_page(page: u32, body: &[u8]) -> Result<SearchPage, FetchError> {
    serde_json::from_slice(body).map_err(|error| FetchError::MalformedResponse {
        page,
        reason: error.to_string(),
    })
}
