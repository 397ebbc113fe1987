//! HTTP client construction policy for the search API.
//!
//! One place decides timeout, user-agent and compression so every page
//! request of a fetch shares the same connection pool and settings.

use std::time::Duration;

use reqwest::Client;

use super::FetchError;

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/bookmatch";

/// Connect timeout; never longer than the overall request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent sent with every search request.
#[must_use]
pub fn search_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookmatch/{version} (book-metadata-collector; +{PROJECT_UA_URL})")
}

/// Builds the search HTTP client.
///
/// `timeout` bounds each individual request attempt, not a whole fetch.
///
/// # Errors
///
/// Returns [`FetchError::Client`] when client construction fails.
pub fn build_search_http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .user_agent(search_user_agent())
        .gzip(true)
        .build()
        .map_err(|error| FetchError::Client {
            reason: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_version_and_project_url() {
        let ua = search_user_agent();
        assert_eq!(
            ua.strip_prefix("bookmatch/")
                .and_then(|rest| rest.split(' ').next()),
            Some(env!("CARGO_PKG_VERSION")),
            "UA must carry the crate version: {ua}"
        );
        assert!(ua.contains(PROJECT_UA_URL));
    }

    #[test]
    fn test_build_client_succeeds() {
        assert!(build_search_http_client(Duration::from_secs(10)).is_ok());
    }
}
