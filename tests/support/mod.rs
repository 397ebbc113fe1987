//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::time::Duration;

use bookmatch_core::{RetryPolicy, SearchConfig};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Search endpoint path served by the mock server.
pub const SEARCH_PATH: &str = "/v3/search/book";

/// API key the tests configure.
pub const TEST_API_KEY: &str = "test-key";

/// Backoff base used in tests so retries stay fast.
pub const TEST_BASE_DELAY: Duration = Duration::from_millis(10);

pub fn search_url(server: &MockServer) -> String {
    format!("{}{SEARCH_PATH}", server.uri())
}

/// Config pointed at `server`, with no page pause and a short backoff.
pub fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig::new(Some(TEST_API_KEY.to_string()))
        .with_base_url(search_url(server))
        .with_page_delay(Duration::ZERO)
        .with_retry_policy(RetryPolicy::new(3, TEST_BASE_DELAY))
}

/// A plausible search document with a 13-digit ISBN derived from `n`.
pub fn book(n: u32) -> Value {
    json!({
        "title": format!("Book {n}"),
        "contents": "",
        "url": format!("https://search.example/book/{n}"),
        "isbn": format!("{:010} {:013}", n, 9_780_000_000_000_u64 + u64::from(n)),
        "datetime": "2020-01-02T00:00:00.000+09:00",
        "authors": [format!("Author {n}")],
        "publisher": "Pub",
        "translators": [],
        "price": 10_000,
        "sale_price": 9_000,
        "thumbnail": "",
        "status": "정상판매",
    })
}

/// A search response page body.
pub fn page(documents: Vec<Value>, is_end: bool) -> Value {
    let count = documents.len();
    json!({
        "documents": documents,
        "meta": {"is_end": is_end, "pageable_count": count, "total_count": count},
    })
}
