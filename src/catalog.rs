//! Import and listing operations over the search client and the store.
//!
//! [`Catalog`] is the surface callers use: it runs a search end to end
//! (fetch, dedupe, persist) and reads back stored books. Every error it
//! returns converts into a [`FailureReport`] for display.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ConfigError;
use crate::reconcile::reconcile;
use crate::search::{BookSearchClient, FetchError, SearchRequest};
use crate::store::{BookRepository, StoreError, StoredBook, UpsertAction};

/// Default number of books returned by [`Catalog::list_books`].
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Largest accepted listing limit.
pub const MAX_LIST_LIMIT: u32 = 100;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("search failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("storage failed: {0}")]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Report shape shown to callers; details stay in the logs.
    #[must_use]
    pub fn to_failure_report(&self) -> FailureReport {
        FailureReport::server_error(self.to_string())
    }
}

/// Generic failure shape for anything the catalog cannot complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Always `server_error`.
    pub error: &'static str,
    /// Human-readable cause.
    pub cause: String,
}

impl FailureReport {
    #[must_use]
    pub fn server_error(cause: impl Into<String>) -> Self {
        Self {
            error: "server_error",
            cause: cause.into(),
        }
    }
}

impl From<&CatalogError> for FailureReport {
    fn from(error: &CatalogError) -> Self {
        error.to_failure_report()
    }
}

/// A record the import could not store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub title: Option<String>,
    pub raw_isbn: Option<String>,
    pub reason: String,
}

/// Outcome of [`Catalog::import_query`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub query: String,
    /// Records returned by the API across all pages.
    pub fetched: usize,
    /// Records left after deduplication.
    pub unique: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRecord>,
    pub pages_fetched: u32,
    /// The page ceiling cut the search short.
    pub truncated: bool,
}

impl ImportReport {
    /// Records written to the store, new or replaced.
    #[must_use]
    pub fn persisted(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Book catalog bound to a repository and, for imports, a search client.
#[derive(Debug)]
pub struct Catalog<R> {
    repo: R,
    client: Option<BookSearchClient>,
}

impl<R: BookRepository + Sync> Catalog<R> {
    /// Catalog that can import and list.
    #[must_use]
    pub fn new(repo: R, client: BookSearchClient) -> Self {
        Self {
            repo,
            client: Some(client),
        }
    }

    /// Catalog for reading only; [`import_query`](Self::import_query) fails.
    #[must_use]
    pub fn read_only(repo: R) -> Self {
        Self { repo, client: None }
    }

    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Searches, deduplicates and upserts every resulting record.
    ///
    /// Records without an ISBN are skipped and listed in the report. Any
    /// other store failure stops the import; books already written stay.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Fetch`] when the search fails (nothing is written)
    /// - [`CatalogError::Store`] on a database failure
    /// - [`CatalogError::Config`] on a read-only catalog
    #[instrument(skip(self, request), fields(query = %request.query()))]
    pub async fn import_query(&self, request: &SearchRequest) -> Result<ImportReport, CatalogError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ConfigError::MissingApiKey {
                var: crate::config::API_KEY_ENV,
            })?;

        let results = client.fetch_all(request).await?;
        let mut report = ImportReport {
            query: request.query().to_string(),
            fetched: results.records().len(),
            pages_fetched: results.pages_fetched(),
            truncated: results.truncated(),
            ..ImportReport::default()
        };

        let unique = reconcile(results.into_records());
        report.unique = unique.len();

        for record in &unique {
            match self.repo.upsert(record).await {
                Ok(outcome) => match outcome.action {
                    UpsertAction::Inserted => report.inserted += 1,
                    UpsertAction::Updated => report.updated += 1,
                },
                Err(StoreError::Validation(error)) => {
                    warn!(title = ?record.title(), %error, "skipping record");
                    report.skipped.push(SkippedRecord {
                        title: record.title().map(str::to_string),
                        raw_isbn: record.isbn_raw().map(str::to_string),
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error.into()),
            }
        }

        info!(
            fetched = report.fetched,
            unique = report.unique,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped.len(),
            "import complete"
        );
        Ok(report)
    }

    /// Newest stored books first.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Config`] unless `1 <= limit <= 100`
    /// - [`CatalogError::Store`] on a database failure
    #[instrument(skip(self))]
    pub async fn list_books(&self, limit: u32) -> Result<Vec<StoredBook>, CatalogError> {
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(ConfigError::LimitOutOfRange { limit }.into());
        }
        Ok(self.repo.list(limit).await?)
    }
}
