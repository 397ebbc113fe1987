//! Bookmatch Core Library
//!
//! Collects book metadata from the Kakao book search API, collapses
//! duplicate hits by ISBN and keeps a local SQLite catalog up to date.
//!
//! # Architecture
//!
//! - [`search`] - paginated search client with retry and backoff
//! - [`isbn`] - ISBN normalization and deduplication keys
//! - [`reconcile`] - last-write-wins deduplication of a fetched batch
//! - [`record`] - raw search records and typed field extraction
//! - [`store`] - ISBN-keyed upsert store over [`db`]
//! - [`export`] - JSON and CSV export of a batch
//! - [`catalog`] - import and listing operations combining the above
//! - [`config`] - explicit runtime configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod db;
pub mod export;
pub mod isbn;
pub mod reconcile;
pub mod record;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, FailureReport, ImportReport};
pub use config::{AppConfig, ConfigError, SearchConfig};
pub use db::{Database, DbError};
pub use isbn::{NormalizedKey, normalize_isbn};
pub use reconcile::reconcile;
pub use record::{BookFields, RawRecord, ValidationError};
pub use search::{
    BookSearchClient, FetchError, RetryPolicy, SearchRequest, SearchResults, SearchTarget,
    SortOrder,
};
pub use store::{BookRepository, BookStore, StoreError, StoredBook};
