//! Repository seam for book persistence.
//!
//! The catalog depends on this trait rather than on [`BookStore`] directly,
//! so import orchestration can run against any backing store.

use async_trait::async_trait;

use crate::record::RawRecord;

use super::{BookStore, Result, StoredBook, UpsertOutcome};

/// Data-access contract for the book catalog.
#[async_trait]
pub trait BookRepository {
    /// Looks a book up by normalized ISBN.
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<StoredBook>>;

    /// Inserts or replaces a record by its normalized ISBN.
    async fn upsert(&self, record: &RawRecord) -> Result<UpsertOutcome>;

    /// Newest books first, at most `limit`.
    async fn list(&self, limit: u32) -> Result<Vec<StoredBook>>;

    /// Number of stored books.
    async fn count(&self) -> Result<i64>;
}

#[async_trait]
impl BookRepository for BookStore {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<StoredBook>> {
        BookStore::find_by_isbn(self, isbn).await
    }

    async fn upsert(&self, record: &RawRecord) -> Result<UpsertOutcome> {
        BookStore::upsert(self, record).await
    }

    async fn list(&self, limit: u32) -> Result<Vec<StoredBook>> {
        BookStore::list(self, limit).await
    }

    async fn count(&self) -> Result<i64> {
        BookStore::count(self).await
    }
}
