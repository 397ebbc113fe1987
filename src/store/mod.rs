//! `SQLite`-backed book catalog keyed by normalized ISBN.
//!
//! # Overview
//!
//! - [`BookStore`] - find, insert, update, upsert and list operations
//! - [`StoredBook`] - a persisted row with decoded JSON columns
//! - [`BookRepository`] - data-access seam used by the catalog
//! - [`StoreError`] - operation error types
//!
//! Every upsert runs in its own transaction: the lookup by ISBN and the
//! following insert or update are never interleaved with another writer.
//!
//! # Example
//!
//! ```no_run
//! use bookmatch_core::store::BookStore;
//! use bookmatch_core::{Database, RawRecord};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BookStore::new(Database::new(Path::new("books.db")).await?);
//! let record: RawRecord = serde_json::from_str(r#"{"title":"데미안","isbn":"8937460440 9788937460449"}"#)?;
//! let outcome = store.upsert(&record).await?;
//! println!("{} {}", outcome.action, outcome.book);
//! # Ok(())
//! # }
//! ```

mod book;
mod error;
mod repository;

pub use book::{StoredBook, UpsertAction, UpsertOutcome};
pub use error::StoreError;
pub use repository::BookRepository;

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::record::{BookFields, RawRecord};

use book::{BookRow, serialize_names};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

const INSERT_BOOK: &str = r"INSERT INTO books (
        isbn, title, contents, url, datetime, authors, publisher, translators,
        price, sale_price, thumbnail, status, raw_json, created_at, updated_at
      )
      VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
      ON CONFLICT(isbn) DO UPDATE SET
        title = excluded.title,
        contents = excluded.contents,
        url = excluded.url,
        datetime = excluded.datetime,
        authors = excluded.authors,
        publisher = excluded.publisher,
        translators = excluded.translators,
        price = excluded.price,
        sale_price = excluded.sale_price,
        thumbnail = excluded.thumbnail,
        status = excluded.status,
        raw_json = excluded.raw_json,
        updated_at = excluded.updated_at
      RETURNING *";

const UPDATE_BOOK: &str = r"UPDATE books SET
        isbn = ?, title = ?, contents = ?, url = ?, datetime = ?, authors = ?,
        publisher = ?, translators = ?, price = ?, sale_price = ?, thumbnail = ?,
        status = ?, raw_json = ?, updated_at = ?
      WHERE id = ?
      RETURNING *";

/// Book catalog over a [`Database`].
#[derive(Debug, Clone)]
pub struct BookStore {
    db: Database,
}

impl BookStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Looks a book up by exact (already normalized) ISBN.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_isbn(&self, isbn: &str) -> Result<Option<StoredBook>> {
        find_by_isbn_in(self.db.pool(), isbn).await
    }

    /// Fetches a book by row id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BookNotFound`] if no row has this id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<StoredBook> {
        let row = sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(StoreError::BookNotFound(id))?;
        StoredBook::try_from(row)
    }

    /// Inserts a book stamped `now`, overwriting an existing row with the
    /// same ISBN (its id and `created_at` are kept).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the statement fails.
    #[instrument(skip(self, fields), fields(isbn = %fields.isbn))]
    pub async fn insert(&self, fields: &BookFields, now: DateTime<Utc>) -> Result<StoredBook> {
        insert_in(self.db.pool(), fields, now).await
    }

    /// Overwrites every mutable column of row `id` and stamps `updated_at`.
    ///
    /// Absent fields are written as NULL; nothing from the previous row is
    /// merged in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BookNotFound`] if no row has this id.
    #[instrument(skip(self, fields), fields(isbn = %fields.isbn))]
    pub async fn update(
        &self,
        id: i64,
        fields: &BookFields,
        now: DateTime<Utc>,
    ) -> Result<StoredBook> {
        update_in(self.db.pool(), id, fields, now).await
    }

    /// Inserts or replaces `record` by its normalized ISBN, stamped with the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] without touching the store when the
    /// record has no ISBN, or [`StoreError::Database`] if a statement fails.
    pub async fn upsert(&self, record: &RawRecord) -> Result<UpsertOutcome> {
        self.upsert_at(record, Utc::now()).await
    }

    /// [`upsert`](Self::upsert) with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`upsert`](Self::upsert).
    #[instrument(skip(self, record), fields(isbn = ?record.isbn()))]
    pub async fn upsert_at(&self, record: &RawRecord, now: DateTime<Utc>) -> Result<UpsertOutcome> {
        let fields = BookFields::from_record(record)?;

        let mut tx = self.db.pool().begin().await?;
        let existing = find_by_isbn_in(&mut *tx, &fields.isbn).await?;
        let outcome = match existing {
            Some(current) => UpsertOutcome {
                book: update_in(&mut *tx, current.id, &fields, now).await?,
                action: UpsertAction::Updated,
            },
            None => UpsertOutcome {
                book: insert_in(&mut *tx, &fields, now).await?,
                action: UpsertAction::Inserted,
            },
        };
        tx.commit().await?;

        debug!(id = outcome.book.id, action = %outcome.action, "book stored");
        Ok(outcome)
    }

    /// Most recently inserted books first (by id), at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: u32) -> Result<Vec<StoredBook>> {
        let rows = sqlx::query_as::<_, BookRow>("SELECT * FROM books ORDER BY id DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(StoredBook::try_from).collect()
    }

    /// Number of stored books.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

async fn find_by_isbn_in<'e, E>(executor: E, isbn: &str) -> Result<Option<StoredBook>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE isbn = ?")
        .bind(isbn)
        .fetch_optional(executor)
        .await?
        .map(StoredBook::try_from)
        .transpose()
}

async fn insert_in<'e, E>(executor: E, fields: &BookFields, now: DateTime<Utc>) -> Result<StoredBook>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, BookRow>(INSERT_BOOK)
        .bind(&fields.isbn)
        .bind(&fields.title)
        .bind(&fields.contents)
        .bind(&fields.url)
        .bind(fields.datetime)
        .bind(serialize_names(fields.authors.as_deref()))
        .bind(&fields.publisher)
        .bind(serialize_names(fields.translators.as_deref()))
        .bind(fields.price)
        .bind(fields.sale_price)
        .bind(&fields.thumbnail)
        .bind(&fields.status)
        .bind(fields.raw_json.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await?;

    StoredBook::try_from(row)
}

async fn update_in<'e, E>(
    executor: E,
    id: i64,
    fields: &BookFields,
    now: DateTime<Utc>,
) -> Result<StoredBook>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, BookRow>(UPDATE_BOOK)
        .bind(&fields.isbn)
        .bind(&fields.title)
        .bind(&fields.contents)
        .bind(&fields.url)
        .bind(fields.datetime)
        .bind(serialize_names(fields.authors.as_deref()))
        .bind(&fields.publisher)
        .bind(serialize_names(fields.translators.as_deref()))
        .bind(fields.price)
        .bind(fields.sale_price)
        .bind(&fields.thumbnail)
        .bind(&fields.status)
        .bind(fields.raw_json.to_string())
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(StoreError::BookNotFound(id))?;

    StoredBook::try_from(row)
}
