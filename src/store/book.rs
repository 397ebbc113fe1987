//! Stored book rows.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use super::StoreError;

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBook {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub contents: Option<String>,
    pub url: Option<String>,
    /// Publication instant in UTC.
    pub datetime: Option<DateTime<Utc>>,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub translators: Option<Vec<String>>,
    pub price: Option<i64>,
    pub sale_price: Option<i64>,
    pub thumbnail: Option<String>,
    pub status: Option<String>,
    /// The last source record seen for this ISBN.
    pub raw_json: Value,
    /// Set when the ISBN was first stored; never changes afterwards.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every write.
    pub updated_at: DateTime<Utc>,
}

impl StoredBook {
    /// Authors joined for display, or an empty string.
    #[must_use]
    pub fn authors_display(&self) -> String {
        self.authors
            .as_deref()
            .map(|names| names.join(", "))
            .unwrap_or_default()
    }
}

impl fmt::Display for StoredBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.title, self.isbn)?;
        let authors = self.authors_display();
        if !authors.is_empty() {
            write!(f, " - {authors}")?;
        }
        Ok(())
    }
}

/// Row as SQLite holds it: list and raw columns are JSON text.
#[derive(Debug, FromRow)]
pub(super) struct BookRow {
    id: i64,
    isbn: String,
    title: String,
    contents: Option<String>,
    url: Option<String>,
    datetime: Option<DateTime<Utc>>,
    authors: Option<String>,
    publisher: Option<String>,
    translators: Option<String>,
    price: Option<i64>,
    sale_price: Option<i64>,
    thumbnail: Option<String>,
    status: Option<String>,
    raw_json: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookRow> for StoredBook {
    type Error = StoreError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let decode_err = |column: &'static str| {
            move |source: serde_json::Error| StoreError::Decode { id, column, source }
        };

        Ok(Self {
            id,
            authors: parse_names(row.authors.as_deref()).map_err(decode_err("authors"))?,
            translators: parse_names(row.translators.as_deref())
                .map_err(decode_err("translators"))?,
            raw_json: serde_json::from_str(&row.raw_json).map_err(decode_err("raw_json"))?,
            isbn: row.isbn,
            title: row.title,
            contents: row.contents,
            url: row.url,
            datetime: row.datetime,
            publisher: row.publisher,
            price: row.price,
            sale_price: row.sale_price,
            thumbnail: row.thumbnail,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Serializes a name list for storage. `None` stays NULL.
pub(super) fn serialize_names(names: Option<&[String]>) -> Option<String> {
    names.and_then(|names| serde_json::to_string(names).ok())
}

fn parse_names(raw: Option<&str>) -> Result<Option<Vec<String>>, serde_json::Error> {
    raw.map(serde_json::from_str).transpose()
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Inserted,
    Updated,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => write!(f, "inserted"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Result of [`BookStore::upsert`](super::BookStore::upsert).
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub book: StoredBook,
    pub action: UpsertAction,
}
