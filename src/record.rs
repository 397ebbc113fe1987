//! Raw search records and typed field extraction.
//!
//! [`RawRecord`] is the untrusted JSON object returned for each search hit.
//! [`BookFields`] is the typed projection persisted by the store; extraction
//! degrades field by field and only fails when the record has no ISBN.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::isbn::normalize_isbn;

/// Per-record validation failures raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The record's `isbn` field is absent, empty, or holds only separators.
    #[error(
        "record has no usable ISBN (raw isbn: {raw:?}, title: {title:?})\n  Suggestion: records without an ISBN can be exported but not stored"
    )]
    MissingIsbn {
        /// Raw `isbn` value, if the field was a string.
        raw: Option<String>,
        /// Title, to help identify the record in logs.
        title: Option<String>,
    },
}

/// One search hit exactly as the API returned it.
///
/// No field is guaranteed. JSON `null` is treated the same as a missing field
/// by every accessor. Unknown fields are kept so the full record can be
/// stored and exported verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wraps an already-parsed JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Converts a JSON value into a record; returns `None` for non-objects.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Returns a field, treating JSON `null` as absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    /// Returns a string field; non-string values are ignored.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns a field as text: strings as-is, any other value as its JSON text.
    #[must_use]
    pub fn text_field(&self, field: &str) -> Option<String> {
        self.get(field).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    /// Returns an integer field; non-integer values are ignored.
    #[must_use]
    pub fn int_field(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Returns a list-of-names field (`authors`, `translators`).
    ///
    /// A JSON array keeps its order (non-string elements are kept as their
    /// JSON text), a single string becomes a one-element list, anything else
    /// is treated as absent.
    #[must_use]
    pub fn names_field(&self, field: &str) -> Option<Vec<String>> {
        match self.get(field)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(name) => name.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::String(name) => Some(vec![name.clone()]),
            _ => None,
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    #[must_use]
    pub fn publisher(&self) -> Option<&str> {
        self.str_field("publisher")
    }

    /// Raw `isbn` field, before normalization.
    #[must_use]
    pub fn isbn_raw(&self) -> Option<&str> {
        self.str_field("isbn")
    }

    /// First ISBN token, see [`normalize_isbn`].
    #[must_use]
    pub fn isbn(&self) -> Option<&str> {
        self.isbn_raw().and_then(normalize_isbn)
    }

    #[must_use]
    pub fn authors(&self) -> Option<Vec<String>> {
        self.names_field("authors")
    }

    #[must_use]
    pub fn translators(&self) -> Option<Vec<String>> {
        self.names_field("translators")
    }

    /// Raw publication `datetime` string.
    #[must_use]
    pub fn datetime_raw(&self) -> Option<&str> {
        self.str_field("datetime")
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Clones the record into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Parses a publication datetime into a UTC instant.
///
/// Accepts RFC 3339 (a trailing `Z` means `+00:00`), offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and bare `YYYY-MM-DD` dates.
/// Anything else yields `None`.
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Typed projection of a [`RawRecord`] ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub isbn: String,
    /// Empty when the record has no title.
    pub title: String,
    pub contents: Option<String>,
    pub url: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub translators: Option<Vec<String>>,
    pub price: Option<i64>,
    pub sale_price: Option<i64>,
    pub thumbnail: Option<String>,
    pub status: Option<String>,
    /// The whole source record, stored verbatim.
    pub raw_json: Value,
}

impl BookFields {
    /// Extracts persistable fields from a raw record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingIsbn`] when no ISBN token exists.
    /// Unparseable optional fields become `None` instead of failing.
    pub fn from_record(record: &RawRecord) -> Result<Self, ValidationError> {
        let Some(isbn) = record.isbn() else {
            return Err(ValidationError::MissingIsbn {
                raw: record.isbn_raw().map(str::to_string),
                title: record.title().map(str::to_string),
            });
        };

        let owned = |field: &str| record.str_field(field).map(str::to_string);

        Ok(Self {
            isbn: isbn.to_string(),
            title: record.title().unwrap_or_default().to_string(),
            contents: owned("contents"),
            url: owned("url"),
            datetime: record.datetime_raw().and_then(parse_datetime),
            authors: record.authors(),
            publisher: owned("publisher"),
            translators: record.translators(),
            price: record.int_field("price"),
            sale_price: record.int_field("sale_price"),
            thumbnail: owned("thumbnail"),
            status: owned("status"),
            raw_json: record.to_value(),
        })
    }
}
