//! ISBN normalization and record identity keys.
//!
//! The search API returns the `isbn` field as free text, usually
//! `"ISBN10 ISBN13"` but sometimes with other separators or empty. Every
//! component that needs a book's identity goes through [`normalize_isbn`] so
//! deduplication, export and persistence agree on the same token.

use std::fmt;

use crate::record::RawRecord;

/// Separators accepted between ISBN tokens in addition to whitespace.
const ISBN_DELIMITERS: [char; 4] = [',', ';', '|', '/'];

/// Returns the first nonempty ISBN token of a raw `isbn` field.
///
/// Tokens are separated by whitespace or any of `,` `;` `|` `/`. Returns
/// `None` when the input is empty or consists only of separators.
///
/// ```
/// use bookmatch_core::normalize_isbn;
///
/// assert_eq!(normalize_isbn("8983920726 9788983920720"), Some("8983920726"));
/// assert_eq!(normalize_isbn(" | 9788983920720"), Some("9788983920720"));
/// assert_eq!(normalize_isbn("   "), None);
/// ```
#[must_use]
pub fn normalize_isbn(raw: &str) -> Option<&str> {
    raw.split(|c: char| c.is_whitespace() || ISBN_DELIMITERS.contains(&c))
        .find(|token| !token.is_empty())
}

/// Identity of a raw record inside one batch.
///
/// Two records with the same normalized ISBN always share a key, whatever
/// their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedKey {
    /// First ISBN token of the record.
    Isbn(String),
    /// Title/publisher/authors composite for records without an ISBN.
    Fallback {
        /// Trimmed title.
        title: String,
        /// Trimmed publisher.
        publisher: String,
        /// Authors joined with `", "`, trimmed.
        authors: String,
    },
    /// Record with no ISBN, title, publisher or authors.
    Unknown,
}

impl NormalizedKey {
    /// Derives the key for a record: ISBN when present, otherwise [`fallback_key`].
    #[must_use]
    pub fn for_record(record: &RawRecord) -> Self {
        match record.isbn_raw().and_then(normalize_isbn) {
            Some(isbn) => Self::Isbn(isbn.to_string()),
            None => fallback_key(record),
        }
    }

    /// Returns the ISBN token when this is an ISBN key.
    #[must_use]
    pub fn isbn(&self) -> Option<&str> {
        match self {
            Self::Isbn(isbn) => Some(isbn),
            Self::Fallback { .. } | Self::Unknown => None,
        }
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isbn(isbn) => write!(f, "isbn:{isbn}"),
            Self::Fallback {
                title,
                publisher,
                authors,
            } => write!(f, "fallback:{title}||{publisher}||{authors}"),
            Self::Unknown => write!(f, "fallback:unknown"),
        }
    }
}

/// Builds the identity heuristic used for records that carry no ISBN.
///
/// This is a plain string composite, not a real identity: two different
/// books sharing title, publisher and authors collide, and the same book with
/// a typo in any of the three fields is not merged. Keep it isolated here so
/// callers never rebuild the composite on their own.
#[must_use]
pub fn fallback_key(record: &RawRecord) -> NormalizedKey {
    let text = |field: &str| {
        record
            .text_field(field)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    let title = text("title");
    let publisher = text("publisher");
    let authors = match record.authors() {
        Some(names) => names.join(", ").trim().to_string(),
        None => text("authors"),
    };

    if title.is_empty() && publisher.is_empty() && authors.is_empty() {
        NormalizedKey::Unknown
    } else {
        NormalizedKey::Fallback {
            title,
            publisher,
            authors,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_isbn_space_separated_takes_first() {
        assert_eq!(
            normalize_isbn("8983920726 9788983920720"),
            Some("8983920726")
        );
    }

    #[test]
    fn test_normalize_isbn_every_delimiter() {
        for raw in [
            "111,222",
            "111;222",
            "111|222",
            "111/222",
            "111\t222",
            "111\n222",
            " ,; 111 | / 222",
        ] {
            assert_eq!(normalize_isbn(raw), Some("111"), "input {raw:?}");
        }
    }

    #[test]
    fn test_normalize_isbn_skips_leading_empty_tokens() {
        assert_eq!(normalize_isbn("  9788983920720"), Some("9788983920720"));
        assert_eq!(normalize_isbn(" 9788983920720"), Some("9788983920720"));
    }

    #[test]
    fn test_normalize_isbn_empty_and_separator_only_is_none() {
        for raw in ["", "   ", "\t\n", ",;|/", " / , "] {
            assert_eq!(normalize_isbn(raw), None, "input {raw:?}");
        }
    }

    #[test]
    fn test_key_uses_isbn_when_present() {
        let key = NormalizedKey::for_record(&record(json!({
            "title": "Rust", "isbn": "1234567890 9781234567890"
        })));
        assert_eq!(key, NormalizedKey::Isbn("1234567890".to_string()));
        assert_eq!(key.to_string(), "isbn:1234567890");
        assert_eq!(key.isbn(), Some("1234567890"));
    }

    #[test]
    fn test_key_same_isbn_collides_despite_other_fields() {
        let a = NormalizedKey::for_record(&record(json!({
            "title": "First", "publisher": "A", "isbn": "111 999"
        })));
        let b = NormalizedKey::for_record(&record(json!({
            "title": "Second", "publisher": "B", "isbn": "111"
        })));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_falls_back_to_composite() {
        let key = NormalizedKey::for_record(&record(json!({
            "title": "  노인과 바다 ",
            "publisher": "민음사",
            "authors": ["헤밍웨이", "Someone"],
            "isbn": ""
        })));
        assert_eq!(key.to_string(), "fallback:노인과 바다||민음사||헤밍웨이, Someone");
        assert_eq!(key.isbn(), None);
    }

    #[test]
    fn test_fallback_keeps_non_string_fields_as_text() {
        let key = fallback_key(&record(json!({"title": 123, "publisher": true, "authors": 7})));
        assert_eq!(key.to_string(), "fallback:123||true||7");

        let numeric = fallback_key(&record(json!({"title": 123})));
        assert_eq!(numeric.to_string(), "fallback:123||||");
        assert_ne!(numeric, NormalizedKey::Unknown);
    }

    #[test]
    fn test_fallback_single_string_author() {
        let key = fallback_key(&record(json!({"title": "T", "authors": "김작가"})));
        assert_eq!(key.to_string(), "fallback:T||||김작가");
    }

    #[test]
    fn test_fallback_all_empty_is_unknown() {
        let key = NormalizedKey::for_record(&record(json!({
            "title": "  ", "isbn": " ", "authors": []
        })));
        assert_eq!(key, NormalizedKey::Unknown);
        assert_eq!(key.to_string(), "fallback:unknown");
    }
}
