//! Integration tests for the ISBN-keyed book store on a file database.

use bookmatch_core::store::{BookStore, StoreError, UpsertAction};
use bookmatch_core::{Database, RawRecord};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

async fn file_store(dir: &TempDir) -> BookStore {
    BookStore::new(Database::new(&dir.path().join("books.db")).await.unwrap())
}

fn record(value: serde_json::Value) -> RawRecord {
    serde_json::from_value(value).unwrap()
}

async fn raw_column(store: &BookStore, isbn: &str, column: &str) -> Option<String> {
    let sql = format!("SELECT {column} FROM books WHERE isbn = ?");
    let (value,): (Option<String>,) = sqlx::query_as(&sql)
        .bind(isbn)
        .fetch_one(store.database().pool())
        .await
        .unwrap();
    value
}

#[tokio::test]
async fn test_second_upsert_keeps_created_at_and_refreshes_updated_at() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let first_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let second_at = first_at + Duration::minutes(5);

    let first = store
        .upsert_at(&record(json!({"title": "v1", "isbn": "9788937460449", "price": 1})), first_at)
        .await
        .unwrap();
    let second = store
        .upsert_at(&record(json!({"title": "v2", "isbn": "9788937460449", "price": 2})), second_at)
        .await
        .unwrap();

    assert_eq!(first.action, UpsertAction::Inserted);
    assert_eq!(second.action, UpsertAction::Updated);
    assert_eq!(store.count().await.unwrap(), 1);

    let stored = store.find_by_isbn("9788937460449").await.unwrap().unwrap();
    assert_eq!(stored.title, "v2");
    assert_eq!(stored.price, Some(2));
    assert_eq!(stored.created_at, first_at);
    assert_eq!(stored.updated_at, second_at);
    assert!(stored.updated_at > stored.created_at);
}

#[tokio::test]
async fn test_upsert_with_wall_clock_orders_timestamps() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let rec = record(json!({"title": "T", "isbn": "1111111111"}));

    let first = store.upsert(&rec).await.unwrap().book;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store.upsert(&rec).await.unwrap().book;

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
async fn test_upsert_matches_on_normalized_isbn() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let now = Utc::now();

    store
        .upsert_at(&record(json!({"title": "A", "isbn": "8937460440 9788937460449"})), now)
        .await
        .unwrap();
    let outcome = store
        .upsert_at(&record(json!({"title": "B", "isbn": "8937460440"})), now)
        .await
        .unwrap();

    assert_eq!(outcome.action, UpsertAction::Updated);
    assert_eq!(outcome.book.isbn, "8937460440");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_isbn_rejected_without_mutation() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;

    for rec in [
        json!({"title": "no isbn field"}),
        json!({"title": "blank", "isbn": "   "}),
        json!({"title": "null", "isbn": null}),
    ] {
        let err = store.upsert(&record(rec)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_datetime_stored_as_utc_or_null() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let now = Utc::now();

    let utc = store
        .upsert_at(&record(json!({"isbn": "1", "datetime": "2023-05-01T00:00:00Z"})), now)
        .await
        .unwrap()
        .book;
    let kst = store
        .upsert_at(&record(json!({"isbn": "2", "datetime": "2014-11-17T00:00:00.000+09:00"})), now)
        .await
        .unwrap()
        .book;
    let bad = store
        .upsert_at(&record(json!({"isbn": "3", "datetime": "not-a-date"})), now)
        .await
        .unwrap()
        .book;

    let expected: DateTime<Utc> = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
    assert_eq!(utc.datetime, Some(expected));
    assert_eq!(
        raw_column(&store, "1", "datetime").await.as_deref(),
        Some("2023-05-01T00:00:00+00:00")
    );
    assert_eq!(
        kst.datetime,
        Some(Utc.with_ymd_and_hms(2014, 11, 16, 15, 0, 0).unwrap())
    );
    assert_eq!(bad.datetime, None);
    assert_eq!(raw_column(&store, "3", "datetime").await, None);
}

#[tokio::test]
async fn test_name_lists_stored_as_json_arrays() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let now = Utc::now();

    let single = store
        .upsert_at(&record(json!({"isbn": "1", "authors": "김작가"})), now)
        .await
        .unwrap()
        .book;
    let many = store
        .upsert_at(&record(json!({"isbn": "2", "authors": ["A", "B"], "translators": ["T"]})), now)
        .await
        .unwrap()
        .book;
    let absent = store
        .upsert_at(&record(json!({"isbn": "3"})), now)
        .await
        .unwrap()
        .book;

    assert_eq!(single.authors, Some(vec!["김작가".to_string()]));
    assert_eq!(
        raw_column(&store, "1", "authors").await.as_deref(),
        Some(r#"["김작가"]"#)
    );
    assert_eq!(many.authors, Some(vec!["A".to_string(), "B".to_string()]));
    assert_eq!(many.translators, Some(vec!["T".to_string()]));
    assert_eq!(absent.authors, None);
    assert_eq!(raw_column(&store, "3", "authors").await, None);
}

#[tokio::test]
async fn test_non_integer_prices_become_null() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;

    let book = store
        .upsert(&record(json!({"isbn": "1", "price": "9000", "sale_price": 8100})))
        .await
        .unwrap()
        .book;

    assert_eq!(book.price, None);
    assert_eq!(book.sale_price, Some(8100));
}

#[tokio::test]
async fn test_books_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = file_store(&dir).await;
        store
            .upsert(&record(json!({"title": "persisted", "isbn": "42"})))
            .await
            .unwrap();
        store.database().clone().close().await;
    }

    let store = file_store(&dir).await;
    let books = store.list(10).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "persisted");
}
