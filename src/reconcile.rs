//! Batch deduplication of raw search records.

use std::collections::HashMap;

use tracing::debug;

use crate::isbn::NormalizedKey;
use crate::record::RawRecord;

/// Deduplicates a batch by [`NormalizedKey`], last record wins.
///
/// The output holds one record per key, ordered by the first time each key
/// appeared; the payload kept for a key is the last record seen with it.
/// The API's own ordering (accuracy or latest) decides which copy is "last".
#[must_use]
pub fn reconcile(records: impl IntoIterator<Item = RawRecord>) -> Vec<RawRecord> {
    let mut slots: HashMap<NormalizedKey, usize> = HashMap::new();
    let mut kept: Vec<RawRecord> = Vec::new();
    let mut replaced = 0_usize;

    for record in records {
        let key = NormalizedKey::for_record(&record);
        if let Some(&slot) = slots.get(&key) {
            debug!(%key, "replacing earlier duplicate");
            kept[slot] = record;
            replaced += 1;
        } else {
            slots.insert(key, kept.len());
            kept.push(record);
        }
    }

    debug!(unique = kept.len(), replaced, "reconciled batch");
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    fn titles(records: &[RawRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title().unwrap_or("")).collect()
    }

    #[test]
    fn test_reconcile_empty_batch() {
        assert!(reconcile(Vec::new()).is_empty());
    }

    #[test]
    fn test_reconcile_last_duplicate_wins_in_first_position() {
        let out = reconcile(vec![
            record(json!({"title": "A-old", "isbn": "111 999"})),
            record(json!({"title": "B", "isbn": "222"})),
            record(json!({"title": "A-new", "isbn": "111"})),
        ]);
        assert_eq!(titles(&out), vec!["A-new", "B"]);
    }

    #[test]
    fn test_reconcile_fallback_keys_dedup() {
        let out = reconcile(vec![
            record(json!({"title": "T", "publisher": "P", "authors": ["X"], "price": 1})),
            record(json!({"title": " T ", "publisher": "P", "authors": "X", "price": 2})),
            record(json!({"title": "T", "publisher": "Other", "authors": ["X"]})),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].int_field("price"), Some(2));
    }

    #[test]
    fn test_reconcile_unknown_records_collapse() {
        let out = reconcile(vec![
            record(json!({"price": 1})),
            record(json!({"isbn": ""})),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].isbn_raw(), Some(""));
    }

    #[test]
    fn test_reconcile_at_most_one_record_per_key() {
        let input: Vec<RawRecord> = (0..30)
            .map(|i| record(json!({"title": format!("t{i}"), "isbn": format!("{}", i % 7)})))
            .collect();
        let out = reconcile(input.clone());

        assert_eq!(out.len(), 7);
        for kept in &out {
            let key = NormalizedKey::for_record(kept);
            let last = input
                .iter()
                .rev()
                .find(|r| NormalizedKey::for_record(r) == key)
                .unwrap();
            assert_eq!(kept, last, "kept record for {key} must be the last one");
        }
    }
}
