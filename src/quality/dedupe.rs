//! Duplicate resolution: the record with the latest `meta.last_refresh_at`
//! wins. Ties, and records whose timestamp is missing or unparseable, keep the
//! earliest occurrence in file order.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::data_model::AuthorDocument;
use crate::utils::timestamp::parse_timestamp;

#[derive(Debug, Default)]
pub struct DedupeOutcome {
    pub kept: Vec<AuthorDocument>,
    /// Losers, each with the reason it was dropped.
    pub discarded: Vec<(AuthorDocument, String)>,
}

pub fn last_refresh_at(document: &AuthorDocument) -> Option<DateTime<Utc>> {
    document
        .record
        .pointer("/meta/last_refresh_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}

fn dedupe_by(documents: Vec<AuthorDocument>, field: &str, outcome: &mut Vec<(AuthorDocument, String)>) -> Vec<AuthorDocument> {
    let mut kept: Vec<AuthorDocument> = Vec::with_capacity(documents.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for doc in documents {
        let Some(key) = doc.record.get(field).and_then(Value::as_str).map(str::to_string) else {
            kept.push(doc);
            continue;
        };
        match slots.get(&key).copied() {
            None => {
                slots.insert(key, kept.len());
                kept.push(doc);
            }
            Some(slot) => {
                // Option ordering puts None below any Some.
                let challenger_wins = last_refresh_at(&doc) > last_refresh_at(&kept[slot]);
                let loser = if challenger_wins {
                    std::mem::replace(&mut kept[slot], doc)
                } else {
                    doc
                };
                let winner_line = kept[slot].line;
                let reason = format!(
                    "duplicate {} '{}': superseded by line {}",
                    field, key, winner_line
                );
                debug!(%field, %key, kept_line = winner_line, dropped_line = loser.line, "Resolved duplicate");
                outcome.push((loser, reason));
            }
        }
    }
    kept
}

/// Resolves duplicate handles, then duplicate ids, keeping the most recently
/// refreshed record in each group. Survivors keep their relative order.
pub fn dedupe_latest(documents: Vec<AuthorDocument>) -> DedupeOutcome {
    let mut discarded = Vec::new();
    let by_handle = dedupe_by(documents, "handle", &mut discarded);
    let kept = dedupe_by(by_handle, "id", &mut discarded);
    DedupeOutcome { kept, discarded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(line: usize, handle: &str, id: &str, refreshed: Option<&str>) -> AuthorDocument {
        let mut meta = json!({});
        if let Some(ts) = refreshed {
            meta["last_refresh_at"] = json!(ts);
        }
        AuthorDocument::new(line, json!({"handle": handle, "id": id, "meta": meta}))
    }

    #[test]
    fn test_later_refresh_wins_in_both_orders() {
        let older = "2025-01-01T00:00:00Z";
        let newer = "2025-06-01T00:00:00Z";
        for (first, second, winner_line) in [(older, newer, 2), (newer, older, 1)] {
            let outcome = dedupe_latest(vec![
                doc(1, "dup", "1000001", Some(first)),
                doc(2, "dup", "1000002", Some(second)),
            ]);
            assert_eq!(outcome.kept.len(), 1);
            assert_eq!(outcome.kept[0].line, winner_line);
            assert_eq!(outcome.discarded.len(), 1);
            assert!(outcome.discarded[0].1.contains("duplicate handle 'dup'"));
        }
    }

    #[test]
    fn test_tie_keeps_first_occurrence() {
        let ts = Some("2025-01-01T00:00:00Z");
        let outcome = dedupe_latest(vec![doc(1, "dup", "1000001", ts), doc(2, "dup", "1000002", ts)]);
        assert_eq!(outcome.kept[0].line, 1);
    }

    #[test]
    fn test_timestamp_beats_missing() {
        let outcome = dedupe_latest(vec![
            doc(1, "dup", "1000001", None),
            doc(2, "dup", "1000002", Some("2020-01-01T00:00:00Z")),
        ]);
        assert_eq!(outcome.kept[0].line, 2);
    }

    #[test]
    fn test_duplicate_ids_across_handles() {
        let outcome = dedupe_latest(vec![
            doc(1, "renamed_old", "1000001", Some("2025-01-01T00:00:00Z")),
            doc(2, "other", "1000009", Some("2025-01-01T00:00:00Z")),
            doc(3, "renamed_new", "1000001", Some("2025-02-01T00:00:00Z")),
        ]);
        let lines: Vec<_> = outcome.kept.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![3, 2]);
        assert!(outcome.discarded[0].1.contains("duplicate id '1000001'"));
    }

    #[test]
    fn test_keyless_documents_pass_through() {
        let outcome = dedupe_latest(vec![
            AuthorDocument::new(1, json!({"name": "no handle"})),
            AuthorDocument::new(2, json!({"name": "no handle"})),
        ]);
        assert_eq!(outcome.kept.len(), 2);
        assert!(outcome.discarded.is_empty());
    }
}
