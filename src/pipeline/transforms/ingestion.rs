//! Lenient front door for upstream producers.
//!
//! Raw platform profiles are mapped into the author-record shape and a small
//! set of well-known producer quirks are coerced, so the strict validator
//! further down only sees genuine defects.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::pipeline::IngestionParams;
use crate::data_model::{AuthorDocument, Verified};
use crate::error::Result;
use crate::executor::ProcessingStep;
use crate::utils::timestamp::format_timestamp;

pub const COERCIONS_KEY: &str = "ingestion_coercions";
pub const DESCRIPTION_KEY: &str = "description";
pub const ACCOUNT_CREATED_KEY: &str = "account_created_at";

pub struct IngestionAdapter {
    params: IngestionParams,
    fetched_at: String,
}

impl IngestionAdapter {
    pub fn new(params: IngestionParams, now: DateTime<Utc>) -> Self {
        IngestionAdapter {
            params,
            fetched_at: format_timestamp(&now),
        }
    }

    fn is_raw_profile(record: &Map<String, Value>) -> bool {
        record.contains_key("username") && !record.contains_key("handle")
    }

    fn map_verified_type(&self, profile: &Map<String, Value>) -> Verified {
        match profile.get("verified_type").and_then(Value::as_str) {
            Some("blue") => Verified::Blue,
            Some("business") | Some("government") => Verified::Org,
            Some("legacy") => Verified::Legacy,
            Some(_) => Verified::None,
            None => match profile.get("verified") {
                Some(Value::Bool(true)) => self.params.verified_true_as,
                _ => Verified::None,
            },
        }
    }

    /// Builds an author record from a platform profile payload. Score, hash
    /// and the entry flag are left for the repair and scoring steps.
    fn map_profile(&self, document: &mut AuthorDocument, profile: Map<String, Value>) -> Value {
        let username = profile
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let id = match profile.get("id") {
            Some(Value::Number(n)) => Value::String(n.to_string()),
            Some(other) => other.clone(),
            None => Value::Null,
        };
        let followers = profile
            .get("public_metrics")
            .and_then(|m| m.get("followers_count"))
            .cloned()
            .unwrap_or(Value::Null);
        let name = profile
            .get("name")
            .cloned()
            .unwrap_or_else(|| Value::String(username.clone()));
        let lang = profile
            .get("lang")
            .and_then(Value::as_str)
            .unwrap_or(&self.params.default_lang)
            .to_string();

        if let Some(description) = profile.get("description").and_then(Value::as_str) {
            document
                .metadata
                .insert(DESCRIPTION_KEY.to_string(), description.to_string());
        }
        if let Some(created_at) = profile.get("created_at").and_then(Value::as_str) {
            document
                .metadata
                .insert(ACCOUNT_CREATED_KEY.to_string(), created_at.to_string());
        }

        json!({
            "id": id,
            "handle": username,
            "name": name,
            "verified": self.map_verified_type(&profile).as_str(),
            "followers_count": followers,
            "is_org": false,
            "is_official": false,
            "lang_primary": lang,
            "topic_tags": [],
            "meta": {
                "last_refresh_at": self.fetched_at,
                "sources": [{
                    "method": self.params.profile_source_method,
                    "fetched_at": self.fetched_at,
                    "evidence": format!("https://x.com/{}", username),
                }],
            },
        })
    }

    fn coerce(&self, record: &mut Map<String, Value>) -> Vec<&'static str> {
        let mut coerced = Vec::new();

        if self.params.coerce_boolean_verified {
            if let Some(Value::Bool(flag)) = record.get("verified") {
                let tier = if *flag {
                    self.params.verified_true_as
                } else {
                    Verified::None
                };
                record.insert("verified".into(), Value::String(tier.as_str().into()));
                coerced.push("verified");
            }
        }

        if let Some(value) = record.get_mut("followers_count") {
            if self.coerce_count(value) {
                coerced.push("followers_count");
            }
        }

        if self.params.coerce_numeric_strings {
            if let Some(score) = record.get_mut("meta").and_then(|m| m.get_mut("score")) {
                if let Some(parsed) = score.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                    if let Some(number) = serde_json::Number::from_f64(parsed) {
                        *score = Value::Number(number);
                        coerced.push("meta.score");
                    }
                }
            }
        }

        for field in ["is_org", "is_official"] {
            if let Some(value) = record.get_mut(field) {
                let parsed = match value.as_str() {
                    Some("true") => Some(true),
                    Some("false") => Some(false),
                    _ => None,
                };
                if let Some(flag) = parsed {
                    *value = Value::Bool(flag);
                    coerced.push(field);
                }
            }
        }

        if let Some(Value::Array(tags)) = record.get_mut("topic_tags") {
            let before = tags.len();
            let mut seen: Vec<Value> = Vec::with_capacity(before);
            tags.retain(|tag| {
                if seen.contains(tag) {
                    false
                } else {
                    seen.push(tag.clone());
                    true
                }
            });
            if tags.len() != before {
                coerced.push("topic_tags");
            }
        }

        coerced
    }

    /// Numeric strings and integral non-negative floats become integers.
    fn coerce_count(&self, value: &mut Value) -> bool {
        let parsed = match value {
            Value::String(s) if self.params.coerce_numeric_strings => s.trim().parse::<u64>().ok(),
            Value::Number(n) if n.as_u64().is_none() => n
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64),
            _ => None,
        };
        match parsed {
            Some(count) => {
                *value = Value::from(count);
                true
            }
            None => false,
        }
    }
}

impl ProcessingStep for IngestionAdapter {
    fn name(&self) -> &'static str {
        "IngestionAdapter"
    }

    fn process(&self, mut document: AuthorDocument) -> Result<AuthorDocument> {
        let record = std::mem::take(&mut document.record);
        let mut record = match record {
            Value::Object(map) if Self::is_raw_profile(&map) => {
                debug!(line = document.line, "Mapping raw platform profile");
                self.map_profile(&mut document, map)
            }
            other => other,
        };

        // Non-objects are left for the validator to reject.
        if let Value::Object(map) = &mut record {
            let coerced = self.coerce(map);
            if !coerced.is_empty() {
                debug!(line = document.line, fields = ?coerced, "Coerced producer fields");
                document
                    .metadata
                    .insert(COERCIONS_KEY.to_string(), coerced.join(","));
            }
        }
        document.record = record;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn adapter() -> IngestionAdapter {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        IngestionAdapter::new(IngestionParams::default(), now)
    }

    fn run(record: Value) -> AuthorDocument {
        adapter()
            .process(AuthorDocument::new(1, record))
            .expect("ingestion never fails")
    }

    #[test]
    fn test_boolean_verified_is_mapped() {
        let doc = run(json!({"handle": "a", "verified": true}));
        assert_eq!(doc.record["verified"], "blue");
        let doc = run(json!({"handle": "a", "verified": false}));
        assert_eq!(doc.record["verified"], "none");
        assert_eq!(doc.metadata.get(COERCIONS_KEY).map(String::as_str), Some("verified"));
    }

    #[test]
    fn test_unknown_verified_string_is_left_alone() {
        let doc = run(json!({"handle": "a", "verified": "business"}));
        assert_eq!(doc.record["verified"], "business");
        assert!(!doc.metadata.contains_key(COERCIONS_KEY));
    }

    #[test]
    fn test_numeric_coercions() {
        let doc = run(json!({
            "handle": "a",
            "followers_count": "45123",
            "is_org": "false",
            "is_official": "true",
            "meta": {"score": "43.09"}
        }));
        assert_eq!(doc.record["followers_count"], 45123);
        assert_eq!(doc.record["is_org"], false);
        assert_eq!(doc.record["is_official"], true);
        assert_eq!(doc.record["meta"]["score"], 43.09);

        let doc = run(json!({"handle": "a", "followers_count": 50000.0}));
        assert_eq!(doc.record["followers_count"], 50000);
        let doc = run(json!({"handle": "a", "followers_count": 12.5}));
        assert_eq!(doc.record["followers_count"], 12.5);
        let doc = run(json!({"handle": "a", "followers_count": "-3"}));
        assert_eq!(doc.record["followers_count"], "-3");
    }

    #[test]
    fn test_topic_tags_keep_first_occurrence() {
        let doc = run(json!({"handle": "a", "topic_tags": ["ai", "rust", "ai", "ml", "rust"]}));
        assert_eq!(doc.record["topic_tags"], json!(["ai", "rust", "ml"]));
    }

    #[test]
    fn test_raw_profile_is_mapped() {
        let doc = run(json!({
            "id": 1402835509u64,
            "username": "example_author",
            "name": "Example Author",
            "verified_type": "business",
            "description": "Official account of Acme Inc",
            "created_at": "2012-04-01T00:00:00Z",
            "public_metrics": {"followers_count": 45123}
        }));
        let record = &doc.record;
        assert_eq!(record["id"], "1402835509");
        assert_eq!(record["handle"], "example_author");
        assert_eq!(record["verified"], "org");
        assert_eq!(record["followers_count"], 45123);
        assert_eq!(record["lang_primary"], "und");
        assert_eq!(record["meta"]["sources"][0]["method"], "x_api_v2_profile");
        assert_eq!(record["meta"]["last_refresh_at"], "2025-03-01T12:00:00Z");
        assert_eq!(
            doc.metadata.get(DESCRIPTION_KEY).map(String::as_str),
            Some("Official account of Acme Inc")
        );
        assert!(record.get("username").is_none());
    }

    #[test]
    fn test_non_object_passes_through() {
        let doc = run(json!([1, 2, 3]));
        assert_eq!(doc.record, json!([1, 2, 3]));
    }
}
