use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::pipeline::RepairParams;
use crate::data_model::{AuthorDocument, Verified};
use crate::error::Result;
use crate::executor::ProcessingStep;
use crate::quality::provenance::refresh_provenance_hash;
use crate::quality::score::{passes_threshold, score};
use crate::utils::timestamp::format_timestamp;

pub const REPAIRS_KEY: &str = "repairs";

/// Fills in derivable `meta` fields. Identity and business-rule fields are
/// never touched; a record that breaks a business rule stays broken.
pub struct SchemaRepair {
    params: RepairParams,
    now: String,
}

impl SchemaRepair {
    pub fn new(params: RepairParams, now: DateTime<Utc>) -> Self {
        SchemaRepair {
            params,
            now: format_timestamp(&now),
        }
    }

    fn backfill_source(&self) -> Value {
        json!({
            "method": self.params.backfill_method,
            "fetched_at": self.now,
            "evidence": format!("backfilled during curation at {}", self.now),
        })
    }

    fn repair_meta(
        &self,
        meta: &mut Map<String, Value>,
        inputs: Option<(u64, Verified)>,
        repairs: &mut Vec<&'static str>,
    ) {
        let has_timestamp = meta
            .get("last_refresh_at")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !has_timestamp {
            meta.insert("last_refresh_at".into(), Value::String(self.now.clone()));
            repairs.push("meta.last_refresh_at");
        }

        let has_sources = meta
            .get("sources")
            .and_then(Value::as_array)
            .is_some_and(|sources| !sources.is_empty());
        if !has_sources {
            meta.insert("sources".into(), Value::Array(vec![self.backfill_source()]));
            repairs.push("meta.sources");
        }

        if let Some((followers, verified)) = inputs {
            if !meta.get("score").is_some_and(Value::is_number) {
                meta.insert("score".into(), json!(score(followers, verified)));
                repairs.push("meta.score");
            }
            let expected = passes_threshold(followers, verified);
            if meta.get("entry_threshold_passed").and_then(Value::as_bool) != Some(expected) {
                meta.insert("entry_threshold_passed".into(), Value::Bool(expected));
                repairs.push("meta.entry_threshold_passed");
            }
        }
    }
}

impl ProcessingStep for SchemaRepair {
    fn name(&self) -> &'static str {
        "SchemaRepair"
    }

    fn process(&self, mut document: AuthorDocument) -> Result<AuthorDocument> {
        let Some(record) = document.record.as_object_mut() else {
            return Ok(document);
        };

        let followers = record.get("followers_count").and_then(Value::as_u64);
        let verified = record
            .get("verified")
            .and_then(Value::as_str)
            .and_then(Verified::parse);
        let inputs = followers.zip(verified);

        let mut repairs = Vec::new();
        let meta = record
            .entry("meta")
            .or_insert_with(|| Value::Object(Map::new()));
        match meta.as_object_mut() {
            Some(meta) => self.repair_meta(meta, inputs, &mut repairs),
            // A non-object meta is a type error for the validator.
            None => return Ok(document),
        }

        let previous_hash = document.record.pointer("/meta/provenance_hash").cloned();
        refresh_provenance_hash(&mut document.record);
        if document.record.pointer("/meta/provenance_hash") != previous_hash.as_ref() {
            repairs.push("meta.provenance_hash");
        }

        if !repairs.is_empty() {
            debug!(handle = %document.handle(), fields = ?repairs, "Repaired record");
            document
                .metadata
                .insert(REPAIRS_KEY.to_string(), repairs.join(","));
        }
        Ok(document)
    }
}
