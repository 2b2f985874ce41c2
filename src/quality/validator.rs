//! Strict per-record validation.
//!
//! Every check runs; nothing short-circuits except a record that is not a JSON
//! object at all. The validator never coerces: shape fixes belong to the
//! ingestion adapter that runs before it.

use itertools::Itertools;
use serde_json::{Map, Value};

use crate::config::schema::SchemaContract;
use crate::data_model::Verified;
use crate::quality::provenance::{is_valid_hash_format, provenance_hash};
use crate::quality::score::{passes_threshold, MIN_FOLLOWERS, SCORE_MAX, SCORE_MIN, VERIFIED_MIN_FOLLOWERS};
use crate::quality::violation::{ValidationResult, Violation, ViolationKind};
use crate::utils::timestamp::parse_timestamp;

pub const MIN_EVIDENCE_CHARS: usize = 10;

/// Evidence strings that say nothing about where a value came from.
pub const GENERIC_EVIDENCE: &[&str] = &["n/a", "none", "unknown", "manual"];

const SOURCE_FIELDS: [&str; 3] = ["method", "fetched_at", "evidence"];

/// Evidence must be at least ten characters, not a known placeholder, and not
/// just `@handle`. Handles compare case-insensitively, after trimming.
pub fn is_sufficient_evidence(evidence: &str, handle: Option<&str>) -> bool {
    let trimmed = evidence.trim();
    if trimmed.chars().count() < MIN_EVIDENCE_CHARS {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    if GENERIC_EVIDENCE.contains(&lowered.as_str()) {
        return false;
    }
    match handle {
        Some(h) => lowered != format!("@{}", h.to_lowercase()),
        None => true,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    contract: SchemaContract,
}

impl RecordValidator {
    pub fn new(contract: SchemaContract) -> Self {
        RecordValidator { contract }
    }

    pub fn validate(&self, record: &Value) -> ValidationResult {
        let mut result = ValidationResult::default();

        let Some(obj) = record.as_object() else {
            result.push(
                Violation::new(ViolationKind::NotAnObject, "$")
                    .expected("object")
                    .actual(json_type(record)),
            );
            return result;
        };
        let handle = obj.get("handle").and_then(Value::as_str);

        self.check_required(obj, &mut result);
        check_identity(obj, &mut result);
        let verified = self.check_verified(obj, &mut result);
        let followers = check_followers(obj, &mut result);
        check_flags(obj, &mut result);

        match obj.get("meta") {
            Some(Value::Object(meta)) => {
                self.check_meta_required(meta, &mut result);
                check_score(meta, &mut result);
                check_last_refresh(meta, &mut result);
                check_sources(meta, handle, &mut result);
                check_provenance(meta, record, &mut result);
                check_threshold_flag(meta, followers, verified, &mut result);
            }
            Some(other) => result.push(
                Violation::new(ViolationKind::InvalidType, "meta")
                    .expected("object")
                    .actual(json_type(other)),
            ),
            None => {}
        }

        if let (Some(f), Some(v)) = (followers, verified) {
            if !passes_threshold(f, v) {
                result.push(
                    Violation::new(ViolationKind::BelowEntryThreshold, "followers_count")
                        .expected(format!(
                            ">= {} (verified) or >= {}",
                            VERIFIED_MIN_FOLLOWERS, MIN_FOLLOWERS
                        ))
                        .actual(format!("{} (verified={})", f, v)),
                );
            }
        }

        for field in ["is_org", "is_official"] {
            if obj.get(field) == Some(&Value::Bool(true)) {
                result.push(
                    Violation::new(ViolationKind::OrgOrOfficial, field)
                        .expected("false")
                        .actual("true"),
                );
            }
        }

        if let Some(h) = handle {
            for violation in &mut result.violations {
                violation.handle = Some(h.to_string());
            }
        }
        result
    }

    fn check_required(&self, obj: &Map<String, Value>, result: &mut ValidationResult) {
        for field in &self.contract.required {
            if !obj.contains_key(field) {
                result.push(Violation::new(ViolationKind::MissingField, field.as_str()).expected("present"));
            }
        }
    }

    fn check_meta_required(&self, meta: &Map<String, Value>, result: &mut ValidationResult) {
        for field in &self.contract.meta_required {
            if !meta.contains_key(field) {
                result.push(
                    Violation::new(ViolationKind::MissingField, format!("meta.{}", field))
                        .expected("present"),
                );
            }
        }
    }

    fn check_verified(&self, obj: &Map<String, Value>, result: &mut ValidationResult) -> Option<Verified> {
        let raw = obj.get("verified")?;
        let parsed = raw
            .as_str()
            .and_then(Verified::parse)
            .filter(|v| self.contract.allows_verified(*v));
        if parsed.is_none() {
            result.push(
                Violation::new(ViolationKind::InvalidVerified, "verified")
                    .expected(format!("one of {}", self.contract.verified_values_display()))
                    .actual(raw.to_string()),
            );
        }
        parsed
    }
}

fn check_identity(obj: &Map<String, Value>, result: &mut ValidationResult) {
    if let Some(id) = obj.get("id") {
        if !id.as_str().is_some_and(is_digits) {
            result.push(
                Violation::new(ViolationKind::InvalidId, "id")
                    .expected("string of digits")
                    .actual(id.to_string()),
            );
        }
    }
    for field in ["handle", "name", "lang_primary"] {
        if let Some(value) = obj.get(field) {
            if !value.is_string() {
                result.push(
                    Violation::new(ViolationKind::InvalidType, field)
                        .expected("string")
                        .actual(json_type(value)),
                );
            }
        }
    }
    if let Some(tags) = obj.get("topic_tags") {
        let ok = tags
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !ok {
            result.push(
                Violation::new(ViolationKind::InvalidType, "topic_tags")
                    .expected("array of strings")
                    .actual(tags.to_string()),
            );
        } else if let Some(items) = tags.as_array() {
            for repeated in items.iter().filter_map(Value::as_str).duplicates() {
                result.push(
                    Violation::new(ViolationKind::DuplicateTopicTag, "topic_tags")
                        .expected("unique tags")
                        .actual(repeated),
                );
            }
        }
    }
}

fn check_followers(obj: &Map<String, Value>, result: &mut ValidationResult) -> Option<u64> {
    let raw = obj.get("followers_count")?;
    let parsed = raw.as_u64();
    if parsed.is_none() {
        result.push(
            Violation::new(ViolationKind::InvalidFollowersCount, "followers_count")
                .expected("non-negative integer")
                .actual(raw.to_string()),
        );
    }
    parsed
}

fn check_flags(obj: &Map<String, Value>, result: &mut ValidationResult) {
    for field in ["is_org", "is_official"] {
        if let Some(value) = obj.get(field) {
            if !value.is_boolean() {
                result.push(
                    Violation::new(ViolationKind::InvalidType, field)
                        .expected("boolean")
                        .actual(value.to_string()),
                );
            }
        }
    }
}

fn check_score(meta: &Map<String, Value>, result: &mut ValidationResult) {
    let Some(raw) = meta.get("score") else {
        return;
    };
    match raw.as_f64() {
        Some(score) if (SCORE_MIN..=SCORE_MAX).contains(&score) => {}
        Some(score) => result.push(
            Violation::new(ViolationKind::ScoreOutOfRange, "meta.score")
                .expected(format!("[{}, {}]", SCORE_MIN, SCORE_MAX))
                .actual(score.to_string()),
        ),
        None => result.push(
            Violation::new(ViolationKind::InvalidScoreType, "meta.score")
                .expected("number")
                .actual(raw.to_string()),
        ),
    }
}

fn check_last_refresh(meta: &Map<String, Value>, result: &mut ValidationResult) {
    let Some(raw) = meta.get("last_refresh_at") else {
        return;
    };
    if raw.as_str().and_then(parse_timestamp).is_none() {
        result.push(
            Violation::new(ViolationKind::InvalidTimestamp, "meta.last_refresh_at")
                .expected("ISO-8601 timestamp")
                .actual(raw.to_string()),
        );
    }
}

fn check_sources(meta: &Map<String, Value>, handle: Option<&str>, result: &mut ValidationResult) {
    let Some(raw) = meta.get("sources") else {
        return;
    };
    let Some(sources) = raw.as_array() else {
        result.push(
            Violation::new(ViolationKind::InvalidType, "meta.sources")
                .expected("array")
                .actual(json_type(raw)),
        );
        return;
    };
    if sources.is_empty() {
        result.push(
            Violation::new(ViolationKind::MissingSources, "meta.sources")
                .expected("at least one source")
                .actual("[]"),
        );
        return;
    }

    for (i, source) in sources.iter().enumerate() {
        let Some(entry) = source.as_object() else {
            result.push(
                Violation::new(ViolationKind::InvalidType, format!("meta.sources[{}]", i))
                    .expected("object")
                    .actual(json_type(source)),
            );
            continue;
        };
        for field in SOURCE_FIELDS {
            if !entry.get(field).is_some_and(Value::is_string) {
                result.push(
                    Violation::new(
                        ViolationKind::SourceMissingField,
                        format!("meta.sources[{}].{}", i, field),
                    )
                    .expected("string"),
                );
            }
        }
        if let Some(evidence) = entry.get("evidence").and_then(Value::as_str) {
            if !is_sufficient_evidence(evidence, handle) {
                result.push(
                    Violation::new(
                        ViolationKind::EvidenceInsufficient,
                        format!("meta.sources[{}].evidence", i),
                    )
                    .expected(format!(
                        ">= {} chars, not a generic placeholder",
                        MIN_EVIDENCE_CHARS
                    ))
                    .actual(evidence),
                );
            }
        }
    }
}

fn check_provenance(meta: &Map<String, Value>, record: &Value, result: &mut ValidationResult) {
    let Some(raw) = meta.get("provenance_hash") else {
        return;
    };
    match raw.as_str() {
        Some(stored) if is_valid_hash_format(stored) => {
            let recomputed = provenance_hash(record);
            if stored != recomputed {
                result.push(
                    Violation::new(ViolationKind::ProvenanceHashMismatch, "meta.provenance_hash")
                        .expected(recomputed)
                        .actual(stored),
                );
            }
        }
        _ => result.push(
            Violation::new(ViolationKind::InvalidProvenanceHash, "meta.provenance_hash")
                .expected("64 lowercase hex characters")
                .actual(raw.to_string()),
        ),
    }
}

fn check_threshold_flag(
    meta: &Map<String, Value>,
    followers: Option<u64>,
    verified: Option<Verified>,
    result: &mut ValidationResult,
) {
    let Some(raw) = meta.get("entry_threshold_passed") else {
        return;
    };
    let Some(flag) = raw.as_bool() else {
        result.push(
            Violation::new(ViolationKind::InvalidType, "meta.entry_threshold_passed")
                .expected("boolean")
                .actual(raw.to_string()),
        );
        return;
    };
    if let (Some(f), Some(v)) = (followers, verified) {
        let expected = passes_threshold(f, v);
        if flag != expected {
            result.push(
                Violation::new(ViolationKind::ThresholdFlagMismatch, "meta.entry_threshold_passed")
                    .expected(expected.to_string())
                    .actual(flag.to_string()),
            );
        }
    }
}

/// Validates against the built-in contract.
pub fn validate(record: &Value) -> ValidationResult {
    RecordValidator::default().validate(record)
}
