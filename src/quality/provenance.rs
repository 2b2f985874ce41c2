//! Provenance fingerprint over a record's identity fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Fields folded into the provenance hash. Sorted, since the canonical
/// encoding orders keys.
pub const PROVENANCE_FIELDS: [&str; 5] = ["followers_count", "handle", "id", "name", "verified"];

static HASH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("static hash pattern"));

pub fn is_valid_hash_format(candidate: &str) -> bool {
    HASH_PATTERN.is_match(candidate)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compact, key-sorted JSON of the provenance fields. Missing fields encode as `null`.
pub fn canonical_payload(record: &Value) -> String {
    // Inserted in sorted order, so the output is sorted whatever map backs `Map`.
    let mut canonical = Map::new();
    for field in PROVENANCE_FIELDS {
        let value = record.get(field).cloned().unwrap_or(Value::Null);
        canonical.insert(field.to_string(), value);
    }
    Value::Object(canonical).to_string()
}

/// Lowercase hex SHA-256 of [`canonical_payload`].
pub fn provenance_hash(record: &Value) -> String {
    sha256_hex(canonical_payload(record).as_bytes())
}

/// Writes a freshly computed hash into `meta.provenance_hash`. Returns `false`
/// when the record has no `meta` object to write into.
pub fn refresh_provenance_hash(record: &mut Value) -> bool {
    let hash = provenance_hash(record);
    match record.get_mut("meta").and_then(Value::as_object_mut) {
        Some(meta) => {
            meta.insert("provenance_hash".to_string(), Value::String(hash));
            true
        }
        None => false,
    }
}
