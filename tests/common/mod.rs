// Shared fixtures for the integration tests.
#![allow(dead_code)]

use influx_gate::quality::provenance_hash;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_JSON: &str = r#"{
  "version": "1.0.0",
  "required": ["id", "handle", "name", "verified", "followers_count", "is_org",
               "is_official", "lang_primary", "topic_tags", "meta"],
  "properties": {
    "verified": {"enum": ["none", "blue", "org", "legacy"]},
    "meta": {"required": ["score", "last_refresh_at", "sources", "provenance_hash",
                          "entry_threshold_passed"]}
  }
}"#;

/// A record that passes every per-record check.
pub fn author(id: &str, handle: &str, followers: u64, verified: &str) -> Value {
    let passes = (verified != "none" && followers >= 30_000) || followers >= 50_000;
    let mut record = json!({
        "id": id,
        "handle": handle,
        "name": format!("Author {}", handle),
        "verified": verified,
        "followers_count": followers,
        "is_org": false,
        "is_official": false,
        "lang_primary": "en",
        "topic_tags": ["ai"],
        "meta": {
            "score": 50.0,
            "last_refresh_at": "2025-03-01T12:00:00Z",
            "sources": [{
                "method": "x_api_v2",
                "fetched_at": "2025-03-01T12:00:00Z",
                "evidence": "users/by/username lookup returned public_metrics"
            }],
            "provenance_hash": "",
            "entry_threshold_passed": passes
        }
    });
    rehash(&mut record);
    record
}

pub fn rehash(record: &mut Value) {
    let hash = provenance_hash(record);
    record["meta"]["provenance_hash"] = json!(hash);
}

pub fn to_jsonl(records: &[Value]) -> String {
    records
        .iter()
        .map(|r| format!("{}\n", r))
        .collect()
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}
