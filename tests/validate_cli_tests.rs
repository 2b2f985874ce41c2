mod common;

use common::{author, rehash, to_jsonl, write_file, SCHEMA_JSON};
use influx_gate::dataset::Dataset;
use influx_gate::error::PipelineError;
use influx_gate::quality::manifest::Manifest;
use influx_gate::quality::score::LogFollowersScore;
use influx_gate::quality::violation::{Severity, ViolationKind};
use influx_gate::validate_logic::validate_dataset_file;
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn write_manifest(dir: &Path, dataset_path: &Path) -> std::path::PathBuf {
    let dataset = Dataset::load(dataset_path).expect("dataset");
    let now = chrono::Utc::now();
    let manifest = Manifest::generate(&dataset, "authors.jsonl", "1.0.0", &LogFollowersScore, &now);
    let path = dir.join("manifest.json");
    manifest.write(&path).expect("manifest");
    path
}

#[test]
fn test_clean_dataset_with_manifest_passes() {
    let dir = tempdir().expect("temp dir");
    let records = vec![
        author("1402835509", "alpha", 45_123, "blue"),
        author("1402835510", "beta", 120_457, "none"),
    ];
    let data = write_file(dir.path(), "authors.jsonl", &to_jsonl(&records));
    let schema = write_file(dir.path(), "schema.json", SCHEMA_JSON);
    let manifest = write_manifest(dir.path(), &data);

    let summary = validate_dataset_file(&data, &schema, Some(&manifest), true).expect("runs");
    assert!(summary.is_acceptable(), "{:?}", summary.report_lines());
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.records, 2);
    assert!(summary.report_lines().is_empty());
    assert!(summary.summary_line().ends_with("PASS"));
}

#[test]
fn test_record_findings_carry_path_and_line() {
    let dir = tempdir().expect("temp dir");
    let mut bad = author("1402835511", "gamma", 45_123, "none");
    bad["meta"]["entry_threshold_passed"] = json!(true);
    let records = vec![author("1402835509", "alpha", 45_123, "blue"), bad];
    let data = write_file(dir.path(), "authors.jsonl", &to_jsonl(&records));
    let schema = write_file(dir.path(), "schema.json", SCHEMA_JSON);

    let summary = validate_dataset_file(&data, &schema, None, false).expect("runs");
    assert_eq!(summary.exit_code(), 1);
    assert!(summary.report.has(ViolationKind::BelowEntryThreshold));
    assert!(summary.report.has(ViolationKind::ThresholdFlagMismatch));
    let lines = summary.report_lines();
    let prefix = format!("{}:2: [major]", data.display());
    assert!(lines.iter().all(|l| l.starts_with(&prefix)), "{:?}", lines);
    assert!(lines.iter().any(|l| l.contains("@gamma")));
}

#[test]
fn test_duplicate_handles_and_malformed_lines_are_critical() {
    let dir = tempdir().expect("temp dir");
    let mut content = to_jsonl(&[
        author("1402835509", "dup", 45_123, "blue"),
        author("1402835510", "dup", 45_124, "blue"),
    ]);
    content.push_str("{not json\n");
    let data = write_file(dir.path(), "authors.jsonl", &content);
    let schema = write_file(dir.path(), "schema.json", SCHEMA_JSON);

    let summary = validate_dataset_file(&data, &schema, None, false).expect("runs");
    assert_eq!(summary.records, 3);
    assert!(summary.report.has(ViolationKind::DuplicateHandle));
    assert!(summary.report.has(ViolationKind::MalformedLine));
    assert_eq!(summary.report.count(Severity::Critical), 2);
    assert!(summary.summary_line().ends_with("FAIL"));
}

#[test]
fn test_minor_findings_only_fail_under_strict() {
    let dir = tempdir().expect("temp dir");
    let mut round = author("1402835509", "round", 100_000, "none");
    round["meta"]["sources"][0]["method"] = json!("web_scrape");
    rehash(&mut round);
    let data = write_file(dir.path(), "authors.jsonl", &to_jsonl(&[round]));
    let schema = write_file(dir.path(), "schema.json", SCHEMA_JSON);

    let lenient = validate_dataset_file(&data, &schema, None, false).expect("runs");
    assert!(lenient.report.has(ViolationKind::SuspiciousFollowers));
    assert_eq!(lenient.exit_code(), 0);

    let strict = validate_dataset_file(&data, &schema, None, true).expect("runs");
    assert_eq!(strict.exit_code(), 1);
}

#[test]
fn test_stale_manifest_is_reported() {
    let dir = tempdir().expect("temp dir");
    let data = write_file(
        dir.path(),
        "authors.jsonl",
        &to_jsonl(&[author("1402835509", "alpha", 45_123, "blue")]),
    );
    let schema = write_file(dir.path(), "schema.json", SCHEMA_JSON);
    let manifest = write_manifest(dir.path(), &data);

    // Append a second record after the manifest was generated.
    let updated = to_jsonl(&[
        author("1402835509", "alpha", 45_123, "blue"),
        author("1402835510", "beta", 60_001, "none"),
    ]);
    std::fs::write(&data, updated).expect("rewrite");

    let summary = validate_dataset_file(&data, &schema, Some(&manifest), false).expect("runs");
    assert!(summary.report.has(ViolationKind::ManifestCountMismatch));
    assert!(summary.report.has(ViolationKind::ManifestSha256Mismatch));
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_missing_schema_is_an_error_not_a_finding() {
    let dir = tempdir().expect("temp dir");
    let data = write_file(dir.path(), "authors.jsonl", "");
    match validate_dataset_file(&data, &dir.path().join("missing.json"), None, false) {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("Failed to read schema file")),
        other => panic!("expected ConfigError, got {:?}", other.map(|s| s.summary_line())),
    }
}
