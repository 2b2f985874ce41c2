//! Cross-record and file-level checks that no single-record check can see.

use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::quality::manifest::Manifest;
use crate::quality::violation::{Severity, Violation, ViolationKind};

pub const PLACEHOLDER_ID_PREFIX: &str = "1234567890000000";
pub const MIN_ID_LENGTH: usize = 5;
pub const FRESH_SOURCE_METHODS: &[&str] = &["x_api_v2", "x_api_v2_profile"];

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub placeholder_id_prefix: String,
    pub min_id_length: usize,
    /// Source methods whose follower counts are trusted even when round.
    pub fresh_source_methods: Vec<String>,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        ConsistencyConfig {
            placeholder_id_prefix: PLACEHOLDER_ID_PREFIX.to_string(),
            min_id_length: MIN_ID_LENGTH,
            fresh_source_methods: FRESH_SOURCE_METHODS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// All findings for a dataset, partitioned by severity on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetReport {
    pub violations: Vec<Violation>,
}

impl DatasetReport {
    pub fn extend(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.violations.extend(violations);
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    pub fn partitioned(&self) -> BTreeMap<Severity, Vec<&Violation>> {
        let mut parts: BTreeMap<Severity, Vec<&Violation>> = BTreeMap::new();
        for v in &self.violations {
            parts.entry(v.severity).or_default().push(v);
        }
        parts
    }

    /// No critical or major findings; under `strict`, no minor ones either.
    pub fn is_acceptable(&self, strict: bool) -> bool {
        self.count(Severity::Critical) == 0
            && self.count(Severity::Major) == 0
            && (!strict || self.count(Severity::Minor) == 0)
    }

    /// Orders by line (file-level findings first), then severity.
    pub fn sort(&mut self) {
        self.violations
            .sort_by_key(|v| (v.line.unwrap_or(0), v.severity));
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatasetChecker {
    config: ConsistencyConfig,
}

impl DatasetChecker {
    pub fn new(config: ConsistencyConfig) -> Self {
        DatasetChecker { config }
    }

    pub fn check_dataset(&self, dataset: &Dataset, manifest: Option<&Manifest>) -> DatasetReport {
        let mut report = DatasetReport::default();

        for (line, reason) in &dataset.malformed {
            report.violations.push(
                Violation::new(ViolationKind::MalformedLine, "$")
                    .expected("one JSON object per line")
                    .actual(reason.as_str())
                    .at_line(*line),
            );
        }

        self.check_duplicates(dataset, "handle", ViolationKind::DuplicateHandle, &mut report);
        self.check_duplicates(dataset, "id", ViolationKind::DuplicateId, &mut report);

        for doc in &dataset.documents {
            let handle = doc.handle();
            if let Some(id) = doc.id() {
                if let Some(v) = placeholder_id_violation(id, &self.config.placeholder_id_prefix) {
                    report.violations.push(v.with_handle(handle).at_line(doc.line));
                } else if id.len() < self.config.min_id_length {
                    report.violations.push(
                        Violation::new(ViolationKind::ShortId, "id")
                            .expected(format!(">= {} digits", self.config.min_id_length))
                            .actual(id)
                            .with_handle(handle)
                            .at_line(doc.line),
                    );
                }
            }

            if let Some(followers) = doc.record.get("followers_count").and_then(Value::as_u64) {
                if is_round_count(followers) && !self.has_fresh_source(&doc.record) {
                    report.violations.push(
                        Violation::new(ViolationKind::SuspiciousFollowers, "followers_count")
                            .expected("count not a round multiple of 1000")
                            .actual(followers.to_string())
                            .with_handle(handle)
                            .at_line(doc.line),
                    );
                }
            }
        }

        if let Some(manifest) = manifest {
            let count = dataset.line_count();
            if manifest.count != count {
                report.violations.push(
                    Violation::new(ViolationKind::ManifestCountMismatch, "manifest.count")
                        .expected(count.to_string())
                        .actual(manifest.count.to_string()),
                );
            }
            let digest = dataset.sha256();
            if manifest.sha256 != digest {
                report.violations.push(
                    Violation::new(ViolationKind::ManifestSha256Mismatch, "manifest.sha256")
                        .expected(digest)
                        .actual(manifest.sha256.as_str()),
                );
            }
        }

        report
    }

    fn check_duplicates(
        &self,
        dataset: &Dataset,
        field: &str,
        kind: ViolationKind,
        report: &mut DatasetReport,
    ) {
        let groups = dataset
            .documents
            .iter()
            .filter_map(|doc| {
                doc.record
                    .get(field)
                    .and_then(Value::as_str)
                    .map(|key| (key, doc))
            })
            .into_group_map();

        let duplicates = groups
            .into_iter()
            .filter(|(_, docs)| docs.len() > 1)
            .sorted_by_key(|(_, docs)| docs[0].line);

        for (key, docs) in duplicates {
            let lines = docs.iter().map(|d| d.line).join(", ");
            let handles = docs.iter().map(|d| d.handle()).unique().join(", ");
            report.violations.push(
                Violation::new(kind, field)
                    .expected(format!("unique {}", field))
                    .actual(format!("{}={} at lines {} (handles: {})", field, key, lines, handles))
                    .with_handle(docs[0].handle())
                    .at_line(docs[0].line),
            );
        }
    }

    fn has_fresh_source(&self, record: &Value) -> bool {
        record
            .pointer("/meta/sources")
            .and_then(Value::as_array)
            .is_some_and(|sources| {
                sources.iter().any(|s| {
                    s.get("method")
                        .and_then(Value::as_str)
                        .is_some_and(|m| self.config.fresh_source_methods.iter().any(|f| f == m))
                })
            })
    }
}

/// A `PlaceholderId` finding when `id` carries the fabricated-id prefix.
pub fn placeholder_id_violation(id: &str, prefix: &str) -> Option<Violation> {
    id.starts_with(prefix).then(|| {
        Violation::new(ViolationKind::PlaceholderId, "id")
            .expected(format!("not starting with {}", prefix))
            .actual(id)
    })
}

/// `>= 1000` and divisible by 1000.
pub fn is_round_count(followers_count: u64) -> bool {
    followers_count >= 1000 && followers_count % 1000 == 0
}

/// Checks with the default configuration.
pub fn check_dataset(dataset: &Dataset, manifest: Option<&Manifest>) -> DatasetReport {
    DatasetChecker::default().check_dataset(dataset, manifest)
}
