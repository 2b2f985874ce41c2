use serde::{Deserialize, Serialize};
use std::fmt;

/// How hard a violation blocks acceptance of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy bucket. Excluded records carry the category of their most
/// severe finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Schema,
    BusinessRule,
    Integrity,
    Consistency,
    Heuristic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Schema => "schema",
            Category::BusinessRule => "business_rule",
            Category::Integrity => "integrity",
            Category::Consistency => "consistency",
            Category::Heuristic => "heuristic",
        }
    }

    pub fn parse(value: &str) -> Option<Category> {
        match value {
            "schema" => Some(Category::Schema),
            "business_rule" => Some(Category::BusinessRule),
            "integrity" => Some(Category::Integrity),
            "consistency" => Some(Category::Consistency),
            "heuristic" => Some(Category::Heuristic),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    // Per-record schema checks.
    NotAnObject,
    MissingField,
    InvalidType,
    DuplicateTopicTag,
    InvalidId,
    InvalidVerified,
    InvalidFollowersCount,
    InvalidScoreType,
    ScoreOutOfRange,
    InvalidTimestamp,
    MissingSources,
    SourceMissingField,
    EvidenceInsufficient,
    InvalidProvenanceHash,
    // Per-record integrity checks.
    ProvenanceHashMismatch,
    ThresholdFlagMismatch,
    // Per-record business rules.
    BelowEntryThreshold,
    OrgOrOfficial,
    // Dataset-level checks.
    MalformedLine,
    DuplicateHandle,
    DuplicateId,
    PlaceholderId,
    ShortId,
    SuspiciousFollowers,
    ManifestCountMismatch,
    ManifestSha256Mismatch,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::NotAnObject => "not_an_object",
            ViolationKind::MissingField => "missing_field",
            ViolationKind::InvalidType => "invalid_type",
            ViolationKind::DuplicateTopicTag => "duplicate_topic_tag",
            ViolationKind::InvalidId => "invalid_id",
            ViolationKind::InvalidVerified => "invalid_verified",
            ViolationKind::InvalidFollowersCount => "invalid_followers_count",
            ViolationKind::InvalidScoreType => "invalid_score_type",
            ViolationKind::ScoreOutOfRange => "score_out_of_range",
            ViolationKind::InvalidTimestamp => "invalid_timestamp",
            ViolationKind::MissingSources => "missing_sources",
            ViolationKind::SourceMissingField => "source_missing_field",
            ViolationKind::EvidenceInsufficient => "evidence_insufficient",
            ViolationKind::InvalidProvenanceHash => "invalid_provenance_hash",
            ViolationKind::ProvenanceHashMismatch => "provenance_hash_mismatch",
            ViolationKind::ThresholdFlagMismatch => "threshold_flag_mismatch",
            ViolationKind::BelowEntryThreshold => "below_entry_threshold",
            ViolationKind::OrgOrOfficial => "org_or_official",
            ViolationKind::MalformedLine => "malformed_line",
            ViolationKind::DuplicateHandle => "duplicate_handle",
            ViolationKind::DuplicateId => "duplicate_id",
            ViolationKind::PlaceholderId => "placeholder_id",
            ViolationKind::ShortId => "short_id",
            ViolationKind::SuspiciousFollowers => "suspicious_followers",
            ViolationKind::ManifestCountMismatch => "manifest_count_mismatch",
            ViolationKind::ManifestSha256Mismatch => "manifest_sha256_mismatch",
        }
    }

    pub fn category(&self) -> Category {
        use ViolationKind::*;
        match self {
            NotAnObject | MissingField | InvalidType | DuplicateTopicTag | InvalidId | InvalidVerified
            | InvalidFollowersCount | InvalidScoreType | ScoreOutOfRange | InvalidTimestamp
            | MissingSources | SourceMissingField | EvidenceInsufficient
            | InvalidProvenanceHash | MalformedLine => Category::Schema,
            ProvenanceHashMismatch | ThresholdFlagMismatch | DuplicateHandle | DuplicateId
            | PlaceholderId => Category::Integrity,
            BelowEntryThreshold | OrgOrOfficial => Category::BusinessRule,
            ManifestCountMismatch | ManifestSha256Mismatch => Category::Consistency,
            ShortId | SuspiciousFollowers => Category::Heuristic,
        }
    }

    pub fn default_severity(&self) -> Severity {
        use ViolationKind::*;
        match self {
            MalformedLine | DuplicateHandle | DuplicateId | PlaceholderId
            | ManifestCountMismatch | ManifestSha256Mismatch => Severity::Critical,
            ShortId | SuspiciousFollowers => Severity::Minor,
            _ => Severity::Major,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields under `meta` that the repair pass knows how to (re)derive.
const REPAIRABLE_FIELDS: &[&str] = &[
    "meta.sources",
    "meta.last_refresh_at",
    "meta.score",
    "meta.provenance_hash",
    "meta.entry_threshold_passed",
];

/// A single finding, with enough context to drive a repair, a report line,
/// or a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    /// Dotted field path (`meta.sources[0].evidence`), or `$` for the record.
    pub field: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub handle: Option<String>,
    pub line: Option<usize>,
}

impl Violation {
    pub fn new(kind: ViolationKind, field: impl Into<String>) -> Self {
        Violation {
            kind,
            severity: kind.default_severity(),
            field: field.into(),
            expected: None,
            actual: None,
            handle: None,
            line: None,
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Whether the schema repair pass can fix this without human input.
    pub fn is_auto_repairable(&self) -> bool {
        match self.kind {
            ViolationKind::MissingField => REPAIRABLE_FIELDS.contains(&self.field.as_str()),
            ViolationKind::MissingSources
            | ViolationKind::InvalidScoreType
            | ViolationKind::InvalidProvenanceHash
            | ViolationKind::ProvenanceHashMismatch
            | ViolationKind::ThresholdFlagMismatch => true,
            _ => false,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.kind)?;
        if let Some(handle) = &self.handle {
            write!(f, " @{}", handle)?;
        }
        write!(f, " field={}", self.field)?;
        if let Some(expected) = &self.expected {
            write!(f, " expected={}", expected)?;
        }
        if let Some(actual) = &self.actual {
            write!(f, " actual={}", actual)?;
        }
        Ok(())
    }
}

/// The outcome of validating one record. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.kind.as_str()).collect()
    }

    /// The most severe finding, the first one on ties.
    pub fn primary(&self) -> Option<&Violation> {
        self.violations.iter().min_by_key(|v| v.severity)
    }

    /// True when every violation can be fixed by the repair pass.
    pub fn is_repairable(&self) -> bool {
        self.violations.iter().all(Violation::is_auto_repairable)
    }

    /// A single `; `-joined reason string, for filter metadata and logs.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
