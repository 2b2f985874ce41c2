use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::quality::violation::Category;

/// Verification tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verified {
    None,
    Blue,
    Org,
    Legacy,
}

impl Verified {
    pub const ALL: [Verified; 4] = [
        Verified::None,
        Verified::Blue,
        Verified::Org,
        Verified::Legacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verified::None => "none",
            Verified::Blue => "blue",
            Verified::Org => "org",
            Verified::Legacy => "legacy",
        }
    }

    /// Strict parse; no case folding, no aliases.
    pub fn parse(value: &str) -> Option<Verified> {
        Verified::ALL.into_iter().find(|v| v.as_str() == value)
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, Verified::None)
    }
}

impl fmt::Display for Verified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provenance entry in `meta.sources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub method: String,
    pub fetched_at: String,
    pub evidence: String,
}

/// Externally fetched inputs for the M2 scoring strategy, each in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct M2Inputs {
    pub activity: Option<f64>,
    pub quality: Option<f64>,
    pub relevance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub score: f64,
    pub last_refresh_at: String,
    pub sources: Vec<SourceEntry>,
    pub provenance_hash: String,
    pub entry_threshold_passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m2_inputs: Option<M2Inputs>,
}

/// A fully typed author record. Only records that already passed the
/// validator convert cleanly; everything upstream works on `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub verified: Verified,
    pub followers_count: u64,
    pub is_org: bool,
    pub is_official: bool,
    pub lang_primary: String,
    pub topic_tags: Vec<String>,
    pub meta: Meta,
}

impl AuthorRecord {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

/// The unit that flows through the pipeline: one JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDocument {
    /// 1-based line number in the source file; 0 when synthesized.
    pub line: usize,
    pub record: Value,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl AuthorDocument {
    pub fn new(line: usize, record: Value) -> Self {
        AuthorDocument {
            line,
            record,
            metadata: HashMap::new(),
        }
    }

    pub fn handle(&self) -> &str {
        self.record
            .get("handle")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
    }

    pub fn id(&self) -> Option<&str> {
        self.record.get("id").and_then(Value::as_str)
    }
}

/// Result of running one document through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ProcessingOutcome {
    Success(AuthorDocument),
    Filtered {
        document: AuthorDocument,
        reason: String,
    },
}

/// Line format of the excluded-records sidecar file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedRecord {
    pub line: usize,
    pub handle: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// The record would pass after the repair pass.
    #[serde(default)]
    pub repairable: bool,
    pub record: Value,
}

impl ExcludedRecord {
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

impl From<(AuthorDocument, String)> for ExcludedRecord {
    fn from((document, reason): (AuthorDocument, String)) -> Self {
        ExcludedRecord {
            line: document.line,
            handle: document.handle().to_string(),
            reason,
            category: None,
            repairable: false,
            record: document.record,
        }
    }
}
