use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::pipeline::writers::{stage_bytes, write_atomic};
use crate::quality::score::ScoringStrategy;
use crate::utils::timestamp::format_timestamp;

pub const DEFAULT_SORT_ORDER: &str = "followers_count desc, handle asc";

/// Sidecar describing one dataset snapshot. Regenerated after every write,
/// never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub timestamp: String,
    pub count: usize,
    pub sha256: String,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub sort_order: String,
    #[serde(default)]
    pub score_version: String,
    #[serde(default)]
    pub score_formula: String,
    #[serde(default)]
    pub score_note: String,
}

impl Manifest {
    pub fn generate(
        dataset: &Dataset,
        source_file: &str,
        schema_version: &str,
        strategy: &dyn ScoringStrategy,
        generated_at: &DateTime<Utc>,
    ) -> Self {
        Manifest {
            schema_version: schema_version.to_string(),
            timestamp: format_timestamp(generated_at),
            count: dataset.line_count(),
            sha256: dataset.sha256(),
            source_file: source_file.to_string(),
            sort_order: DEFAULT_SORT_ORDER.to_string(),
            score_version: strategy.version().to_string(),
            score_formula: strategy.formula().to_string(),
            score_note: "score recomputed on every curation run; entry_threshold_passed re-derived from followers_count and verified".to_string(),
        }
    }

    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Stages the manifest beside `path` without replacing it.
    pub fn stage<P: AsRef<Path>>(&self, path: P) -> Result<NamedTempFile> {
        stage_bytes(path.as_ref(), &self.to_pretty_json()?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_atomic(path.as_ref(), &self.to_pretty_json()?)
    }
}

pub fn load_manifest<P: AsRef<Path>>(manifest_path: P) -> Result<Manifest> {
    let path_ref = manifest_path.as_ref();
    let content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read manifest file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse manifest JSON from '{}': {}",
            path_ref.display(),
            e
        ))
    })
}
