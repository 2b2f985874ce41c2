use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::data_model::AuthorDocument;
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::jsonl_reader::{count_lines, parse_lines};
use crate::pipeline::writers::serialize_records;
use crate::quality::provenance::sha256_hex;

/// One dataset snapshot, held entirely in memory: the exact file bytes plus
/// the records parsed from them.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: Option<PathBuf>,
    pub bytes: Vec<u8>,
    pub documents: Vec<AuthorDocument>,
    /// `(line, reason)` for every non-blank line that failed to parse.
    pub malformed: Vec<(usize, String)>,
    line_count: usize,
}

impl Dataset {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut documents = Vec::new();
        let mut malformed = Vec::new();
        for result in parse_lines(&bytes) {
            match result {
                Ok(doc) => documents.push(doc),
                Err(PipelineError::MalformedLine { line, reason }) => {
                    warn!(line, %reason, "Skipping malformed line");
                    malformed.push((line, reason));
                }
                Err(other) => malformed.push((0, other.to_string())),
            }
        }
        let line_count = count_lines(&bytes);
        Dataset {
            source: None,
            bytes,
            documents,
            malformed,
            line_count,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let bytes = fs::read(path_ref)?;
        let mut dataset = Dataset::from_bytes(bytes);
        dataset.source = Some(path_ref.to_path_buf());
        info!(
            path = %path_ref.display(),
            records = dataset.documents.len(),
            malformed = dataset.malformed.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Builds a snapshot from records using the canonical line encoding.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        Ok(Dataset::from_bytes(serialize_records(records)?))
    }

    /// Non-blank lines in the file, parsed or not.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}
