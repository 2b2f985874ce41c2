use serde_json::Value;

use crate::data_model::AuthorDocument;
use crate::error::{PipelineError, Result};

/// Parses JSONL bytes. Blank lines are skipped; every other line yields either
/// a document or a `MalformedLine` error carrying its 1-based line number.
pub fn parse_lines(bytes: &[u8]) -> impl Iterator<Item = Result<AuthorDocument>> + '_ {
    bytes
        .split(|b| *b == b'\n')
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = idx + 1;
            let text = match std::str::from_utf8(raw) {
                Ok(text) => text.trim(),
                Err(e) => {
                    return Some(Err(PipelineError::MalformedLine {
                        line,
                        reason: format!("invalid UTF-8: {}", e),
                    }))
                }
            };
            if text.is_empty() {
                return None;
            }
            Some(
                serde_json::from_str::<Value>(text)
                    .map(|record| AuthorDocument::new(line, record))
                    .map_err(|e| PipelineError::MalformedLine {
                        line,
                        reason: e.to_string(),
                    }),
            )
        })
}

/// Number of non-blank lines, i.e. the record count a manifest must carry.
pub fn count_lines(bytes: &[u8]) -> usize {
    bytes
        .split(|b| *b == b'\n')
        .filter(|raw| raw.iter().any(|b| !b.is_ascii_whitespace()))
        .count()
}
