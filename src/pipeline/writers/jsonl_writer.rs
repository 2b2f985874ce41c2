use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Canonical line encoding: compact JSON, one record per line, `\n` terminated.
pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(line)
}

/// Canonical serialization of a whole dataset.
pub fn serialize_records(records: &[Value]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        out.extend(encode_line(record)?);
    }
    Ok(out)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Writes and syncs `bytes` to a temp file in the directory of `path`. The
/// file is deleted on drop unless it is persisted.
pub fn stage_bytes(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Writes `bytes` to a temp file beside `path`, then renames it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    stage_bytes(path, bytes)?.persist(path)?;
    Ok(())
}

/// What a finished [`JsonlWriter`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub count: usize,
    pub sha256: String,
}

/// Streams documents into a temp file next to the target. Nothing at the
/// target path changes until the file returned by [`JsonlWriter::stage`] is
/// persisted.
pub struct JsonlWriter {
    target: PathBuf,
    writer: Option<BufWriter<NamedTempFile>>,
    hasher: Sha256,
    count: usize,
}

impl JsonlWriter {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let target = path.into();
        let tmp = NamedTempFile::new_in(parent_dir(&target))?;
        Ok(JsonlWriter {
            target,
            writer: Some(BufWriter::new(tmp)),
            hasher: Sha256::new(),
            count: 0,
        })
    }

    /// Writes any serializable line (used for the excluded-records sidecar).
    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let line = encode_line(value)?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PipelineError::Unexpected("JSONL writer already closed".to_string()))?;
        writer.write_all(&line)?;
        self.hasher.update(&line);
        self.count += 1;
        Ok(())
    }

    /// Flushes and syncs the temp file without touching the target. The
    /// returned file is deleted on drop unless persisted to `WrittenFile::path`.
    pub fn stage(mut self) -> Result<(NamedTempFile, WrittenFile)> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| PipelineError::Unexpected("JSONL writer already closed".to_string()))?;
        let tmp = writer.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;
        let sha256 = hex::encode(self.hasher.clone().finalize());
        let written = WrittenFile {
            path: self.target.clone(),
            count: self.count,
            sha256,
        };
        debug!(path = %written.path.display(), count = written.count, "Staged JSONL file");
        Ok((tmp, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::provenance::sha256_hex;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_writer_persists_only_after_stage() {
        let dir = tempdir().expect("temp dir");
        let target = dir.path().join("out.jsonl");
        let mut writer = JsonlWriter::new(&target).expect("writer");
        writer.write_value(&json!({"handle": "a"})).expect("write");
        writer.write_value(&json!({"handle": "b"})).expect("write");
        assert!(!target.exists());
        let (staged, written) = writer.stage().expect("stage");
        assert!(!target.exists());
        staged.persist(&written.path).expect("persist");

        let bytes = fs::read(&target).expect("read back");
        assert_eq!(bytes, b"{\"handle\":\"a\"}\n{\"handle\":\"b\"}\n");
        assert_eq!(written.count, 2);
        assert_eq!(written.sha256, sha256_hex(&bytes));
    }

    #[test]
    fn test_dropped_writer_leaves_target_untouched() {
        let dir = tempdir().expect("temp dir");
        let target = dir.path().join("live.jsonl");
        fs::write(&target, b"original\n").expect("seed");
        {
            let mut writer = JsonlWriter::new(&target).expect("writer");
            writer.write_value(&json!({"handle": "new"})).expect("write");
        }
        assert_eq!(fs::read(&target).expect("read"), b"original\n");
    }

    #[test]
    fn test_staged_writer_is_discarded_on_drop() {
        let dir = tempdir().expect("temp dir");
        let target = dir.path().join("excluded.jsonl");
        let mut writer = JsonlWriter::new(&target).expect("writer");
        writer.write_value(&json!({"handle": "gone"})).expect("write");
        let (staged, written) = writer.stage().expect("stage");
        assert_eq!(written.count, 1);
        assert!(!target.exists());
        drop(staged);
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().expect("temp dir");
        let target = dir.path().join("manifest.json");
        fs::write(&target, b"old").expect("seed");
        write_atomic(&target, b"new").expect("atomic write");
        assert_eq!(fs::read(&target).expect("read"), b"new");
    }

    #[test]
    fn test_serialize_records_matches_writer_encoding() {
        let records = vec![json!({"b": 1, "a": 2}), json!({"handle": "x"})];
        let bytes = serialize_records(&records).expect("serialize");
        assert_eq!(bytes, b"{\"a\":2,\"b\":1}\n{\"handle\":\"x\"}\n");
    }
}
