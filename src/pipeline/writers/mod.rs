pub mod jsonl_writer;

pub use jsonl_writer::{serialize_records, stage_bytes, write_atomic, JsonlWriter, WrittenFile};
