pub mod jsonl_reader;

pub use jsonl_reader::{count_lines, parse_lines};
