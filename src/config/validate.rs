use std::path::PathBuf;

use clap::Parser;

use crate::utils::logging::LogFormat;

/// Validate an author dataset against the schema, business rules,
/// provenance, and (optionally) its manifest.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ValidateArgs {
    /// JSONL dataset to validate
    pub dataset: PathBuf,

    /// JSON schema file describing the record contract
    pub schema: PathBuf,

    /// Manifest whose count and sha256 must match the dataset
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Treat minor findings as failures
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
