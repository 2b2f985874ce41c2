use std::path::PathBuf;

use clap::Parser;

use crate::utils::logging::LogFormat;

/// Curate raw author records into a validated dataset with a manifest.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CurateArgs {
    /// Raw JSONL input
    #[arg(short, long)]
    pub input: PathBuf,

    /// Curated JSONL output. Only replaced when the new dataset validates.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Manifest path. Defaults to `<output>.manifest.json`.
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Optional JSONL file receiving every rejected record with its reason
    #[arg(short, long)]
    pub excluded: Option<PathBuf>,

    /// Path to the pipeline configuration YAML file.
    #[arg(short = 'c', long)]
    pub pipeline_config: Option<PathBuf>,

    /// JSON schema file; overrides the contract of every QualityGate step
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Run clock (RFC 3339). Defaults to the current time.
    #[arg(long)]
    pub as_of: Option<String>,

    /// Treat minor dataset findings as failures
    #[arg(long)]
    pub strict: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Validate the pipeline configuration and exit
    #[arg(long)]
    pub validate_config: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CurateArgs {
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest.clone().unwrap_or_else(|| {
            let mut name = self.output.as_os_str().to_os_string();
            name.push(".manifest.json");
            PathBuf::from(name)
        })
    }
}
