use crate::data_model::AuthorDocument;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for pipeline operations.
///
/// Validation findings are not errors: they are collected as
/// [`crate::quality::Violation`] values. This enum covers I/O, configuration,
/// and the control-flow signal a step uses to reject a record.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Malformed JSONL at line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Record '{handle}' (line {line}) filtered out: {reason}", handle = .document.handle(), line = .document.line)]
    RecordFiltered {
        document: Box<AuthorDocument>,
        reason: String,
    },

    #[error("Error in processing step '{step_name}': {source}")]
    StepError {
        step_name: String,
        source: Box<PipelineError>,
    },

    #[error("Dataset rejected: {0}")]
    DatasetRejected(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<tempfile::PersistError> for PipelineError {
    fn from(err: tempfile::PersistError) -> Self {
        PipelineError::IoError { source: err.error }
    }
}
