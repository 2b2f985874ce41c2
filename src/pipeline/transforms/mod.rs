// src/pipeline/transforms/mod.rs

pub mod ingestion;
mod repair;
mod scoring;

pub use ingestion::IngestionAdapter;
pub use repair::{SchemaRepair, REPAIRS_KEY};
pub use scoring::Scorer;
