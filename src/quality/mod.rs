// src/quality/mod.rs

pub mod consistency;
pub mod dedupe;
pub mod manifest;
pub mod provenance;
pub mod score;
pub mod validator;
pub mod violation;

pub use consistency::{check_dataset, ConsistencyConfig, DatasetChecker, DatasetReport};
pub use dedupe::{dedupe_latest, DedupeOutcome};
pub use manifest::{load_manifest, Manifest};
pub use provenance::{provenance_hash, refresh_provenance_hash};
pub use score::{passes_threshold, score, ScoringStrategy, ScoringStrategyKind};
pub use validator::{validate, RecordValidator};
pub use violation::{Category, Severity, ValidationResult, Violation, ViolationKind};
