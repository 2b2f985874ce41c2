// src/pipeline/filters/mod.rs

mod org_classifier;
mod quality_gate;

pub use org_classifier::OrgOfficialClassifier;
pub use quality_gate::{
    QualityGate, GATE_CATEGORY_KEY, GATE_REASONS_KEY, GATE_REPAIRABLE_KEY, GATE_STATUS_KEY,
};
