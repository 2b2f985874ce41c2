// src/config/mod.rs

pub mod curate;
pub mod pipeline;
pub mod rules;
pub mod schema;
pub mod validate;

pub use curate::CurateArgs;
pub use pipeline::{load_pipeline_config, PipelineConfig, StepConfig};
pub use rules::{load_brand_rules, BrandRules};
pub use schema::{load_schema_contract, SchemaContract};
pub use validate::ValidateArgs;
