use crate::config::rules::BrandRules;
use crate::data_model::Verified;
use crate::error::{PipelineError, Result};
use crate::quality::consistency::ConsistencyConfig;
use crate::quality::score::ScoringStrategyKind;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the overall pipeline configuration read from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct PipelineConfig {
    pub pipeline: Vec<StepConfig>,
    #[serde(default)]
    pub consistency: ConsistencyConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        for step_config in &self.pipeline {
            step_config.validate()?;
        }
        if self.consistency.placeholder_id_prefix.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "consistency: placeholder_id_prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The scoring strategy of the last `Scorer` step, if any.
    pub fn scoring_strategy(&self) -> ScoringStrategyKind {
        self.pipeline
            .iter()
            .rev()
            .find_map(|step| match step {
                StepConfig::Scorer(params) => Some(params.strategy),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Represents a single step in the processing pipeline.
/// The 'type' field in YAML determines which variant.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum StepConfig {
    IngestionAdapter(IngestionParams),
    OrgOfficialClassifier(ClassifierParams),
    SchemaRepair(RepairParams),
    Scorer(ScorerParams),
    QualityGate(QualityGateParams),
}

impl StepConfig {
    /// Returns a string slice representing the name of the step type.
    pub fn name(&self) -> &'static str {
        match self {
            StepConfig::IngestionAdapter(_) => "IngestionAdapter",
            StepConfig::OrgOfficialClassifier(_) => "OrgOfficialClassifier",
            StepConfig::SchemaRepair(_) => "SchemaRepair",
            StepConfig::Scorer(_) => "Scorer",
            StepConfig::QualityGate(_) => "QualityGate",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            StepConfig::IngestionAdapter(params) => params.validate(),
            StepConfig::OrgOfficialClassifier(params) => params.validate(),
            StepConfig::SchemaRepair(params) => params.validate(),
            StepConfig::Scorer(_) => Ok(()),
            StepConfig::QualityGate(_) => Ok(()),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_verified_true_as() -> Verified {
    Verified::Blue
}

fn default_lang() -> String {
    "und".to_string()
}

fn default_profile_method() -> String {
    "x_api_v2_profile".to_string()
}

fn default_backfill_method() -> String {
    "repair_backfill".to_string()
}

/// Parameters for the IngestionAdapter.
#[derive(Deserialize, Debug, Clone)]
pub struct IngestionParams {
    #[serde(default = "default_true")]
    pub coerce_boolean_verified: bool,
    /// Tier assigned to a boolean `verified: true`.
    #[serde(default = "default_verified_true_as")]
    pub verified_true_as: Verified,
    #[serde(default = "default_true")]
    pub coerce_numeric_strings: bool,
    /// `lang_primary` for mapped platform profiles.
    #[serde(default = "default_lang")]
    pub default_lang: String,
    /// `meta.sources[].method` recorded for mapped platform profiles.
    #[serde(default = "default_profile_method")]
    pub profile_source_method: String,
}

impl Default for IngestionParams {
    fn default() -> Self {
        IngestionParams {
            coerce_boolean_verified: true,
            verified_true_as: default_verified_true_as(),
            coerce_numeric_strings: true,
            default_lang: default_lang(),
            profile_source_method: default_profile_method(),
        }
    }
}

impl IngestionParams {
    pub fn validate(&self) -> Result<()> {
        if self.verified_true_as == Verified::None {
            return Err(PipelineError::ConfigValidationError(
                "IngestionParams: verified_true_as cannot be 'none'".to_string(),
            ));
        }
        if self.default_lang.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "IngestionParams: default_lang cannot be empty".to_string(),
            ));
        }
        if self.profile_source_method.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "IngestionParams: profile_source_method cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the OrgOfficialClassifier. Exactly one of `rules_path`
/// and inline `rules` must be given.
#[derive(Deserialize, Debug, Clone)]
pub struct ClassifierParams {
    pub rules_path: Option<PathBuf>,
    pub rules: Option<BrandRules>,
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<()> {
        match (&self.rules_path, &self.rules) {
            (Some(_), None) => Ok(()),
            (None, Some(rules)) => rules.validate(),
            _ => Err(PipelineError::ConfigValidationError(
                "ClassifierParams: exactly one of rules_path or rules must be set".to_string(),
            )),
        }
    }
}

/// Parameters for the SchemaRepair step.
#[derive(Deserialize, Debug, Clone)]
pub struct RepairParams {
    #[serde(default = "default_backfill_method")]
    pub backfill_method: String,
}

impl Default for RepairParams {
    fn default() -> Self {
        RepairParams {
            backfill_method: default_backfill_method(),
        }
    }
}

impl RepairParams {
    pub fn validate(&self) -> Result<()> {
        if self.backfill_method.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "RepairParams: backfill_method cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the Scorer step.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ScorerParams {
    #[serde(default)]
    pub strategy: ScoringStrategyKind,
}

/// Parameters for the QualityGate step. Without a schema path the built-in
/// contract is used.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct QualityGateParams {
    pub schema_path: Option<PathBuf>,
}

/// Loads and parses the pipeline configuration YAML file.
pub fn load_pipeline_config<P: AsRef<Path>>(config_path: P) -> Result<PipelineConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read pipeline config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let config: PipelineConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse pipeline config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}

/// The pipeline used when no config file is given: every step, v1 scoring,
/// no classifier.
pub fn default_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        pipeline: vec![
            StepConfig::IngestionAdapter(IngestionParams::default()),
            StepConfig::SchemaRepair(RepairParams::default()),
            StepConfig::Scorer(ScorerParams::default()),
            StepConfig::QualityGate(QualityGateParams::default()),
        ],
        consistency: ConsistencyConfig::default(),
    }
}
