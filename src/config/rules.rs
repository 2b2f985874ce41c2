use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};

fn default_term_weight() -> f64 {
    0.35
}

fn default_confidence_threshold() -> f64 {
    0.7
}

/// Keyword lists for the org/official classifier, read from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BrandRules {
    #[serde(default)]
    pub org_terms: Vec<String>,
    #[serde(default)]
    pub official_terms: Vec<String>,
    /// Recorded in document metadata only; never flips a flag.
    #[serde(default)]
    pub risk_terms: Vec<String>,
    #[serde(default = "default_term_weight")]
    pub term_weight: f64,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

impl BrandRules {
    pub fn validate(&self) -> Result<()> {
        if self.term_weight <= 0.0 || self.term_weight > 1.0 {
            return Err(PipelineError::ConfigValidationError(format!(
                "BrandRules: term_weight must be in (0.0, 1.0], got {}",
                self.term_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PipelineError::ConfigValidationError(format!(
                "BrandRules: confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            )));
        }
        if self.org_terms.is_empty() && self.official_terms.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "BrandRules: at least one of org_terms or official_terms must be non-empty"
                    .to_string(),
            ));
        }
        for (name, terms) in [
            ("org_terms", &self.org_terms),
            ("official_terms", &self.official_terms),
            ("risk_terms", &self.risk_terms),
        ] {
            if let Some(idx) = terms.iter().position(|t| t.trim().is_empty()) {
                return Err(PipelineError::ConfigValidationError(format!(
                    "BrandRules: {} has an empty term at index {}",
                    name, idx
                )));
            }
        }
        Ok(())
    }
}

/// Loads and validates a brand rules YAML file.
pub fn load_brand_rules<P: AsRef<Path>>(rules_path: P) -> Result<BrandRules> {
    let path_ref = rules_path.as_ref();
    let content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read brand rules file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;
    let rules: BrandRules = serde_yaml::from_str(&content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse brand rules YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;
    rules.validate()?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_rules_with_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "org_terms: [inc, official store]\nofficial_terms: [ministry]").expect("write");
        let rules = load_brand_rules(file.path()).expect("rules");
        assert_eq!(rules.org_terms, vec!["inc", "official store"]);
        assert_eq!(rules.term_weight, 0.35);
        assert_eq!(rules.confidence_threshold, 0.7);
        assert!(rules.risk_terms.is_empty());
    }

    #[test]
    fn test_rules_reject_empty_lists_and_bad_weights() {
        let mut rules: BrandRules = serde_yaml::from_str("org_terms: [inc]").expect("yaml");
        assert!(rules.validate().is_ok());
        rules.term_weight = 0.0;
        assert!(rules.validate().is_err());

        let empty: BrandRules = serde_yaml::from_str("risk_terms: [scam]").expect("yaml");
        assert!(matches!(
            empty.validate(),
            Err(PipelineError::ConfigValidationError(_))
        ));
    }
}
