use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::rules::BrandRules;
use crate::data_model::AuthorDocument;
use crate::error::{PipelineError, Result};
use crate::executor::ProcessingStep;
use crate::pipeline::transforms::ingestion::DESCRIPTION_KEY;

pub const ORG_CONFIDENCE_KEY: &str = "org_confidence";
pub const OFFICIAL_CONFIDENCE_KEY: &str = "official_confidence";
pub const RISK_TERMS_KEY: &str = "risk_terms";

fn compile_terms(terms: &[String]) -> Result<Vec<(String, Regex)>> {
    terms
        .iter()
        .map(|term| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(term.trim()));
            Regex::new(&pattern)
                .map(|re| (term.clone(), re))
                .map_err(|e| PipelineError::ConfigError(format!("Invalid brand term '{}': {}", term, e)))
        })
        .collect()
}

/// Flags brand and institutional accounts by keyword confidence.
///
/// Matches whole words in `handle`, `name`, and the profile description.
/// Confidence is `min(1, matches * term_weight)`; at or above the threshold the
/// corresponding flag is set, and the quality gate later excludes the record.
/// Flags are only ever raised, never cleared.
pub struct OrgOfficialClassifier {
    org_terms: Vec<(String, Regex)>,
    official_terms: Vec<(String, Regex)>,
    risk_terms: Vec<(String, Regex)>,
    term_weight: f64,
    confidence_threshold: f64,
}

impl OrgOfficialClassifier {
    pub fn new(rules: &BrandRules) -> Result<Self> {
        Ok(OrgOfficialClassifier {
            org_terms: compile_terms(&rules.org_terms)?,
            official_terms: compile_terms(&rules.official_terms)?,
            risk_terms: compile_terms(&rules.risk_terms)?,
            term_weight: rules.term_weight,
            confidence_threshold: rules.confidence_threshold,
        })
    }

    fn haystack(document: &AuthorDocument) -> String {
        let field = |name: &str| {
            document
                .record
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let description = document
            .metadata
            .get(DESCRIPTION_KEY)
            .cloned()
            .unwrap_or_else(|| field("description"));
        // Underscores are word characters to the regex engine; handles use them as separators.
        format!("{} {} {}", field("handle"), field("name"), description).replace('_', " ")
    }

    fn matches<'a>(terms: &'a [(String, Regex)], text: &str) -> Vec<&'a str> {
        terms
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(term, _)| term.as_str())
            .collect()
    }

    pub fn confidence(&self, match_count: usize) -> f64 {
        (match_count as f64 * self.term_weight).min(1.0)
    }
}

impl ProcessingStep for OrgOfficialClassifier {
    fn name(&self) -> &'static str {
        "OrgOfficialClassifier"
    }

    fn process(&self, mut document: AuthorDocument) -> Result<AuthorDocument> {
        if !document.record.is_object() {
            return Ok(document);
        }
        let text = Self::haystack(&document);

        let org_confidence = self.confidence(Self::matches(&self.org_terms, &text).len());
        let official_confidence = self.confidence(Self::matches(&self.official_terms, &text).len());
        let risks = Self::matches(&self.risk_terms, &text).join(",");

        for (field, confidence) in [("is_org", org_confidence), ("is_official", official_confidence)] {
            if confidence >= self.confidence_threshold {
                debug!(handle = %document.handle(), %field, confidence, "Classifier raised flag");
                document.record[field] = Value::Bool(true);
            }
        }

        let metadata = &mut document.metadata;
        metadata.insert(ORG_CONFIDENCE_KEY.to_string(), format!("{:.2}", org_confidence));
        metadata.insert(OFFICIAL_CONFIDENCE_KEY.to_string(), format!("{:.2}", official_confidence));
        if !risks.is_empty() {
            metadata.insert(RISK_TERMS_KEY.to_string(), risks);
        }
        Ok(document)
    }
}
