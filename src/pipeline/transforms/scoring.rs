use serde_json::{json, Value};
use tracing::debug;

use crate::data_model::{AuthorDocument, M2Inputs, Verified};
use crate::error::Result;
use crate::executor::ProcessingStep;
use crate::quality::score::{passes_threshold, ScoreInputs, ScoringStrategy};

pub const SCORE_VERSION_KEY: &str = "score_version";

/// Recomputes `meta.score` with the configured strategy and re-derives
/// `meta.entry_threshold_passed`. Records without a usable follower count or
/// verification tier are left as they are.
pub struct Scorer {
    strategy: Box<dyn ScoringStrategy>,
}

impl Scorer {
    pub fn new(strategy: Box<dyn ScoringStrategy>) -> Self {
        Scorer { strategy }
    }
}

impl ProcessingStep for Scorer {
    fn name(&self) -> &'static str {
        "Scorer"
    }

    fn process(&self, mut document: AuthorDocument) -> Result<AuthorDocument> {
        let record = &document.record;
        let followers = record.get("followers_count").and_then(Value::as_u64);
        let verified = record
            .get("verified")
            .and_then(Value::as_str)
            .and_then(Verified::parse);
        let (Some(followers_count), Some(verified)) = (followers, verified) else {
            return Ok(document);
        };
        let m2 = record
            .pointer("/meta/m2_inputs")
            .and_then(|v| serde_json::from_value::<M2Inputs>(v.clone()).ok());

        let inputs = ScoreInputs {
            followers_count,
            verified,
            m2,
        };
        let value = self.strategy.score(&inputs);

        let Some(meta) = document.record.get_mut("meta").and_then(Value::as_object_mut) else {
            return Ok(document);
        };
        meta.insert("score".into(), json!(value));
        meta.insert(
            "entry_threshold_passed".into(),
            Value::Bool(passes_threshold(followers_count, verified)),
        );
        debug!(handle = %document.handle(), score = value, version = self.strategy.version(), "Scored record");
        document
            .metadata
            .insert(SCORE_VERSION_KEY.to_string(), self.strategy.version().to_string());
        Ok(document)
    }
}
