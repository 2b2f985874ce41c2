use tracing::debug;

use crate::config::schema::SchemaContract;
use crate::data_model::AuthorDocument;
use crate::error::{PipelineError, Result};
use crate::executor::ProcessingStep;
use crate::quality::consistency::placeholder_id_violation;
use crate::quality::validator::RecordValidator;

pub const GATE_STATUS_KEY: &str = "gate_status";
pub const GATE_REASONS_KEY: &str = "gate_reasons";
pub const GATE_CATEGORY_KEY: &str = "gate_category";
/// "true" when every finding is one the repair pass can fix.
pub const GATE_REPAIRABLE_KEY: &str = "gate_repairable";

/// Runs the strict record validator and filters out anything with a finding.
/// Ids carrying the placeholder prefix are filtered here too, so one fabricated
/// record never reaches the dataset-level audit.
pub struct QualityGate {
    validator: RecordValidator,
    placeholder_id_prefix: String,
}

impl QualityGate {
    pub fn new(contract: SchemaContract, placeholder_id_prefix: impl Into<String>) -> Self {
        QualityGate {
            validator: RecordValidator::new(contract),
            placeholder_id_prefix: placeholder_id_prefix.into(),
        }
    }
}

impl ProcessingStep for QualityGate {
    fn name(&self) -> &'static str {
        "QualityGate"
    }

    fn process(&self, mut document: AuthorDocument) -> Result<AuthorDocument> {
        let mut result = self.validator.validate(&document.record);
        if let Some(v) = document
            .id()
            .and_then(|id| placeholder_id_violation(id, &self.placeholder_id_prefix))
        {
            result.push(v.with_handle(document.handle()));
        }
        if result.is_valid() {
            document
                .metadata
                .insert(GATE_STATUS_KEY.to_string(), "passed".to_string());
            return Ok(document);
        }

        let reason = result.summary();
        debug!(handle = %document.handle(), codes = ?result.codes(), "Record failed quality gate");
        let metadata = &mut document.metadata;
        metadata.insert(GATE_STATUS_KEY.to_string(), "rejected".to_string());
        metadata.insert(GATE_REASONS_KEY.to_string(), result.codes().join(","));
        if let Some(primary) = result.primary() {
            metadata.insert(GATE_CATEGORY_KEY.to_string(), primary.category().to_string());
        }
        metadata.insert(GATE_REPAIRABLE_KEY.to_string(), result.is_repairable().to_string());
        Err(PipelineError::RecordFiltered {
            document: Box::new(document),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::consistency::PLACEHOLDER_ID_PREFIX;
    use crate::quality::provenance::refresh_provenance_hash;
    use crate::quality::validator::tests::valid_record;
    use serde_json::json;

    fn gate() -> QualityGate {
        QualityGate::new(SchemaContract::default(), PLACEHOLDER_ID_PREFIX)
    }

    fn filtered(err: PipelineError) -> (AuthorDocument, String) {
        match err {
            PipelineError::RecordFiltered { document, reason } => (*document, reason),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_valid_record_passes() {
        let doc = gate()
            .process(AuthorDocument::new(3, valid_record()))
            .expect("valid record passes");
        assert_eq!(doc.metadata[GATE_STATUS_KEY], "passed");
    }

    #[test]
    fn test_org_account_is_filtered_with_document() {
        let mut record = valid_record();
        record["is_org"] = json!(true);
        let err = gate()
            .process(AuthorDocument::new(3, record))
            .expect_err("org accounts are excluded");
        let (document, reason) = filtered(err);
        assert_eq!(document.line, 3);
        assert_eq!(document.metadata[GATE_STATUS_KEY], "rejected");
        assert_eq!(document.metadata[GATE_REASONS_KEY], "org_or_official");
        assert_eq!(document.metadata[GATE_CATEGORY_KEY], "business_rule");
        assert_eq!(document.metadata[GATE_REPAIRABLE_KEY], "false");
        assert!(reason.contains("org_or_official"), "{}", reason);
    }

    #[test]
    fn test_placeholder_id_is_filtered() {
        let mut record = valid_record();
        record["id"] = json!("1234567890000000001");
        refresh_provenance_hash(&mut record);
        let err = gate()
            .process(AuthorDocument::new(2, record))
            .expect_err("placeholder ids are excluded");
        let (document, reason) = filtered(err);
        assert_eq!(document.metadata[GATE_REASONS_KEY], "placeholder_id");
        assert_eq!(document.metadata[GATE_CATEGORY_KEY], "integrity");
        assert!(reason.starts_with("[critical] placeholder_id"), "{}", reason);
    }

    #[test]
    fn test_stale_hash_is_marked_repairable() {
        let mut record = valid_record();
        record["name"] = json!("Renamed After Hashing");
        let (document, _) = filtered(
            gate()
                .process(AuthorDocument::new(1, record))
                .expect_err("stale hash fails the gate"),
        );
        assert_eq!(document.metadata[GATE_CATEGORY_KEY], "integrity");
        assert_eq!(document.metadata[GATE_REPAIRABLE_KEY], "true");
    }
}
