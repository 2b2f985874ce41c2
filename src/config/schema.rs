use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::data_model::Verified;
use crate::error::{PipelineError, Result};

pub const DEFAULT_SCHEMA_VERSION: &str = "1.0.0";

pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &[
    "id",
    "handle",
    "name",
    "verified",
    "followers_count",
    "is_org",
    "is_official",
    "lang_primary",
    "topic_tags",
    "meta",
];

pub const DEFAULT_META_REQUIRED_FIELDS: &[&str] = &[
    "score",
    "last_refresh_at",
    "sources",
    "provenance_hash",
    "entry_threshold_passed",
];

/// The field/enum contract the record validator enforces.
///
/// Read from a JSON-Schema-shaped file: only top-level `required`,
/// `properties.verified.enum`, and `properties.meta.required` are consulted.
/// The built-in defaults fill whatever the file leaves out.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContract {
    pub schema_version: String,
    pub required: Vec<String>,
    pub meta_required: Vec<String>,
    pub verified_values: Vec<Verified>,
}

impl Default for SchemaContract {
    fn default() -> Self {
        SchemaContract {
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            required: DEFAULT_REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
            meta_required: DEFAULT_META_REQUIRED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            verified_values: Verified::ALL.to_vec(),
        }
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

impl SchemaContract {
    pub fn from_json_schema(schema: &Value) -> Self {
        let mut contract = SchemaContract::default();

        if let Some(version) = schema
            .get("version")
            .or_else(|| schema.get("schema_version"))
            .and_then(Value::as_str)
        {
            contract.schema_version = version.to_string();
        }
        if let Some(required) = string_list(schema.get("required")) {
            contract.required = required;
        }
        if let Some(meta_required) =
            string_list(schema.pointer("/properties/meta/required"))
        {
            contract.meta_required = meta_required;
        }
        if let Some(values) = string_list(schema.pointer("/properties/verified/enum")) {
            let mut known = Vec::new();
            for value in &values {
                match Verified::parse(value) {
                    Some(v) => known.push(v),
                    None => warn!(value = %value, "Ignoring unknown verified enum value in schema"),
                }
            }
            contract.verified_values = known;
        }
        debug!(contract = ?contract, "Schema contract resolved");
        contract
    }

    pub fn allows_verified(&self, verified: Verified) -> bool {
        self.verified_values.contains(&verified)
    }

    pub fn verified_values_display(&self) -> String {
        self.verified_values
            .iter()
            .map(Verified::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Loads and parses the schema file into a [`SchemaContract`].
pub fn load_schema_contract<P: AsRef<Path>>(schema_path: P) -> Result<SchemaContract> {
    let path_ref = schema_path.as_ref();
    let content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read schema file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;
    let schema: Value = serde_json::from_str(&content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse schema JSON from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;
    let contract = SchemaContract::from_json_schema(&schema);
    if contract.verified_values.is_empty() {
        return Err(PipelineError::ConfigValidationError(format!(
            "Schema '{}' allows no known verified values",
            path_ref.display()
        )));
    }
    Ok(contract)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_reads_required_and_enum() {
        let schema = json!({
            "version": "2.1.0",
            "required": ["id", "handle"],
            "properties": {
                "verified": {"enum": ["none", "blue", "business"]},
                "meta": {"required": ["score"]}
            }
        });
        let contract = SchemaContract::from_json_schema(&schema);
        assert_eq!(contract.schema_version, "2.1.0");
        assert_eq!(contract.required, vec!["id", "handle"]);
        assert_eq!(contract.meta_required, vec!["score"]);
        assert_eq!(contract.verified_values, vec![Verified::None, Verified::Blue]);
    }

    #[test]
    fn test_contract_falls_back_to_defaults() {
        let contract = SchemaContract::from_json_schema(&json!({"type": "object"}));
        assert_eq!(contract, SchemaContract::default());
        assert_eq!(contract.verified_values_display(), "none|blue|org|legacy");
    }

    #[test]
    fn test_load_schema_missing_file() {
        match load_schema_contract("no_such_schema.json") {
            Err(PipelineError::ConfigError(msg)) => {
                assert!(msg.contains("Failed to read schema file"));
            }
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }
}
