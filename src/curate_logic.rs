use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, instrument, warn};

use crate::config::curate::CurateArgs;
use crate::config::pipeline::{default_pipeline_config, load_pipeline_config, PipelineConfig, StepConfig};
use crate::config::rules::load_brand_rules;
use crate::config::schema::{load_schema_contract, SchemaContract};
use crate::data_model::{AuthorDocument, ExcludedRecord, ProcessingOutcome};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::executor::{PipelineExecutor, ProcessingStep};
use crate::pipeline::filters::{
    OrgOfficialClassifier, QualityGate, GATE_CATEGORY_KEY, GATE_REPAIRABLE_KEY,
};
use crate::pipeline::transforms::{IngestionAdapter, Scorer, SchemaRepair, REPAIRS_KEY};
use crate::pipeline::writers::{serialize_records, stage_bytes, JsonlWriter, WrittenFile};
use tempfile::NamedTempFile;
use crate::quality::consistency::{DatasetChecker, DatasetReport};
use crate::quality::dedupe::dedupe_latest;
use crate::quality::manifest::Manifest;
use crate::quality::validator::RecordValidator;
use crate::quality::violation::{Category, Severity};
use crate::utils::common::{create_progress_bar, RECORDS_TEMPLATE};
use crate::utils::timestamp::parse_timestamp;
use crate::validate_logic::audit_dataset;

/// How many findings a rejection message lists before truncating.
const REJECTION_PREVIEW: usize = 5;

/// Builds the processing pipeline based on the configuration read from YAML.
/// `schema_override` replaces the contract of every `QualityGate` step.
#[instrument(skip(config, schema_override), fields(num_steps = config.pipeline.len()))]
pub fn build_pipeline_from_config(
    config: &PipelineConfig,
    schema_override: Option<&SchemaContract>,
    now: DateTime<Utc>,
) -> Result<Vec<Box<dyn ProcessingStep>>> {
    let mut steps: Vec<Box<dyn ProcessingStep>> = Vec::new();
    info!("Building pipeline from configuration...");

    for (i, step_config) in config.pipeline.iter().enumerate() {
        let step_span = info_span!("pipeline_step", index = i, type = step_config.name());
        let _enter = step_span.enter();

        let step: Box<dyn ProcessingStep> = match step_config {
            StepConfig::IngestionAdapter(params) => {
                debug!(params = ?params, "Adding IngestionAdapter");
                Box::new(IngestionAdapter::new(params.clone(), now))
            }
            StepConfig::OrgOfficialClassifier(params) => {
                debug!(params = ?params, "Adding OrgOfficialClassifier");
                let rules = match (&params.rules_path, &params.rules) {
                    (Some(path), _) => load_brand_rules(path)?,
                    (None, Some(rules)) => rules.clone(),
                    (None, None) => {
                        return Err(PipelineError::ConfigValidationError(
                            "OrgOfficialClassifier needs rules_path or rules".to_string(),
                        ))
                    }
                };
                Box::new(OrgOfficialClassifier::new(&rules)?)
            }
            StepConfig::SchemaRepair(params) => {
                debug!(params = ?params, "Adding SchemaRepair");
                Box::new(SchemaRepair::new(params.clone(), now))
            }
            StepConfig::Scorer(params) => {
                debug!(params = ?params, "Adding Scorer");
                Box::new(Scorer::new(params.strategy.build()))
            }
            StepConfig::QualityGate(params) => {
                debug!(params = ?params, "Adding QualityGate");
                let contract = match (schema_override, &params.schema_path) {
                    (Some(contract), _) => contract.clone(),
                    (None, Some(path)) => load_schema_contract(path)?,
                    (None, None) => SchemaContract::default(),
                };
                Box::new(QualityGate::new(
                    contract,
                    config.consistency.placeholder_id_prefix.clone(),
                ))
            }
        };
        steps.push(step);
    }

    if steps.is_empty() {
        warn!("Pipeline configuration resulted in zero steps.");
    } else {
        info!("Pipeline built successfully with {} steps.", steps.len());
    }
    Ok(steps)
}

/// The contract the finished dataset is re-validated against: the override,
/// else the last gate's schema, else the built-in contract.
fn final_contract(config: &PipelineConfig, schema_override: Option<&SchemaContract>) -> Result<SchemaContract> {
    if let Some(contract) = schema_override {
        return Ok(contract.clone());
    }
    let gate_schema = config.pipeline.iter().rev().find_map(|step| match step {
        StepConfig::QualityGate(params) => params.schema_path.as_ref(),
        _ => None,
    });
    match gate_schema {
        Some(path) => load_schema_contract(path),
        None => Ok(SchemaContract::default()),
    }
}

fn followers(document: &AuthorDocument) -> u64 {
    document
        .record
        .get("followers_count")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// `followers_count` desc, then `handle` asc.
pub fn curated_order(a: &AuthorDocument, b: &AuthorDocument) -> Ordering {
    followers(b)
        .cmp(&followers(a))
        .then_with(|| a.handle().cmp(b.handle()))
}

fn resolve_clock(as_of: Option<&str>) -> Result<DateTime<Utc>> {
    match as_of {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| {
            PipelineError::ConfigError(format!("Invalid --as-of timestamp '{}'", raw))
        }),
        None => Ok(Utc::now()),
    }
}

fn load_config(args: &CurateArgs) -> Result<PipelineConfig> {
    match &args.pipeline_config {
        Some(path) => {
            info!("Loading pipeline configuration from: {}", path.display());
            load_pipeline_config(path)
        }
        None => {
            info!("No pipeline configuration given; using the default pipeline.");
            Ok(default_pipeline_config())
        }
    }
}

/// Loads the configuration and builds every step without touching any data.
pub fn check_pipeline_config(args: &CurateArgs) -> Result<Vec<&'static str>> {
    let now = resolve_clock(args.as_of.as_deref())?;
    let config = load_config(args)?;
    let schema_override = args.schema.as_deref().map(load_schema_contract).transpose()?;
    let steps = build_pipeline_from_config(&config, schema_override.as_ref(), now)?;
    final_contract(&config, schema_override.as_ref())?;
    Ok(PipelineExecutor::new(steps).step_names())
}

/// What a successful curation run wrote.
#[derive(Debug, Clone)]
pub struct CurationSummary {
    pub input_lines: usize,
    pub kept: usize,
    pub excluded: usize,
    pub output: WrittenFile,
    pub manifest_path: PathBuf,
    pub excluded_path: Option<PathBuf>,
    /// Kept records the repair pass changed.
    pub repaired: usize,
    /// Excluded records by the category of their most severe finding;
    /// uncategorized exclusions are not counted.
    pub excluded_by_category: BTreeMap<Category, usize>,
    /// Findings on the written dataset; only ever minor ones.
    pub report: DatasetReport,
}

fn rejection_message(report: &DatasetReport, strict: bool) -> String {
    let mut findings: Vec<String> = report
        .violations
        .iter()
        .filter(|v| strict || v.severity != Severity::Minor)
        .map(|v| match v.line {
            Some(line) => format!("line {}: {}", line, v),
            None => v.to_string(),
        })
        .collect();
    let total = findings.len();
    findings.truncate(REJECTION_PREVIEW);
    let mut message = format!("curated dataset failed validation with {} finding(s): {}", total, findings.join("; "));
    if total > REJECTION_PREVIEW {
        message.push_str(&format!("; and {} more", total - REJECTION_PREVIEW));
    }
    message
}

fn stage_excluded(path: &Path, excluded: &[ExcludedRecord]) -> Result<(NamedTempFile, WrittenFile)> {
    let mut writer = JsonlWriter::new(path)?;
    for record in excluded {
        writer.write_value(record)?;
    }
    writer.stage()
}

/// Carries the gate's category and repairability annotations into the sidecar.
fn filtered_record(document: AuthorDocument, reason: String) -> ExcludedRecord {
    let category = document
        .metadata
        .get(GATE_CATEGORY_KEY)
        .and_then(|c| Category::parse(c));
    let repairable = document
        .metadata
        .get(GATE_REPAIRABLE_KEY)
        .is_some_and(|r| r == "true");
    ExcludedRecord {
        category,
        repairable,
        ..ExcludedRecord::from((document, reason))
    }
}

/// Curates `args.input` into `args.output`.
///
/// The new dataset is staged beside the output, re-read from disk, and
/// validated together with its freshly generated manifest. The manifest and
/// the excluded sidecar are staged next, and only once every file is staged
/// are they renamed into place. On any error before that point the live output,
/// manifest, and excluded files are left as they were.
#[instrument(skip_all, fields(input = %args.input.display(), output = %args.output.display()))]
pub fn run_curation(args: &CurateArgs) -> Result<CurationSummary> {
    let now = resolve_clock(args.as_of.as_deref())?;
    let config = load_config(args)?;
    let schema_override = args.schema.as_deref().map(load_schema_contract).transpose()?;
    let steps = build_pipeline_from_config(&config, schema_override.as_ref(), now)?;
    let executor = PipelineExecutor::new(steps);
    let contract = final_contract(&config, schema_override.as_ref())?;
    let strategy = config.scoring_strategy().build();

    let input = Dataset::load(&args.input)?;
    let input_lines = input.line_count();
    let mut excluded: Vec<ExcludedRecord> = input
        .malformed
        .iter()
        .map(|(line, reason)| ExcludedRecord {
            line: *line,
            handle: "<unknown>".to_string(),
            reason: format!("malformed line: {}", reason),
            category: Some(Category::Schema),
            repairable: false,
            record: Value::Null,
        })
        .collect();

    let hidden = args.quiet || !std::io::stderr().is_terminal();
    let pb = create_progress_bar(input.documents.len() as u64, "Curating records", RECORDS_TEMPLATE, hidden);
    let mut passed: Vec<AuthorDocument> = Vec::with_capacity(input.documents.len());
    for doc in input.documents {
        match executor.run_outcome(doc) {
            Ok(ProcessingOutcome::Success(doc)) => passed.push(doc),
            Ok(ProcessingOutcome::Filtered { document, reason }) => {
                excluded.push(filtered_record(document, reason));
            }
            Err(e) => {
                pb.abandon_with_message(format!("Curation failed: {}", e));
                return Err(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Records processed");

    let deduped = dedupe_latest(passed);
    excluded.extend(
        deduped
            .discarded
            .into_iter()
            .map(|loser| ExcludedRecord::from(loser).with_category(Category::Integrity)),
    );
    let mut kept = deduped.kept;
    kept.sort_by(curated_order);
    let repaired = kept
        .iter()
        .filter(|d| d.metadata.contains_key(REPAIRS_KEY))
        .count();
    let mut excluded_by_category: BTreeMap<Category, usize> = BTreeMap::new();
    for category in excluded.iter().filter_map(|e| e.category) {
        *excluded_by_category.entry(category).or_default() += 1;
    }
    info!(kept = kept.len(), excluded = excluded.len(), repaired, "Pipeline finished");

    let records: Vec<Value> = kept.into_iter().map(|d| d.record).collect();
    let staged_file = stage_bytes(&args.output, &serialize_records(&records)?)?;
    let staged = Dataset::load(staged_file.path())?;

    let source_file = args
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let manifest = Manifest::generate(&staged, &source_file, &contract.schema_version, strategy.as_ref(), &now);
    let report = audit_dataset(
        &staged,
        &RecordValidator::new(contract),
        &DatasetChecker::new(config.consistency.clone()),
        Some(&manifest),
    );
    for v in &report.violations {
        warn!(line = ?v.line, finding = %v, "Curated dataset finding");
    }
    if !report.is_acceptable(args.strict) {
        // Dropping the staged file deletes it.
        return Err(PipelineError::DatasetRejected(rejection_message(&report, args.strict)));
    }

    let manifest_path = args.manifest_path();
    let staged_manifest = manifest.stage(&manifest_path)?;
    let staged_excluded = match &args.excluded {
        Some(path) => Some(stage_excluded(path, &excluded)?),
        None => None,
    };

    staged_file.persist(&args.output)?;
    staged_manifest.persist(&manifest_path)?;
    info!(
        path = %args.output.display(),
        count = manifest.count,
        sha256 = %manifest.sha256,
        manifest = %manifest_path.display(),
        "Wrote curated dataset"
    );

    let excluded_count = excluded.len();
    let excluded_path = match staged_excluded {
        Some((tmp, written)) => {
            tmp.persist(&written.path)?;
            info!(path = %written.path.display(), count = written.count, "Wrote excluded records");
            Some(written.path)
        }
        None => None,
    };

    Ok(CurationSummary {
        input_lines,
        kept: manifest.count,
        excluded: excluded_count,
        output: WrittenFile {
            path: args.output.clone(),
            count: manifest.count,
            sha256: manifest.sha256.clone(),
        },
        manifest_path,
        excluded_path,
        repaired,
        excluded_by_category,
        report,
    })
}
