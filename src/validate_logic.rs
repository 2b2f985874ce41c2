use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::config::schema::load_schema_contract;
use crate::config::validate::ValidateArgs;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::quality::consistency::{ConsistencyConfig, DatasetChecker, DatasetReport};
use crate::quality::manifest::{load_manifest, Manifest};
use crate::quality::validator::RecordValidator;
use crate::quality::violation::Severity;

/// Runs the record validator over every parsed line and the dataset checker
/// over the whole snapshot, merging both into one report ordered by line.
pub fn audit_dataset(
    dataset: &Dataset,
    validator: &RecordValidator,
    checker: &DatasetChecker,
    manifest: Option<&Manifest>,
) -> DatasetReport {
    let mut report = checker.check_dataset(dataset, manifest);
    for doc in &dataset.documents {
        let result = validator.validate(&doc.record);
        report.extend(result.violations.into_iter().map(|v| v.at_line(doc.line)));
    }
    report.sort();
    report
}

/// Outcome of one validation run, ready to print.
#[derive(Debug, Clone)]
pub struct ValidationSummary {
    pub dataset_path: PathBuf,
    pub records: usize,
    pub report: DatasetReport,
    pub strict: bool,
}

impl ValidationSummary {
    pub fn is_acceptable(&self) -> bool {
        self.report.is_acceptable(self.strict)
    }

    /// 0 when the dataset is acceptable, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_acceptable() {
            0
        } else {
            1
        }
    }

    /// One `path:line: <violation>` line per finding. File-level findings
    /// carry no line number.
    pub fn report_lines(&self) -> Vec<String> {
        let path = self.dataset_path.display();
        self.report
            .violations
            .iter()
            .map(|v| match v.line {
                Some(line) => format!("{}:{}: {}", path, line, v),
                None => format!("{}: {}", path, v),
            })
            .collect()
    }

    pub fn summary_line(&self) -> String {
        let parts = self.report.partitioned();
        let count = |severity: Severity| parts.get(&severity).map_or(0, Vec::len);
        format!(
            "{}: {} records, {} critical, {} major, {} minor{}: {}",
            self.dataset_path.display(),
            self.records,
            count(Severity::Critical),
            count(Severity::Major),
            count(Severity::Minor),
            if self.strict { " (strict)" } else { "" },
            if self.is_acceptable() { "PASS" } else { "FAIL" },
        )
    }
}

/// Validates one dataset file against a schema file and optional manifest.
#[instrument(skip_all, fields(dataset = %dataset_path.display(), strict = strict))]
pub fn validate_dataset_file(
    dataset_path: &Path,
    schema_path: &Path,
    manifest_path: Option<&Path>,
    strict: bool,
) -> Result<ValidationSummary> {
    let contract = load_schema_contract(schema_path)?;
    let validator = RecordValidator::new(contract);
    let manifest = manifest_path.map(load_manifest).transpose()?;
    let dataset = Dataset::load(dataset_path)?;

    let report = audit_dataset(
        &dataset,
        &validator,
        &DatasetChecker::new(ConsistencyConfig::default()),
        manifest.as_ref(),
    );

    let summary = ValidationSummary {
        dataset_path: dataset_path.to_path_buf(),
        records: dataset.line_count(),
        report,
        strict,
    };
    if summary.is_acceptable() {
        info!(records = summary.records, "Dataset accepted");
    } else {
        warn!(
            critical = summary.report.count(Severity::Critical),
            major = summary.report.count(Severity::Major),
            minor = summary.report.count(Severity::Minor),
            "Dataset rejected"
        );
    }
    Ok(summary)
}

pub fn run_validation(args: &ValidateArgs) -> Result<ValidationSummary> {
    validate_dataset_file(
        &args.dataset,
        &args.schema,
        args.manifest.as_deref(),
        args.strict,
    )
}
