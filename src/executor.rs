use crate::data_model::{AuthorDocument, ProcessingOutcome};
use crate::error::{PipelineError, Result};
use tracing::{debug, warn};

/// One stage of the curation pipeline. Steps are pure transforms over a single
/// document; rejecting a record is signalled with `PipelineError::RecordFiltered`.
pub trait ProcessingStep: Send + Sync {
    fn name(&self) -> &'static str; // For logging/error reporting

    fn process(&self, document: AuthorDocument) -> Result<AuthorDocument>;
}

pub struct PipelineExecutor {
    steps: Vec<Box<dyn ProcessingStep>>, // Holds the ordered steps
}

impl PipelineExecutor {
    pub fn new(steps: Vec<Box<dyn ProcessingStep>>) -> Self {
        if steps.is_empty() {
            warn!("Pipeline created with no steps.");
        }
        PipelineExecutor { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn run_single(&self, initial_document: AuthorDocument) -> Result<AuthorDocument> {
        let mut current_doc = initial_document;
        for step in &self.steps {
            debug!(step = step.name(), line = current_doc.line, "Running step");
            current_doc = step
                .process(current_doc)
                .map_err(|e| PipelineError::StepError {
                    step_name: step.name().to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(current_doc)
    }

    /// Runs one document and folds a filter rejection into an outcome.
    /// Any other step failure is returned as an error.
    pub fn run_outcome(&self, document: AuthorDocument) -> Result<ProcessingOutcome> {
        match self.run_single(document) {
            Ok(doc) => Ok(ProcessingOutcome::Success(doc)),
            Err(PipelineError::StepError { step_name, source }) => match *source {
                PipelineError::RecordFiltered { document, reason } => {
                    debug!(handle = %document.handle(), %step_name, %reason, "Record was filtered");
                    Ok(ProcessingOutcome::Filtered {
                        document: *document,
                        reason: format!("{}: {}", step_name, reason),
                    })
                }
                other => Err(PipelineError::StepError {
                    step_name,
                    source: Box::new(other),
                }),
            },
            Err(e) => Err(e),
        }
    }
}
