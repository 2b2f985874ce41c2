use influx_gate::data_model::{AuthorDocument, ProcessingOutcome};
use influx_gate::error::{PipelineError, Result};
use influx_gate::executor::{PipelineExecutor, ProcessingStep};
use serde_json::json;

fn create_test_document(line: usize, handle: &str) -> AuthorDocument {
    AuthorDocument::new(line, json!({"handle": handle, "followers_count": 10}))
}

// Mock ProcessingStep
struct MockProcessingStep {
    name: &'static str,
    process_fn: fn(AuthorDocument) -> Result<AuthorDocument>,
}

impl MockProcessingStep {
    fn new(name: &'static str, process_fn: fn(AuthorDocument) -> Result<AuthorDocument>) -> Self {
        MockProcessingStep { name, process_fn }
    }
}

impl ProcessingStep for MockProcessingStep {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, document: AuthorDocument) -> Result<AuthorDocument> {
        (self.process_fn)(document)
    }
}

fn mock_step_passthrough(doc: AuthorDocument) -> Result<AuthorDocument> {
    Ok(doc)
}

fn mock_step_bump_followers(mut doc: AuthorDocument) -> Result<AuthorDocument> {
    let followers = doc.record["followers_count"].as_u64().unwrap_or(0);
    doc.record["followers_count"] = json!(followers * 10);
    Ok(doc)
}

fn mock_step_filter_small(doc: AuthorDocument) -> Result<AuthorDocument> {
    if doc.record["followers_count"].as_u64().unwrap_or(0) < 1_000 {
        return Err(PipelineError::RecordFiltered {
            document: Box::new(doc),
            reason: "too small".to_string(),
        });
    }
    Ok(doc)
}

fn mock_step_io_failure(_doc: AuthorDocument) -> Result<AuthorDocument> {
    Err(PipelineError::IoError {
        source: std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
    })
}

#[test]
fn test_new_executor_with_empty_steps() {
    let executor = PipelineExecutor::new(vec![]);
    assert!(executor.step_names().is_empty());
    let doc = create_test_document(1, "a");
    let result = executor.run_single(doc.clone()).expect("empty pipeline passes");
    assert_eq!(result, doc);
}

#[test]
fn test_steps_run_in_order() {
    let steps: Vec<Box<dyn ProcessingStep>> = vec![
        Box::new(MockProcessingStep::new("bump", mock_step_bump_followers)),
        Box::new(MockProcessingStep::new("bump_again", mock_step_bump_followers)),
        Box::new(MockProcessingStep::new("filter", mock_step_filter_small)),
    ];
    let executor = PipelineExecutor::new(steps);
    assert_eq!(executor.step_names(), vec!["bump", "bump_again", "filter"]);

    let doc = executor
        .run_single(create_test_document(1, "a"))
        .expect("100x followers survive the filter");
    assert_eq!(doc.record["followers_count"], 1000);
}

#[test]
fn test_step_error_is_wrapped_with_step_name() {
    let steps: Vec<Box<dyn ProcessingStep>> = vec![
        Box::new(MockProcessingStep::new("ok", mock_step_passthrough)),
        Box::new(MockProcessingStep::new("broken", mock_step_io_failure)),
    ];
    let executor = PipelineExecutor::new(steps);
    match executor.run_single(create_test_document(1, "a")) {
        Err(PipelineError::StepError { step_name, source }) => {
            assert_eq!(step_name, "broken");
            assert!(matches!(*source, PipelineError::IoError { .. }));
        }
        other => panic!("expected StepError, got {:?}", other),
    }
}

#[test]
fn test_filtered_record_becomes_outcome() {
    let steps: Vec<Box<dyn ProcessingStep>> = vec![Box::new(MockProcessingStep::new(
        "filter",
        mock_step_filter_small,
    ))];
    let executor = PipelineExecutor::new(steps);
    match executor.run_outcome(create_test_document(7, "tiny")).expect("no hard error") {
        ProcessingOutcome::Filtered { document, reason } => {
            assert_eq!(document.line, 7);
            assert_eq!(reason, "filter: too small");
        }
        ProcessingOutcome::Success(_) => panic!("record should have been filtered"),
    }
}
