//! The comparison pipeline
//!
//! `ComparisonService::compare` runs parse(original), parse(amendment),
//! contextualize, extract and validate, strictly in that order, and always
//! returns a `ProcessingResult`. The first failing stage ends the call; no
//! stage is retried and no partial result escapes.

use futures::FutureExt;
use redline_domain::{
    ContextualizationAgent, ContextualizationResult, ContractChangeResult, DocumentStructure,
    DocumentType, ExtractionAgent, ImageParser, ProcessingResult, ProgressSink, ProgressUpdate,
    SpanOutcome, StageError, TraceContext, TraceGuard, Tracer,
};
use serde_json::{json, Map, Value};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Name of the root trace opened for every call
pub const TRACE_NAME: &str = "contract_comparison";

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Parse the original contract image
    ParseOriginal,
    /// Parse the amendment image
    ParseAmendment,
    /// Map sections between the two documents
    Contextualize,
    /// Derive the change description
    Extract,
    /// Re-validate the change description
    Validate,
}

impl Stage {
    /// Progress step label
    pub fn step(self) -> &'static str {
        match self {
            Stage::ParseOriginal => "Step 1/5",
            Stage::ParseAmendment => "Step 2/5",
            Stage::Contextualize => "Step 3/5",
            Stage::Extract => "Step 4/5",
            Stage::Validate => "Step 5/5",
        }
    }

    /// Name of the span wrapping this stage
    pub fn span_name(self) -> &'static str {
        match self {
            Stage::ParseOriginal => "parse_original_contract",
            Stage::ParseAmendment => "parse_amendment_contract",
            Stage::Contextualize => "agent1_contextualization",
            Stage::Extract => "agent2_extraction",
            Stage::Validate => "schema_validation",
        }
    }

    fn started(self) -> (u8, &'static str) {
        match self {
            Stage::ParseOriginal => (10, "Parsing original contract..."),
            Stage::ParseAmendment => (30, "Parsing amendment contract..."),
            Stage::Contextualize => (50, "Contextualizing documents with AI..."),
            Stage::Extract => (70, "Extracting changes with AI..."),
            Stage::Validate => (90, "Validating results..."),
        }
    }

    fn finished(self) -> Option<(u8, &'static str)> {
        match self {
            Stage::ParseOriginal => Some((20, "Original contract parsed successfully")),
            Stage::ParseAmendment => Some((40, "Amendment contract parsed successfully")),
            Stage::Contextualize => Some((60, "Contextualization complete")),
            Stage::Extract => Some((85, "Change extraction complete")),
            Stage::Validate => None,
        }
    }
}

/// Inputs for one comparison
#[derive(Clone)]
pub struct CompareRequest {
    /// Path or URL of the original contract image
    pub original_image: String,
    /// Path or URL of the amendment image
    pub amendment_image: String,
    /// Caller-supplied identifier; generated when absent
    pub contract_id: Option<String>,
    /// Extra tags for the trace
    pub metadata: Map<String, Value>,
    /// Optional progress receiver
    pub progress: Option<Arc<dyn ProgressSink>>,
}

impl CompareRequest {
    /// Request for two image references
    pub fn new(original_image: impl Into<String>, amendment_image: impl Into<String>) -> Self {
        Self {
            original_image: original_image.into(),
            amendment_image: amendment_image.into(),
            contract_id: None,
            metadata: Map::new(),
            progress: None,
        }
    }

    /// Use an explicit contract id
    pub fn with_contract_id(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    /// Attach trace metadata
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a progress receiver
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }
}

impl fmt::Debug for CompareRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompareRequest")
            .field("original_image", &self.original_image)
            .field("amendment_image", &self.amendment_image)
            .field("contract_id", &self.contract_id)
            .field("metadata", &self.metadata)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Fire-and-forget progress reporting; a panicking sink is logged and ignored
struct Reporter<'a> {
    sink: Option<&'a dyn ProgressSink>,
    contract_id: &'a str,
}

impl Reporter<'_> {
    fn emit(&self, step: &str, progress: u8, message: &str) {
        let Some(sink) = self.sink else {
            return;
        };
        let update = ProgressUpdate::processing(step, progress, message);
        if std::panic::catch_unwind(AssertUnwindSafe(|| sink.notify(update))).is_err() {
            warn!(contract_id = %self.contract_id, step, "Progress callback panicked, continuing");
        }
    }

    fn started(&self, stage: Stage) {
        let (progress, message) = stage.started();
        self.emit(stage.step(), progress, message);
    }

    fn finished(&self, stage: Stage) {
        if let Some((progress, message)) = stage.finished() {
            self.emit(stage.step(), progress, message);
        }
    }
}

/// Run `work` inside a span named after `stage`
///
/// The span records `summary` of the output on success, the error message on
/// failure, and closes as abandoned if the future is dropped.
async fn traced<T, Fut>(
    trace: &TraceGuard,
    stage: Stage,
    input: Value,
    work: Fut,
    summary: impl FnOnce(&T) -> Value,
) -> Result<T, StageError>
where
    Fut: Future<Output = Result<T, StageError>>,
{
    debug!(stage = stage.span_name(), "Stage started");
    let span = trace.span(stage.span_name(), input);
    let result = work.await;
    match &result {
        Ok(value) => span.close(SpanOutcome::Success(summary(value))),
        Err(e) => span.close(SpanOutcome::Error(e.to_string())),
    }
    result
}

fn document_summary(doc: &DocumentStructure) -> Value {
    json!({"title": doc.title, "sections_count": doc.sections.len()})
}

/// Orchestrates the three stages behind their traits
pub struct ComparisonService {
    parser: Arc<dyn ImageParser>,
    contextualizer: Arc<dyn ContextualizationAgent>,
    extractor: Arc<dyn ExtractionAgent>,
    tracer: Arc<dyn Tracer>,
    strict_fallbacks: bool,
}

impl fmt::Debug for ComparisonService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonService")
            .field("parser", &self.parser.name())
            .field("strict_fallbacks", &self.strict_fallbacks)
            .finish_non_exhaustive()
    }
}

impl ComparisonService {
    /// Service over the given collaborators
    pub fn new(
        parser: Arc<dyn ImageParser>,
        contextualizer: Arc<dyn ContextualizationAgent>,
        extractor: Arc<dyn ExtractionAgent>,
        tracer: Arc<dyn Tracer>,
    ) -> Self {
        Self {
            parser,
            contextualizer,
            extractor,
            tracer,
            strict_fallbacks: false,
        }
    }

    /// Report fallback placeholders as warnings on the envelope
    pub fn with_strict_fallbacks(mut self, strict: bool) -> Self {
        self.strict_fallbacks = strict;
        self
    }

    /// Compare two contract images
    ///
    /// Never fails: every error, including a panic inside a stage, ends up in
    /// the envelope's `error` field. Dropping the returned future cancels the
    /// in-flight stage and closes the trace as abandoned.
    pub async fn compare(&self, request: CompareRequest) -> ProcessingResult {
        let started = Instant::now();
        let contract_id = request
            .contract_id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        let mut metadata = Map::new();
        metadata.insert("original_image".into(), Value::String(request.original_image.clone()));
        metadata.insert("amendment_image".into(), Value::String(request.amendment_image.clone()));
        metadata.extend(request.metadata.clone());

        let trace = TraceGuard::open(
            self.tracer.as_ref(),
            TRACE_NAME,
            &TraceContext::new(&contract_id).with_metadata(metadata),
        );
        let trace_id = trace.trace_id();
        let reporter = Reporter {
            sink: request.progress.as_deref(),
            contract_id: &contract_id,
        };

        info!(
            contract_id = %contract_id,
            parser = self.parser.name(),
            original = %request.original_image,
            amendment = %request.amendment_image,
            "Starting contract comparison"
        );

        let outcome = AssertUnwindSafe(self.run_stages(&request, &trace, &reporter))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(StageError::Internal(panic_message(panic))));

        let processing_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                reporter.emit("Completed", 100, "Processing complete!");
                trace.close(SpanOutcome::Success(json!({"status": "success"})));
                info!(
                    contract_id = %contract_id,
                    processing_time_ms,
                    "Contract comparison succeeded"
                );

                let warnings = if self.strict_fallbacks {
                    fallback_warnings(&result)
                } else {
                    Vec::new()
                };
                ProcessingResult::success(contract_id, result, trace_id, processing_time_ms)
                    .with_warnings(warnings)
            }
            Err(e) => {
                let message = e.to_string();
                error!(
                    contract_id = %contract_id,
                    kind = ?e.kind(),
                    error = %message,
                    processing_time_ms,
                    "Contract comparison failed"
                );
                trace.close(SpanOutcome::Error(message.clone()));
                ProcessingResult::failure(contract_id, message, trace_id, processing_time_ms)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &CompareRequest,
        trace: &TraceGuard,
        reporter: &Reporter<'_>,
    ) -> Result<ContractChangeResult, StageError> {
        reporter.started(Stage::ParseOriginal);
        let original = traced(
            trace,
            Stage::ParseOriginal,
            json!({"path": request.original_image}),
            self.parser.parse(&request.original_image, DocumentType::Original, Some(trace)),
            document_summary,
        )
        .await?;
        reporter.finished(Stage::ParseOriginal);

        reporter.started(Stage::ParseAmendment);
        let amendment = traced(
            trace,
            Stage::ParseAmendment,
            json!({"path": request.amendment_image}),
            self.parser.parse(&request.amendment_image, DocumentType::Amendment, Some(trace)),
            document_summary,
        )
        .await?;
        reporter.finished(Stage::ParseAmendment);

        reporter.started(Stage::Contextualize);
        let context = traced(
            trace,
            Stage::Contextualize,
            json!({"original_title": original.title, "amendment_title": amendment.title}),
            self.contextualizer.run(&original, &amendment, Some(trace)),
            |c: &ContextualizationResult| {
                json!({
                    "corresponding_sections_count": c.corresponding_sections.len(),
                    "analysis_notes_length": c.analysis_notes.len(),
                })
            },
        )
        .await?;
        reporter.finished(Stage::Contextualize);

        reporter.started(Stage::Extract);
        let changes = traced(
            trace,
            Stage::Extract,
            json!({"sections_to_analyze": context.corresponding_sections.len()}),
            self.extractor.run(&context, Some(trace)),
            |c: &ContractChangeResult| {
                json!({"sections_changed": c.sections_changed, "topics_touched": c.topics_touched})
            },
        )
        .await?;
        reporter.finished(Stage::Extract);

        reporter.started(Stage::Validate);
        let validated = traced(
            trace,
            Stage::Validate,
            json!({
                "sections_changed": changes.sections_changed,
                "topics_touched": changes.topics_touched,
            }),
            async { changes.revalidate().map_err(StageError::from) },
            |_| json!({"validation": "success", "fields_validated": 3}),
        )
        .await?;

        Ok(validated)
    }
}

fn fallback_warnings(result: &ContractChangeResult) -> Vec<String> {
    result
        .fallback_fields()
        .into_iter()
        .map(|field| {
            format!(
                "{}: extraction returned nothing, fallback placeholder substituted",
                field.field_name()
            )
        })
        .collect()
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("stage panicked: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_percentages_are_increasing() {
        let stages = [
            Stage::ParseOriginal,
            Stage::ParseAmendment,
            Stage::Contextualize,
            Stage::Extract,
            Stage::Validate,
        ];
        let mut seen = Vec::new();
        for stage in stages {
            seen.push(stage.started().0);
            if let Some((p, _)) = stage.finished() {
                seen.push(p);
            }
        }
        assert_eq!(seen, vec![10, 20, 30, 40, 50, 60, 70, 85, 90]);
    }

    #[test]
    fn test_panic_message_downcasts() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload), "stage panicked: boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload), "stage panicked: bang");
    }

    #[test]
    fn test_request_builder() {
        let request = CompareRequest::new("a.png", "b.png").with_contract_id("c-1");
        assert_eq!(request.contract_id.as_deref(), Some("c-1"));
        assert!(format!("{:?}", request).contains("a.png"));
    }
}
