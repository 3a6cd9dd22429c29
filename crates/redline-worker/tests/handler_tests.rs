//! Message handling without a broker

use async_trait::async_trait;
use redline_domain::{
    ContractChangeResult, ContextualizationResult, ExtractionAgent, StageError, Status, TraceGuard,
};
use redline_extractor::{MockParser, StubContextualizationAgent};
use redline_service::{
    ComparisonService, NoopTracer, RecordingTracer, Settings, SettingsError, SettingsFactory,
    TraceEvent,
};
use redline_worker::{JobHandler, JobResponse};
use serde_json::json;
use std::sync::Arc;

struct RateLimitedExtractor;

#[async_trait]
impl ExtractionAgent for RateLimitedExtractor {
    async fn run(
        &self,
        _context: &ContextualizationResult,
        _trace: Option<&TraceGuard>,
    ) -> Result<ContractChangeResult, StageError> {
        Err(StageError::RateLimited {
            stage: "extraction".to_string(),
            message: "429 Too Many Requests".to_string(),
        })
    }
}

fn offline_handler() -> JobHandler {
    let factory = SettingsFactory::new(Settings::default().offline()).unwrap();
    JobHandler::new(Arc::new(factory))
}

#[tokio::test]
async fn test_job_request_produces_success_reply() {
    let mut handler = offline_handler();
    let body = json!({
        "job_id": "job-7",
        "contract_id": "contract-7",
        "original_image": "mock://original",
        "amendment_image": "mock://amendment",
    });

    let reply = handler.handle(body.to_string().as_bytes()).await.unwrap();

    assert_eq!(reply.job_id, "job-7");
    assert_eq!(reply.contract_id, "contract-7");
    assert_eq!(reply.status, Status::Success);
    assert_eq!(reply.result.as_ref().unwrap().sections_changed, vec!["2. Terms"]);
    assert!(reply.error.is_none());
    assert!(reply.trace_id.is_some());

    let decoded: JobResponse = serde_json::from_slice(&reply.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, reply);

    assert_eq!(handler.metrics().processed, 1);
    assert_eq!(handler.metrics().succeeded, 1);
}

#[tokio::test]
async fn test_malformed_message_is_dropped() {
    let mut handler = offline_handler();

    assert!(handler.handle(b"{not json").await.is_none());
    assert!(handler.handle(br#"{"job_id": "j"}"#).await.is_none());

    assert_eq!(handler.metrics().rejected, 2);
    assert_eq!(handler.metrics().processed, 0);
}

#[tokio::test]
async fn test_stage_failure_becomes_error_reply() {
    let factory = || -> Result<ComparisonService, SettingsError> {
        Ok(ComparisonService::new(
            Arc::new(MockParser::new()),
            Arc::new(StubContextualizationAgent::default()),
            Arc::new(RateLimitedExtractor),
            Arc::new(NoopTracer),
        ))
    };
    let mut handler = JobHandler::new(Arc::new(factory));
    let body = json!({
        "job_id": "job-8",
        "contract_id": "contract-8",
        "original_image": "mock://original",
        "amendment_image": "mock://amendment",
    });

    let reply = handler.handle(body.to_string().as_bytes()).await.unwrap();

    assert_eq!(reply.status, Status::Error);
    assert!(reply.result.is_none());
    assert!(reply.error.as_deref().unwrap().contains("Rate limit"));
    assert_eq!(handler.metrics().failed, 1);
}

#[tokio::test]
async fn test_metadata_reaches_the_trace() {
    let tracer = RecordingTracer::new();
    let factory = {
        let tracer = tracer.clone();
        move || -> Result<ComparisonService, SettingsError> {
            Ok(ComparisonService::new(
                Arc::new(MockParser::new()),
                Arc::new(StubContextualizationAgent::default()),
                Arc::new(redline_extractor::StubExtractionAgent::new(
                    redline_extractor::StubExtractionAgent::default_result()
                        .map_err(|e| SettingsError::Invalid(e.to_string()))?,
                )),
                Arc::new(tracer.clone()),
            ))
        }
    };
    let mut handler = JobHandler::new(Arc::new(factory));
    let body = json!({
        "job_id": "job-9",
        "contract_id": "contract-9",
        "original_image": "mock://original",
        "amendment_image": "mock://amendment",
        "metadata": {"tenant": "acme"},
    });

    handler.handle(body.to_string().as_bytes()).await.unwrap();

    match tracer.events().first() {
        Some(TraceEvent::TraceOpened { contract_id, metadata, .. }) => {
            assert_eq!(contract_id, "contract-9");
            assert_eq!(metadata.get("tenant"), Some(&json!("acme")));
        }
        other => panic!("unexpected first event: {:?}", other),
    }
}
