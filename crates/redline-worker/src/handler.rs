//! Turning one message body into one reply

use crate::message::{JobRequest, JobResponse};
use crate::metrics::WorkerMetrics;
use redline_domain::ProcessingResult;
use redline_service::{CompareRequest, PipelineFactory};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs the pipeline for queue messages, one at a time
pub struct JobHandler {
    factory: Arc<dyn PipelineFactory>,
    metrics: WorkerMetrics,
}

impl JobHandler {
    /// Handler building a fresh pipeline per message
    pub fn new(factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            factory,
            metrics: WorkerMetrics::new(),
        }
    }

    /// Process one message body
    ///
    /// Returns `None` for malformed messages, which are logged and dropped.
    pub async fn handle(&mut self, body: &[u8]) -> Option<JobResponse> {
        let request = match JobRequest::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Dropping message");
                self.metrics.record_rejected();
                return None;
            }
        };

        info!(job_id = %request.job_id, contract_id = %request.contract_id, "Processing job");

        let envelope = match self.factory.build() {
            Ok(service) => {
                let compare = CompareRequest::new(request.original_image, request.amendment_image)
                    .with_contract_id(request.contract_id.as_str())
                    .with_metadata(request.metadata.unwrap_or_default());
                service.compare(compare).await
            }
            Err(e) => {
                error!(job_id = %request.job_id, error = %e, "Failed to build pipeline");
                ProcessingResult::failure(request.contract_id.as_str(), e.to_string(), None, 0)
            }
        };

        self.metrics.record_outcome(envelope.is_success());
        match envelope.error() {
            None => info!(job_id = %request.job_id, "Job completed: success"),
            Some(message) => {
                warn!(job_id = %request.job_id, error = %message, "Job completed: error")
            }
        }

        Some(JobResponse::from_envelope(request.job_id, envelope))
    }

    /// Note a published reply
    pub fn record_reply(&mut self) {
        self.metrics.record_reply();
    }

    /// Counters so far
    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }
}
