//! HTTP request handlers for the comparison API.
//!
//! Business failures come back as 200 with `status: "error"`; non-2xx is
//! reserved for bad requests, unknown jobs and broken runners.

use crate::jobs::{InMemoryJobStore, JobRecord, JobStatus, JobStore, ProgressRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use chrono::{DateTime, Utc};
use redline_domain::{ContractChangeResult, ProcessingResult};
use redline_service::progress::DEFAULT_PROGRESS_BUFFER;
use redline_service::{ChannelSink, CompareRequest, PipelineFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Builds a fresh pipeline per job
    pub factory: Arc<dyn PipelineFactory>,
    /// Job records for polling
    pub jobs: Arc<dyn JobStore>,
}

impl AppState {
    /// State with an empty in-memory job store
    pub fn new(factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            factory,
            jobs: Arc::new(InMemoryJobStore::new()),
        }
    }
}

/// Comparison request body
#[derive(Debug, Deserialize)]
pub struct CompareRequestBody {
    /// Path or URL of the original contract image
    pub original_image: String,
    /// Path or URL of the amendment image
    pub amendment_image: String,
    /// Optional id, reused as the job id
    #[serde(default)]
    pub contract_id: Option<String>,
    /// Queue the job and return immediately
    #[serde(default, rename = "async")]
    pub async_mode: bool,
}

/// Comparison response
#[derive(Debug, Serialize, Deserialize)]
pub struct CompareResponse {
    /// Job id
    pub job_id: String,
    /// `queued`, `success` or `error`
    pub status: String,
    /// Change result on success
    pub result: Option<ContractChangeResult>,
    /// Error message on failure
    pub error: Option<String>,
    /// Pipeline duration
    pub processing_time_ms: Option<u64>,
    /// Trace correlation id
    pub trace_id: Option<String>,
    /// Note for queued jobs
    pub message: Option<String>,
}

impl CompareResponse {
    fn queued(job_id: String) -> Self {
        Self {
            job_id,
            status: "queued".to_string(),
            result: None,
            error: None,
            processing_time_ms: None,
            trace_id: None,
            message: Some("Job queued for processing".to_string()),
        }
    }

    fn finished(envelope: ProcessingResult) -> Self {
        Self {
            status: envelope.status().to_string(),
            result: envelope.result().cloned(),
            error: envelope.error().map(str::to_string),
            processing_time_ms: Some(envelope.processing_time_ms),
            trace_id: envelope.trace_id,
            job_id: envelope.contract_id,
            message: None,
        }
    }
}

/// Job status response
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job id
    pub job_id: String,
    /// Current status
    pub status: JobStatus,
    /// Change result on success
    pub result: Option<ContractChangeResult>,
    /// Error message on failure
    pub error: Option<String>,
    /// When the job was accepted
    pub created_at: Option<DateTime<Utc>>,
    /// When the job finished
    pub completed_at: Option<DateTime<Utc>>,
}

/// Job progress response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    /// Job id
    pub job_id: String,
    /// Current status
    pub status: JobStatus,
    /// Percentage, 0-100
    pub progress: u8,
    /// Step label
    pub step: String,
    /// Human-readable description
    pub message: String,
    /// When progress was last written
    pub updated_at: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always `healthy` while the process serves requests
    pub status: String,
    /// Server time
    pub timestamp: DateTime<Utc>,
    /// Crate version
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request failed validation
    BadRequest(String),
    /// No such job
    JobNotFound(String),
    /// A job with this id is still running
    JobInProgress(String),
    /// Runner failure outside the pipeline
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::JobNotFound(id) => (StatusCode::NOT_FOUND, format!("Job not found: {}", id)),
            AppError::JobInProgress(id) => {
                (StatusCode::CONFLICT, format!("Job already in progress: {}", id))
            }
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

/// Run one job to completion and record it
///
/// Progress is drained into the store before the final status is written,
/// so a finished job never shows stale progress.
async fn run_job(
    state: AppState,
    job_id: String,
    original: String,
    amendment: String,
) -> ProcessingResult {
    let (sink, mut updates) = ChannelSink::channel(DEFAULT_PROGRESS_BUFFER);
    let drain = {
        let jobs = state.jobs.clone();
        let job_id = job_id.clone();
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                jobs.update_progress(&job_id, ProgressRecord::from(update));
            }
        })
    };

    let request = CompareRequest::new(original, amendment)
        .with_contract_id(job_id.as_str())
        .with_progress(Arc::new(sink));

    let envelope = match state.factory.build() {
        Ok(service) => service.compare(request).await,
        Err(e) => {
            drop(request);
            error!(job_id = %job_id, error = %e, "Failed to build pipeline");
            ProcessingResult::failure(job_id.as_str(), e.to_string(), None, 0)
        }
    };

    if let Err(e) = drain.await {
        error!(job_id = %job_id, error = %e, "Progress drain task failed");
    }
    state.jobs.complete(&job_id, &envelope);
    info!(job_id = %job_id, status = %envelope.status(), "Job completed");
    envelope
}

/// POST /api/v1/contracts/compare - Compare two contract images
///
/// Synchronous by default; with `async: true` the job is queued and its id
/// returned for polling. Either way the pipeline runs on its own task, so a
/// client that disconnects does not cancel it. Reusing the id of a job that
/// has not finished yet is a 409.
async fn compare_contracts(
    State(state): State<AppState>,
    Json(request): Json<CompareRequestBody>,
) -> Result<Json<CompareResponse>, AppError> {
    if request.original_image.trim().is_empty() {
        return Err(AppError::BadRequest("original_image must not be empty".to_string()));
    }
    if request.amendment_image.trim().is_empty() {
        return Err(AppError::BadRequest("amendment_image must not be empty".to_string()));
    }

    let job_id = request
        .contract_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let mode = if request.async_mode { "async" } else { "sync" };
    info!(
        job_id = %job_id,
        mode,
        original = %request.original_image,
        amendment = %request.amendment_image,
        "New comparison job"
    );

    let record = if request.async_mode {
        JobRecord::pending(job_id.as_str())
    } else {
        JobRecord::processing(job_id.as_str())
    };
    if !state.jobs.claim(record) {
        warn!(job_id = %job_id, "Rejected comparison, job still in progress");
        return Err(AppError::JobInProgress(job_id));
    }

    if request.async_mode {
        tokio::spawn(run_job(
            state.clone(),
            job_id.clone(),
            request.original_image,
            request.amendment_image,
        ));
        return Ok(Json(CompareResponse::queued(job_id)));
    }

    let envelope = tokio::spawn(run_job(
        state.clone(),
        job_id,
        request.original_image,
        request.amendment_image,
    ))
    .await
    .map_err(|e| AppError::InternalError(format!("Comparison task failed: {}", e)))?;

    Ok(Json(CompareResponse::finished(envelope)))
}

/// GET /api/v1/jobs/:job_id - Job status
async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = state.jobs.get(&job_id).ok_or(AppError::JobNotFound(job_id))?;

    Ok(Json(JobStatusResponse {
        job_id: job.job_id,
        status: job.status,
        result: job.result,
        error: job.error,
        created_at: Some(job.created_at),
        completed_at: job.completed_at,
    }))
}

/// GET /api/v1/jobs/:job_id/progress - Latest progress
async fn get_job_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let job = state.jobs.get(&job_id).ok_or(AppError::JobNotFound(job_id))?;
    let progress = job.progress.unwrap_or_else(|| ProgressRecord {
        step: "Initializing".to_string(),
        progress: 0,
        message: "Starting processing".to_string(),
        updated_at: Utc::now(),
    });

    Ok(Json(ProgressResponse {
        job_id: job.job_id,
        status: job.status,
        progress: progress.progress,
        step: progress.step,
        message: progress.message,
        updated_at: progress.updated_at,
    }))
}

/// GET /api/v1/health - Liveness
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/contracts/compare", post(compare_contracts))
        .route("/api/v1/jobs/:job_id", get(get_job_status))
        .route("/api/v1/jobs/:job_id/progress", get(get_job_progress))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use redline_service::{Settings, SettingsFactory, TraceBackend};
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState {
        let settings = Settings {
            trace_backend: TraceBackend::Disabled,
            ..Settings::default().offline()
        };
        AppState::new(Arc::new(SettingsFactory::new(settings).unwrap()))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_image_is_bad_request() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/contracts/compare")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"original_image": " ", "amendment_image": "b.png"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
