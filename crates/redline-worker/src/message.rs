//! Queue message contract

use crate::error::WorkerError;
use redline_domain::{ContractChangeResult, ProcessingResult, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inbound job request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Queue-level job id, echoed in the reply
    pub job_id: String,
    /// Contract id passed to the pipeline
    pub contract_id: String,
    /// Path or URL of the original contract image
    pub original_image: String,
    /// Path or URL of the amendment image
    pub amendment_image: String,
    /// Extra trace tags
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl JobRequest {
    /// Decode and sanity-check a message body
    pub fn from_slice(body: &[u8]) -> Result<Self, WorkerError> {
        let request: JobRequest =
            serde_json::from_slice(body).map_err(|e| WorkerError::Malformed(e.to_string()))?;
        for (field, value) in [
            ("job_id", &request.job_id),
            ("original_image", &request.original_image),
            ("amendment_image", &request.amendment_image),
        ] {
            if value.trim().is_empty() {
                return Err(WorkerError::Malformed(format!("{} must not be empty", field)));
            }
        }
        Ok(request)
    }
}

/// Outbound reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse {
    /// Job id from the request
    pub job_id: String,
    /// Contract id the pipeline used
    pub contract_id: String,
    /// `success` or `error`
    pub status: Status,
    /// Change result on success
    pub result: Option<ContractChangeResult>,
    /// Error message on failure
    pub error: Option<String>,
    /// Pipeline duration
    pub processing_time_ms: Option<u64>,
    /// Trace correlation id
    pub trace_id: Option<String>,
}

impl JobResponse {
    /// Reply for `job_id` carrying `envelope`
    pub fn from_envelope(job_id: impl Into<String>, envelope: ProcessingResult) -> Self {
        Self {
            job_id: job_id.into(),
            status: envelope.status(),
            result: envelope.result().cloned(),
            error: envelope.error().map(str::to_string),
            processing_time_ms: Some(envelope.processing_time_ms),
            trace_id: envelope.trace_id,
            contract_id: envelope.contract_id,
        }
    }

    /// JSON body for the reply message
    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkerError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metadata_is_optional() {
        let body = br#"{"job_id": "j-1", "contract_id": "c-1", "original_image": "a.png", "amendment_image": "b.png"}"#;
        let request = JobRequest::from_slice(body).unwrap();
        assert_eq!(request.job_id, "j-1");
        assert!(request.metadata.is_none());
    }

    #[test]
    fn test_request_missing_field_is_malformed() {
        let err = JobRequest::from_slice(br#"{"job_id": "j-1"}"#).unwrap_err();
        assert!(matches!(err, WorkerError::Malformed(_)));
        assert!(err.to_string().contains("contract_id"));
    }

    #[test]
    fn test_request_blank_image_is_malformed() {
        let body = br#"{"job_id": "j-1", "contract_id": "c-1", "original_image": "", "amendment_image": "b.png"}"#;
        let err = JobRequest::from_slice(body).unwrap_err();
        assert!(err.to_string().contains("original_image"));
    }

    #[test]
    fn test_error_reply_shape() {
        let envelope =
            ProcessingResult::failure("c-1", "Rate limit exceeded", Some("t-1".into()), 40);
        let reply = JobResponse::from_envelope("j-1", envelope);
        let json: Value = serde_json::from_slice(&reply.to_bytes().unwrap()).unwrap();

        assert_eq!(json["job_id"], "j-1");
        assert_eq!(json["contract_id"], "c-1");
        assert_eq!(json["status"], "error");
        assert!(json["result"].is_null());
        assert_eq!(json["error"], "Rate limit exceeded");
        assert_eq!(json["processing_time_ms"], 40);
        assert_eq!(json["trace_id"], "t-1");
    }
}
