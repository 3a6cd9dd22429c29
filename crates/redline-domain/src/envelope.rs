//! Result envelope returned from every entry point
//!
//! The outcome is a sum type, so a success always carries a result and an
//! error always carries a message. The flat wire shape (`status`, `result`,
//! `error`) is produced and checked at the serde boundary.

use crate::change::ContractChangeResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Pipeline finished and the result passed validation
    Success,
    /// Some stage failed
    Error,
}

impl Status {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a `compare` call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Validated change description
    Success(ContractChangeResult),
    /// Human-readable failure message
    Error(String),
}

/// Envelope for one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ProcessingResultWire", try_from = "ProcessingResultWire")]
pub struct ProcessingResult {
    /// Caller-supplied or generated identifier
    pub contract_id: String,
    /// Result or error
    pub outcome: Outcome,
    /// Correlation id from the tracing collaborator
    pub trace_id: Option<String>,
    /// Wall-clock duration of the whole call
    pub processing_time_ms: u64,
    /// Non-fatal notes (fallback substitutions in strict mode)
    pub warnings: Vec<String>,
}

impl ProcessingResult {
    /// Successful envelope
    pub fn success(
        contract_id: impl Into<String>,
        result: ContractChangeResult,
        trace_id: Option<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            outcome: Outcome::Success(result),
            trace_id,
            processing_time_ms,
            warnings: Vec::new(),
        }
    }

    /// Failed envelope
    pub fn failure(
        contract_id: impl Into<String>,
        error: impl Into<String>,
        trace_id: Option<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            outcome: Outcome::Error(error.into()),
            trace_id,
            processing_time_ms,
            warnings: Vec::new(),
        }
    }

    /// Attach non-fatal warnings
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// `success` or `error`
    pub fn status(&self) -> Status {
        match self.outcome {
            Outcome::Success(_) => Status::Success,
            Outcome::Error(_) => Status::Error,
        }
    }

    /// Whether the pipeline succeeded
    pub fn is_success(&self) -> bool {
        self.status() == Status::Success
    }

    /// The change result, present iff status is success
    pub fn result(&self) -> Option<&ContractChangeResult> {
        match &self.outcome {
            Outcome::Success(result) => Some(result),
            Outcome::Error(_) => None,
        }
    }

    /// The error message, present iff status is error
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }
}

/// Flat wire representation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProcessingResultWire {
    contract_id: String,
    status: Status,
    result: Option<ContractChangeResult>,
    error: Option<String>,
    trace_id: Option<String>,
    #[serde(default)]
    processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl From<ProcessingResult> for ProcessingResultWire {
    fn from(envelope: ProcessingResult) -> Self {
        let status = envelope.status();
        let (result, error) = match envelope.outcome {
            Outcome::Success(result) => (Some(result), None),
            Outcome::Error(message) => (None, Some(message)),
        };
        Self {
            contract_id: envelope.contract_id,
            status,
            result,
            error,
            trace_id: envelope.trace_id,
            processing_time_ms: envelope.processing_time_ms,
            warnings: envelope.warnings,
        }
    }
}

impl TryFrom<ProcessingResultWire> for ProcessingResult {
    type Error = String;

    fn try_from(wire: ProcessingResultWire) -> Result<Self, Self::Error> {
        let outcome = match (wire.status, wire.result, wire.error) {
            (Status::Success, Some(result), None) => Outcome::Success(result),
            (Status::Error, None, Some(message)) => Outcome::Error(message),
            (status, result, error) => {
                return Err(format!(
                    "inconsistent envelope: status={} result={} error={}",
                    status,
                    if result.is_some() { "present" } else { "null" },
                    if error.is_some() { "present" } else { "null" },
                ))
            }
        };
        Ok(Self {
            contract_id: wire.contract_id,
            outcome,
            trace_id: wire.trace_id,
            processing_time_ms: wire.processing_time_ms,
            warnings: wire.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn change() -> ContractChangeResult {
        ContractChangeResult::new(vec!["Section 1".into()], vec!["Terms".into()], "A".repeat(50))
            .unwrap()
    }

    #[test]
    fn test_success_wire_shape() {
        let envelope =
            ProcessingResult::success("test-123", change(), Some("trace-456".into()), 12);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["error"], Value::Null);
        assert_eq!(value["result"]["sections_changed"], json!(["Section 1"]));
        assert_eq!(value["trace_id"], "trace-456");
        assert_eq!(value["processing_time_ms"], 12);
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_error_wire_shape() {
        let envelope = ProcessingResult::failure("test-123", "Failed to parse image", None, 3);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["result"], Value::Null);
        assert_eq!(value["error"], "Failed to parse image");
        assert_eq!(value["trace_id"], Value::Null);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_envelopes() {
        let both_null = json!({
            "contract_id": "x", "status": "error", "result": null, "error": null, "trace_id": null
        });
        assert!(serde_json::from_value::<ProcessingResult>(both_null).is_err());

        let success_with_error = json!({
            "contract_id": "x", "status": "success",
            "result": {"sections_changed": ["S"], "topics_touched": ["T"], "summary_of_the_change": "A".repeat(50)},
            "error": "boom", "trace_id": null
        });
        assert!(serde_json::from_value::<ProcessingResult>(success_with_error).is_err());
    }

    #[test]
    fn test_deserialize_revalidates_result() {
        let thin = json!({
            "contract_id": "x", "status": "success",
            "result": {"sections_changed": ["S"], "topics_touched": ["T"], "summary_of_the_change": "short"},
            "error": null, "trace_id": null
        });
        assert!(serde_json::from_value::<ProcessingResult>(thin).is_err());
    }

    #[test]
    fn test_warnings_round_trip() {
        let envelope = ProcessingResult::success("id", change(), None, 1)
            .with_warnings(vec!["topics_touched: fallback placeholder".into()]);
        let parsed: ProcessingResult =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }

    proptest! {
        #[test]
        fn prop_envelope_exclusivity(
            success in any::<bool>(),
            message in "[a-z ]{1,40}",
            ms in 0u64..100_000,
        ) {
            let envelope = if success {
                ProcessingResult::success("id", change(), None, ms)
            } else {
                ProcessingResult::failure("id", message, None, ms)
            };
            let value = serde_json::to_value(&envelope).unwrap();
            let has_result = !value["result"].is_null();
            let has_error = !value["error"].is_null();

            prop_assert!(has_result ^ has_error);
            prop_assert_eq!(value["status"] == "success", has_result);
            prop_assert_eq!(envelope.is_success(), envelope.result().is_some());
            prop_assert_eq!(!envelope.is_success(), envelope.error().is_some());
        }
    }
}
