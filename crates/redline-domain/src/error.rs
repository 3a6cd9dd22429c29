//! Stage error taxonomy
//!
//! Every stage fails with a `StageError`. The comparison service is the only
//! place that turns one into text (the envelope's `error` field).

use crate::validation::ValidationError;
use thiserror::Error;

/// Coarse classification of a stage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-correctable input problem
    Input,
    /// External generation service failed
    Upstream,
    /// Response could not be parsed or broke a structural invariant
    Schema,
    /// Anything else
    Internal,
}

/// Errors raised by parsing, contextualization and extraction
#[derive(Error, Debug)]
pub enum StageError {
    /// Image reference points nowhere
    #[error("Image file not found: {0}")]
    NotFound(String),

    /// Image extension is not one of the accepted formats
    #[error("Unsupported image format '{format}'. Supported formats: {supported}")]
    UnsupportedFormat {
        /// Offending extension
        format: String,
        /// Accepted extensions, comma separated
        supported: String,
    },

    /// Image exceeds the size cap
    #[error("Image file too large: {size_mb:.1}MB (max {max_mb}MB)")]
    TooLarge {
        /// Actual size in megabytes
        size_mb: f64,
        /// Cap in megabytes
        max_mb: u64,
    },

    /// Image exists but could not be read or fetched
    #[error("Failed to read image {reference}: {reason}")]
    Unreadable {
        /// Path or URL
        reference: String,
        /// Underlying cause
        reason: String,
    },

    /// Upstream service throttled the call
    #[error("Rate limit exceeded during {stage}: {message}")]
    RateLimited {
        /// Stage that made the call
        stage: String,
        /// Upstream detail
        message: String,
    },

    /// Upstream call did not answer in time
    #[error("Request timed out during {stage}: {message}")]
    Timeout {
        /// Stage that made the call
        stage: String,
        /// Upstream detail
        message: String,
    },

    /// Upstream service could not be reached
    #[error("Connection failed during {stage}: {message}")]
    Connection {
        /// Stage that made the call
        stage: String,
        /// Upstream detail
        message: String,
    },

    /// Upstream returned a generic error
    #[error("Service error during {stage}: {message}")]
    Service {
        /// Stage that made the call
        stage: String,
        /// Upstream detail
        message: String,
    },

    /// Upstream payload could not be parsed at all
    #[error("Malformed response during {stage}: {message}")]
    MalformedResponse {
        /// Stage that made the call
        stage: String,
        /// Parse failure detail
        message: String,
    },

    /// Payload parsed but broke a structural invariant
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unexpected failure inside the pipeline itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StageError {
    /// Which taxonomy bucket this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::NotFound(_)
            | StageError::UnsupportedFormat { .. }
            | StageError::TooLarge { .. }
            | StageError::Unreadable { .. } => ErrorKind::Input,
            StageError::RateLimited { .. }
            | StageError::Timeout { .. }
            | StageError::Connection { .. }
            | StageError::Service { .. } => ErrorKind::Upstream,
            StageError::MalformedResponse { .. } | StageError::Validation(_) => ErrorKind::Schema,
            StageError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a malformed upstream payload
    pub fn malformed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        StageError::MalformedResponse {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Violation, ViolationKind};

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(StageError::NotFound("a.png".into()).kind(), ErrorKind::Input);
        assert_eq!(
            StageError::TooLarge { size_mb: 25.0, max_mb: 20 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(
            StageError::RateLimited { stage: "parse".into(), message: "429".into() }.kind(),
            ErrorKind::Upstream
        );
        assert_eq!(StageError::malformed("extraction", "not json").kind(), ErrorKind::Schema);
        assert_eq!(StageError::Internal("boom".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let validation = ValidationError {
            entity: "DocumentStructure",
            violations: vec![Violation { field: "title", issue: ViolationKind::Empty }],
        };
        let err: StageError = validation.clone().into();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.to_string(), validation.to_string());
    }

    #[test]
    fn test_messages_name_the_upstream_condition() {
        let timeout = StageError::Timeout {
            stage: "contextualization".into(),
            message: "120s".into(),
        };
        assert!(timeout.to_string().contains("timed out"));

        let size = StageError::TooLarge { size_mb: 21.5, max_mb: 20 };
        assert_eq!(size.to_string(), "Image file too large: 21.5MB (max 20MB)");
    }
}
