//! Redline Domain Layer
//!
//! Value types, validation rules and stage interfaces for the contract
//! comparison pipeline. Nothing in here talks to the network; the stages are
//! implemented in `redline-extractor` and orchestrated by `redline-service`.
//!
//! ## Key Concepts
//!
//! - **DocumentStructure**: title, sections and text parsed from one image
//! - **ContextualizationResult**: section correspondence between two documents
//! - **ContractChangeResult**: the validated change description
//! - **ProcessingResult**: the envelope every entry point returns
//! - **Stages**: `ImageParser`, `ContextualizationAgent`, `ExtractionAgent`
//! - **Tracing**: `Tracer` backends behind close-once guards

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod context;
pub mod document;
pub mod envelope;
pub mod error;
pub mod progress;
pub mod trace;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use change::{ContractChangeResult, FallbackField};
pub use context::{ContextualizationResult, Relationship, SectionMapping};
pub use document::{DocumentStructure, DocumentType};
pub use envelope::{Outcome, ProcessingResult, Status};
pub use error::{ErrorKind, StageError};
pub use progress::{ProgressSink, ProgressUpdate};
pub use trace::{
    Span, SpanGuard, SpanKind, SpanOutcome, TraceContext, TraceGuard, TraceScope, Tracer,
};
pub use traits::{ContextualizationAgent, ExtractionAgent, ImageParser};
pub use validation::{ValidationError, Violation, ViolationKind};
