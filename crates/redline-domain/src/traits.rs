//! Stage interfaces
//!
//! Each stage is a capability, not a base class: the comparison service only
//! sees these traits, and production and stub implementations are
//! interchangeable behind `Arc<dyn _>`.

use crate::context::ContextualizationResult;
use crate::change::ContractChangeResult;
use crate::document::{DocumentStructure, DocumentType};
use crate::error::StageError;
use crate::trace::TraceGuard;
use async_trait::async_trait;

/// Turns one contract image into a `DocumentStructure`
///
/// `image_ref` is a local path or a remote URL; resolving it is the
/// implementation's job. On success the structure satisfies every invariant
/// of `DocumentStructure`; there is no partial result.
#[async_trait]
pub trait ImageParser: Send + Sync {
    /// Parse one image
    async fn parse(
        &self,
        image_ref: &str,
        document_type: DocumentType,
        trace: Option<&TraceGuard>,
    ) -> Result<DocumentStructure, StageError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Maps the sections of two documents onto each other
///
/// An empty mapping is a valid answer. An unparsable upstream payload is not,
/// and must come back as an error.
#[async_trait]
pub trait ContextualizationAgent: Send + Sync {
    /// Run contextualization over both parsed documents
    async fn run(
        &self,
        original: &DocumentStructure,
        amendment: &DocumentStructure,
        trace: Option<&TraceGuard>,
    ) -> Result<ContextualizationResult, StageError>;
}

/// Derives the final change description
#[async_trait]
pub trait ExtractionAgent: Send + Sync {
    /// Run extraction over a contextualization result
    async fn run(
        &self,
        context: &ContextualizationResult,
        trace: Option<&TraceGuard>,
    ) -> Result<ContractChangeResult, StageError>;
}
