//! Deterministic stub agents

use async_trait::async_trait;
use redline_domain::{
    ContextualizationAgent, ContextualizationResult, ContractChangeResult, DocumentStructure,
    ExtractionAgent, Relationship, SectionMapping, StageError, TraceGuard,
};

/// Summary returned by the default stub extraction agent
pub const STUB_SUMMARY: &str = "Section 2 now runs for twenty-four months instead of twelve.";

/// Contextualization agent returning a fixed mapping
#[derive(Debug, Clone)]
pub struct StubContextualizationAgent {
    mappings: Vec<SectionMapping>,
    notes: String,
}

impl StubContextualizationAgent {
    /// Stub returning `mappings` and `notes`
    pub fn new(mappings: Vec<SectionMapping>, notes: impl Into<String>) -> Self {
        Self {
            mappings,
            notes: notes.into(),
        }
    }
}

impl Default for StubContextualizationAgent {
    fn default() -> Self {
        Self::new(
            vec![SectionMapping::new("2. Terms", "2. Terms (Amended)", Relationship::Modified)],
            "The amendment modifies the Terms section.",
        )
    }
}

#[async_trait]
impl ContextualizationAgent for StubContextualizationAgent {
    async fn run(
        &self,
        original: &DocumentStructure,
        amendment: &DocumentStructure,
        _trace: Option<&TraceGuard>,
    ) -> Result<ContextualizationResult, StageError> {
        Ok(ContextualizationResult {
            original_structure: original.clone(),
            amendment_structure: amendment.clone(),
            corresponding_sections: self.mappings.clone(),
            analysis_notes: self.notes.clone(),
        })
    }
}

/// Extraction agent returning a fixed result
#[derive(Debug, Clone)]
pub struct StubExtractionAgent {
    result: ContractChangeResult,
}

impl StubExtractionAgent {
    /// Stub returning `result`
    pub fn new(result: ContractChangeResult) -> Self {
        Self { result }
    }

    /// The default stub's answer
    pub fn default_result() -> Result<ContractChangeResult, StageError> {
        Ok(ContractChangeResult::new(
            vec!["2. Terms".into()],
            vec!["Duration".into()],
            STUB_SUMMARY,
        )?)
    }
}

#[async_trait]
impl ExtractionAgent for StubExtractionAgent {
    async fn run(
        &self,
        _context: &ContextualizationResult,
        _trace: Option<&TraceGuard>,
    ) -> Result<ContractChangeResult, StageError> {
        Ok(self.result.clone())
    }
}
