//! Contextualization agent backed by a chat model

use crate::call;
use crate::config::ExtractorConfig;
use crate::json::{parse_object, string_field};
use crate::prompt::{PromptBuilder, CONTEXTUALIZATION_INSTRUCTIONS};
use async_trait::async_trait;
use redline_domain::trace::generation;
use redline_domain::{
    ContextualizationAgent, ContextualizationResult, DocumentStructure, Relationship,
    SectionMapping, StageError, TraceGuard,
};
use redline_llm::{ChatMessage, ChatProvider, ChatRequest};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "contextualization";

/// Maps sections of the two documents with one model call
pub struct LlmContextualizationAgent {
    provider: Arc<dyn ChatProvider>,
    prompts: PromptBuilder,
    config: ExtractorConfig,
}

impl LlmContextualizationAgent {
    /// Create an agent over `provider`
    pub fn new(provider: Arc<dyn ChatProvider>, config: ExtractorConfig) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(config.max_prompt_text_chars),
            config,
        }
    }
}

fn mapping_from_value(index: usize, value: &Value) -> Result<SectionMapping, StageError> {
    let obj = value.as_object().ok_or_else(|| {
        StageError::malformed(STAGE, format!("corresponding_sections[{}] is not an object", index))
    })?;

    let text = |key: &str| -> Result<String, StageError> {
        Ok(string_field(obj, key, STAGE)?.unwrap_or_default())
    };

    let raw = string_field(obj, "relationship", STAGE)?.or(string_field(obj, "status", STAGE)?);
    let relationship = match raw {
        None => Relationship::default(),
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(index, error = %e, "Unknown section relationship, treating as modified");
            Relationship::default()
        }),
    };

    Ok(SectionMapping::new(
        text("original_section")?,
        text("amendment_section")?,
        relationship,
    ))
}

fn mappings_from_map(map: &Map<String, Value>) -> Result<Vec<SectionMapping>, StageError> {
    match map.get("corresponding_sections") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| mapping_from_value(i, item))
            .collect(),
        Some(_) => Err(StageError::malformed(STAGE, "'corresponding_sections' must be a list")),
    }
}

/// Build a `ContextualizationResult` from the model's JSON answer
///
/// A missing or empty mapping is a valid result. A payload that is not a
/// JSON object, or a mapping that is not a list of objects, is an error.
pub fn context_from_response(
    content: &str,
    original: &DocumentStructure,
    amendment: &DocumentStructure,
) -> Result<ContextualizationResult, StageError> {
    let map = parse_object(content, STAGE)?;
    let corresponding_sections = mappings_from_map(&map)?;
    let analysis_notes = string_field(&map, "analysis_notes", STAGE)?.unwrap_or_default();

    Ok(ContextualizationResult {
        original_structure: original.clone(),
        amendment_structure: amendment.clone(),
        corresponding_sections,
        analysis_notes,
    })
}

#[async_trait]
impl ContextualizationAgent for LlmContextualizationAgent {
    async fn run(
        &self,
        original: &DocumentStructure,
        amendment: &DocumentStructure,
        trace: Option<&TraceGuard>,
    ) -> Result<ContextualizationResult, StageError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(CONTEXTUALIZATION_INSTRUCTIONS),
            ChatMessage::user(self.prompts.contextualization(original, amendment)),
        ])
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature)
        .json();

        let span = generation(
            trace,
            "contextualization_llm_call",
            json!({
                "original_title": original.title,
                "amendment_title": amendment.title,
                "model": self.provider.model(),
            }),
        );

        let response = call::complete(
            self.provider.as_ref(),
            request,
            self.config.request_timeout(),
            STAGE,
            span,
        )
        .await?;

        let context = context_from_response(&response.content, original, amendment)?;
        info!(
            mappings = context.corresponding_sections.len(),
            notes_chars = context.analysis_notes.len(),
            "Contextualization complete"
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_domain::DocumentType;

    fn doc(kind: DocumentType) -> DocumentStructure {
        DocumentStructure::new(
            format!("{} Contract", kind.title_case()),
            vec!["1. Parties".into(), "2. Terms".into()],
            "This is a sample contract text with more content.",
            kind,
        )
        .unwrap()
    }

    fn parse(content: &str) -> Result<ContextualizationResult, StageError> {
        context_from_response(content, &doc(DocumentType::Original), &doc(DocumentType::Amendment))
    }

    #[test]
    fn test_mapping_with_status_key() {
        let context = parse(
            r#"{"corresponding_sections": [
                {
                    "original_section": "2. Terms",
                    "amendment_section": "2. Terms (Amended)",
                    "status": "modified"
                },
                {"original_section": "", "amendment_section": "4. Renewal", "relationship": "added"}
            ], "analysis_notes": "Term extended."}"#,
        )
        .unwrap();

        assert_eq!(context.corresponding_sections.len(), 2);
        assert_eq!(context.corresponding_sections[1].relationship, Relationship::Added);
        assert_eq!(context.analysis_notes, "Term extended.");
        assert_eq!(context.original_structure.document_type, DocumentType::Original);
    }

    #[test]
    fn test_empty_mapping_is_not_an_error() {
        let context = parse(r#"{"corresponding_sections": [], "analysis_notes": ""}"#).unwrap();
        assert!(context.corresponding_sections.is_empty());

        let context = parse("{}").unwrap();
        assert!(context.corresponding_sections.is_empty());
    }

    #[test]
    fn test_unknown_relationship_becomes_modified() {
        let context = parse(r#"{"corresponding_sections": [{"original_section": "A", "amendment_section": "A", "relationship": "renamed"}]}"#)
            .unwrap();
        assert_eq!(context.corresponding_sections[0].relationship, Relationship::Modified);
    }

    #[test]
    fn test_malformed_payloads_are_errors() {
        assert!(matches!(parse("not json"), Err(StageError::MalformedResponse { .. })));
        assert!(matches!(parse("[]"), Err(StageError::MalformedResponse { .. })));
        assert!(matches!(
            parse(r#"{"corresponding_sections": "2. Terms"}"#),
            Err(StageError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse(r#"{"corresponding_sections": ["2. Terms"]}"#),
            Err(StageError::MalformedResponse { .. })
        ));
    }
}
