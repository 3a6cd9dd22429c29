//! Extraction agent backed by a chat model

use crate::call;
use crate::config::ExtractorConfig;
use crate::json::{parse_object, string_field, string_list};
use crate::prompt::{PromptBuilder, EXTRACTION_INSTRUCTIONS};
use async_trait::async_trait;
use redline_domain::trace::generation;
use redline_domain::{
    ContextualizationResult, ContractChangeResult, ExtractionAgent, StageError, TraceGuard,
};
use redline_llm::{ChatMessage, ChatProvider, ChatRequest};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "extraction";

/// Derives the change description with one model call
pub struct LlmExtractionAgent {
    provider: Arc<dyn ChatProvider>,
    prompts: PromptBuilder,
    config: ExtractorConfig,
}

impl LlmExtractionAgent {
    /// Create an agent over `provider`
    pub fn new(provider: Arc<dyn ChatProvider>, config: ExtractorConfig) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(config.max_prompt_text_chars),
            config,
        }
    }
}

/// Build a `ContractChangeResult` from the model's JSON answer
///
/// Missing or empty `sections_changed`, `topics_touched` and summary are
/// replaced by their placeholders. Anything that is not a JSON object, or a
/// field of the wrong type, is an error.
pub fn change_from_response(content: &str) -> Result<ContractChangeResult, StageError> {
    let map = parse_object(content, STAGE)?;

    let sections = string_list(&map, "sections_changed", STAGE)?;
    let topics = string_list(&map, "topics_touched", STAGE)?;
    let summary = string_field(&map, "summary_of_the_change", STAGE)?;

    let result = ContractChangeResult::with_fallbacks(sections, topics, summary)?;
    for field in result.fallback_fields() {
        warn!(field = field.field_name(), "Extraction returned nothing, using placeholder");
    }
    Ok(result)
}

#[async_trait]
impl ExtractionAgent for LlmExtractionAgent {
    async fn run(
        &self,
        context: &ContextualizationResult,
        trace: Option<&TraceGuard>,
    ) -> Result<ContractChangeResult, StageError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(EXTRACTION_INSTRUCTIONS),
            ChatMessage::user(self.prompts.extraction(context)),
        ])
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature)
        .json();

        let span = generation(
            trace,
            "extraction_llm_call",
            json!({
                "corresponding_sections_count": context.corresponding_sections.len(),
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

        let result = change_from_response(&response.content)?;
        info!(
            sections = result.sections_changed.len(),
            topics = result.topics_touched.len(),
            "Extraction complete"
        );
        Ok(result)
    }
}
