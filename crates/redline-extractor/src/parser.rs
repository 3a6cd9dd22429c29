//! Image parsers
//!
//! `VisionParser` sends the image to a vision-capable chat model;
//! `MockParser` returns a fixed structure without any external call.

use crate::call;
use crate::config::ExtractorConfig;
use crate::image::ImageLoader;
use crate::json::{parse_object, string_field, string_list};
use crate::prompt::{parser_request, PARSER_INSTRUCTIONS};
use async_trait::async_trait;
use redline_domain::document::UNKNOWN_TITLE;
use redline_domain::trace::generation;
use redline_domain::{DocumentStructure, DocumentType, ImageParser, StageError, TraceGuard};
use redline_llm::{ChatMessage, ChatProvider, ChatRequest};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Parser backed by a vision-capable chat model
pub struct VisionParser {
    provider: Arc<dyn ChatProvider>,
    loader: ImageLoader,
    config: ExtractorConfig,
}

impl VisionParser {
    /// Create a parser over `provider`
    pub fn new(provider: Arc<dyn ChatProvider>, config: ExtractorConfig) -> Self {
        let loader = ImageLoader::with_timeout(config.max_image_bytes(), config.request_timeout());
        Self {
            provider,
            loader,
            config,
        }
    }

    /// Replace the image loader (custom HTTP client or size cap)
    pub fn with_loader(mut self, loader: ImageLoader) -> Self {
        self.loader = loader;
        self
    }
}

/// Build a `DocumentStructure` from the parser's JSON answer
///
/// Missing title becomes `"Unknown"`, missing or empty sections become
/// `["General"]`; a short or missing `full_text` is a validation error.
pub fn structure_from_response(
    content: &str,
    document_type: DocumentType,
    stage: &str,
) -> Result<DocumentStructure, StageError> {
    let map = parse_object(content, stage)?;

    let title = string_field(&map, "title", stage)?
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let sections = string_list(&map, "sections", stage)?.unwrap_or_default();
    let full_text = string_field(&map, "full_text", stage)?.unwrap_or_default();

    Ok(DocumentStructure::new(title, sections, full_text, document_type)?)
}

#[async_trait]
impl ImageParser for VisionParser {
    async fn parse(
        &self,
        image_ref: &str,
        document_type: DocumentType,
        trace: Option<&TraceGuard>,
    ) -> Result<DocumentStructure, StageError> {
        let stage = format!("parse_{}", document_type);
        let image = self.loader.load(image_ref).await?;

        let request = ChatRequest::new(vec![
            ChatMessage::system(PARSER_INSTRUCTIONS),
            ChatMessage::user_with_image(
                parser_request(document_type),
                image.data_url(),
                &self.config.image_detail,
            ),
        ])
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature)
        .json();

        let span = generation(
            trace,
            &format!("parse_{}_llm_call", document_type),
            json!({
                "image_path": image_ref,
                "document_type": document_type,
                "model": self.provider.model(),
                "media_type": image.media_type,
            }),
        );

        debug!(
            image = %image_ref,
            %document_type,
            bytes = image.bytes.len(),
            "Sending image to vision model"
        );

        let response = call::complete(
            self.provider.as_ref(),
            request,
            self.config.request_timeout(),
            &stage,
            span,
        )
        .await?;

        let doc = structure_from_response(&response.content, document_type, &stage)?;
        info!(
            %document_type,
            title = %doc.title,
            sections = doc.sections.len(),
            "Parsed contract image"
        );
        Ok(doc)
    }

    fn name(&self) -> &str {
        "vision"
    }
}

/// Deterministic parser for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct MockParser;

impl MockParser {
    /// Create a mock parser
    pub fn new() -> Self {
        Self
    }

    /// The structure returned for `document_type`
    pub fn structure(document_type: DocumentType) -> Result<DocumentStructure, StageError> {
        let kind = document_type.title_case();
        let full_text = format!(
            "MOCK {upper} CONTRACT\n\n\
             1. Parties\nThis {lower} agreement is entered into by Party A and Party B.\n\n\
             2. Terms\nThe term of this agreement is twelve (12) months from the effective date.\n\n\
             3. Payment\nPayment of USD 10,000 is due within thirty (30) days of invoice.",
            upper = kind.to_uppercase(),
            lower = document_type,
        );
        Ok(DocumentStructure::new(
            format!("Mock {} Contract", kind),
            vec!["1. Parties".into(), "2. Terms".into(), "3. Payment".into()],
            full_text,
            document_type,
        )?)
    }
}

#[async_trait]
impl ImageParser for MockParser {
    async fn parse(
        &self,
        image_ref: &str,
        document_type: DocumentType,
        trace: Option<&TraceGuard>,
    ) -> Result<DocumentStructure, StageError> {
        let span = generation(
            trace,
            &format!("parse_{}_llm_call", document_type),
            json!({"image_path": image_ref, "document_type": document_type, "model": "mock"}),
        );
        let result = Self::structure(document_type);
        if let Some(span) = span {
            span.record(&result);
        }
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_domain::ErrorKind;

    #[test]
    fn test_structure_fallbacks() {
        let doc = structure_from_response(
            r#"{"full_text": "Sample text content here"}"#,
            DocumentType::Original,
            "parse_original",
        )
        .unwrap();
        assert_eq!(doc.title, "Unknown");
        assert_eq!(doc.sections, vec!["General"]);
    }

    #[test]
    fn test_structure_empty_sections_list() {
        let doc = structure_from_response(
            r#"{"title": "Lease", "sections": [], "full_text": "Sample text content here"}"#,
            DocumentType::Amendment,
            "parse_amendment",
        )
        .unwrap();
        assert_eq!(doc.sections, vec!["General"]);
        assert_eq!(doc.document_type, DocumentType::Amendment);
    }

    #[test]
    fn test_structure_short_text_is_schema_error() {
        let err = structure_from_response(r#"{"title": "Lease", "full_text": "tiny"}"#, DocumentType::Original, "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("full_text"));
    }

    #[test]
    fn test_structure_unparsable_is_malformed() {
        let err = structure_from_response("I could not read the image", DocumentType::Original, "p")
            .unwrap_err();
        assert!(matches!(err, StageError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_mock_parser_is_deterministic() {
        let parser = MockParser::new();
        let original = parser.parse("mock://original", DocumentType::Original, None).await.unwrap();
        let amendment = parser
            .parse("mock://amendment", DocumentType::Amendment, None)
            .await
            .unwrap();

        assert_eq!(original.title, "Mock Original Contract");
        assert_eq!(amendment.title, "Mock Amendment Contract");
        assert_eq!(original.sections.len(), 3);
        assert_eq!(amendment.sections.len(), 3);
        assert_eq!(original, parser.parse("anything", DocumentType::Original, None).await.unwrap());
    }
}
