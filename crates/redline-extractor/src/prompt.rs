//! Prompts for the parsing, contextualization and extraction calls

use redline_domain::{ContextualizationResult, DocumentStructure, DocumentType};

/// Instructions for the vision parser
pub const PARSER_INSTRUCTIONS: &str = r#"You are a legal document parser. Extract the complete text and structure from the provided contract image.

Your task:
1. Extract ALL text from the document, preserving the hierarchy and structure
2. Identify all section headers/titles
3. Identify the document title
4. Maintain the original formatting as much as possible

Return your response in the following JSON format:
{
    "title": "Document title",
    "sections": ["Section 1 Title", "Section 2 Title", ...],
    "full_text": "Complete extracted text with preserved structure"
}

Be thorough and accurate. Do not summarize; extract the complete text."#;

/// Instructions for the contextualization agent
pub const CONTEXTUALIZATION_INSTRUCTIONS: &str = r#"You are a contract contextualization specialist.

You will receive the extracted text of an original contract and its amendment. Analyze their structure and relationship:
1. Analyze the structure of both documents (sections, clauses, paragraphs)
2. Identify corresponding sections between the original and the amendment
3. Note any new sections added in the amendment
4. Note any sections removed or significantly restructured
5. Provide analysis notes about the overall document relationship

Return your response in JSON format:
{
    "corresponding_sections": [
        {
            "original_section": "Section name/number from original",
            "amendment_section": "Corresponding section in amendment",
            "relationship": "modified|added|removed|unchanged"
        }
    ],
    "analysis_notes": "Your detailed analysis of how these documents relate to each other"
}

Your analysis will be used to extract the specific changes in a second pass."#;

/// Instructions for the extraction agent
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You are a contract change extraction specialist.

You will receive the full text of an original contract and its amendment, together with a section mapping and analysis notes produced in an earlier pass.

Your task:
1. Identify ALL sections that were changed (added, modified, or removed)
2. Identify ALL topics/subjects touched by the changes
3. Write a comprehensive summary of what changed

Return your response in JSON format:
{
    "sections_changed": ["List of specific section names/numbers that changed"],
    "topics_touched": ["List of topics/subjects affected by changes"],
    "summary_of_the_change": "A detailed summary (at least 50 words) explaining what changed, why it matters, and the impact"
}

Be specific and thorough. Your output will be read by legal professionals reviewing the amendment."#;

/// User turn sent alongside the image
pub fn parser_request(document_type: DocumentType) -> String {
    format!(
        "Parse this {} contract document. Extract all text and identify the structure.",
        document_type
    )
}

/// Builds the agent prompts
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_text_chars: usize,
}

impl PromptBuilder {
    /// Builder that truncates document text to `max_text_chars`
    pub fn new(max_text_chars: usize) -> Self {
        Self { max_text_chars }
    }

    /// Prompt for the contextualization agent
    pub fn contextualization(&self, original: &DocumentStructure, amendment: &DocumentStructure) -> String {
        let mut prompt = String::from("Analyze these two contract documents:\n\n");

        prompt.push_str(&self.document_block("ORIGINAL CONTRACT", original, true));
        prompt.push_str("---\n\n");
        prompt.push_str(&self.document_block("AMENDMENT", amendment, true));
        prompt.push_str("---\n\n");
        prompt.push_str(
            "Provide your contextual analysis identifying corresponding sections and their relationships.",
        );
        prompt
    }

    /// Prompt for the extraction agent
    pub fn extraction(&self, context: &ContextualizationResult) -> String {
        let mapping = serde_json::to_string_pretty(&context.corresponding_sections)
            .unwrap_or_else(|_| "[]".to_string());

        let mut prompt =
            String::from("Using the contextual analysis below, extract the specific changes between these contracts.\n\n");

        prompt.push_str("## SECTION MAPPING\n");
        prompt.push_str(&mapping);
        prompt.push_str("\n\n## ANALYSIS NOTES\n");
        if context.analysis_notes.trim().is_empty() {
            prompt.push_str("(none)");
        } else {
            prompt.push_str(&context.analysis_notes);
        }
        prompt.push_str("\n\n");

        prompt.push_str(&self.document_block("ORIGINAL CONTRACT", &context.original_structure, false));
        prompt.push_str("---\n\n");
        prompt.push_str(&self.document_block("AMENDMENT", &context.amendment_structure, false));
        prompt.push_str("---\n\n");
        prompt.push_str(
            "Extract all changes: sections modified, topics affected, and provide a comprehensive summary.",
        );
        prompt
    }

    fn document_block(&self, heading: &str, doc: &DocumentStructure, with_sections: bool) -> String {
        let mut block = format!("## {}\nTitle: {}\n", heading, doc.title);
        if with_sections {
            block.push_str(&format!("Sections: {}\n", doc.sections_joined()));
        }
        block.push_str("\nFull Text:\n");
        block.push_str(&truncate_chars(&doc.full_text, self.max_text_chars));
        block.push_str("\n\n");
        block
    }
}

/// Cut `text` to at most `max` characters, marking the cut
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => format!("{}\n[... truncated ...]", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_domain::{Relationship, SectionMapping};

    fn doc(kind: DocumentType, text: &str) -> DocumentStructure {
        DocumentStructure::new(
            format!("{} Lease", kind.title_case()),
            vec!["1. Parties".into(), "2. Terms".into()],
            text,
            kind,
        )
        .unwrap()
    }

    #[test]
    fn test_contextualization_prompt_contains_both_documents() {
        let builder = PromptBuilder::new(10_000);
        let prompt = builder.contextualization(
            &doc(DocumentType::Original, "Rent is 1000 per month."),
            &doc(DocumentType::Amendment, "Rent is 1200 per month."),
        );

        assert!(prompt.contains("Title: Original Lease"));
        assert!(prompt.contains("Sections: 1. Parties, 2. Terms"));
        assert!(prompt.contains("Rent is 1000 per month."));
        assert!(prompt.contains("Rent is 1200 per month."));
    }

    #[test]
    fn test_extraction_prompt_includes_mapping_and_full_text() {
        let context = ContextualizationResult {
            original_structure: doc(DocumentType::Original, "Term is twelve months."),
            amendment_structure: doc(DocumentType::Amendment, "Term is twenty-four months."),
            corresponding_sections: vec![SectionMapping::new("2. Terms", "2. Terms", Relationship::Modified)],
            analysis_notes: String::new(),
        };
        let prompt = PromptBuilder::new(10_000).extraction(&context);

        assert!(prompt.contains("\"relationship\": \"modified\""));
        assert!(prompt.contains("(none)"));
        assert!(prompt.contains("Term is twelve months."));
        assert!(prompt.contains("Term is twenty-four months."));
    }

    #[test]
    fn test_truncation_is_char_safe() {
        assert_eq!(truncate_chars("ééééé", 10), "ééééé");
        assert_eq!(truncate_chars("ééééé", 2), "éé\n[... truncated ...]");
    }

    #[test]
    fn test_parser_request_names_document_type() {
        assert!(parser_request(DocumentType::Amendment).contains("amendment contract"));
    }
}
