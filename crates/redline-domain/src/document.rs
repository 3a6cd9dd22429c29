//! Parsed document structure
//!
//! A `DocumentStructure` is the output of one parse call: title, ordered
//! section headings, the extracted text, and which side of the comparison it
//! came from. It is validated on construction and on deserialization.

use crate::validation::{Checker, ValidationError, MIN_FULL_TEXT_CHARS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section list used when a parser finds no headings
pub const FALLBACK_SECTION: &str = "General";

/// Title used when the parser response has none
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Which side of the comparison a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// The contract as originally signed
    Original,
    /// The amended contract
    Amendment,
}

impl DocumentType {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Original => "original",
            DocumentType::Amendment => "amendment",
        }
    }

    /// Capitalized name for titles and prompts
    pub fn title_case(&self) -> &'static str {
        match self {
            DocumentType::Original => "Original",
            DocumentType::Amendment => "Amendment",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(DocumentType::Original),
            "amendment" => Ok(DocumentType::Amendment),
            other => Err(format!("unknown document type '{}'", other)),
        }
    }
}

/// Structure extracted from one contract image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocumentStructure")]
pub struct DocumentStructure {
    /// Document title
    pub title: String,
    /// Ordered section identifiers/titles; never empty
    pub sections: Vec<String>,
    /// Full extracted text
    pub full_text: String,
    /// Original or amendment
    pub document_type: DocumentType,
}

impl DocumentStructure {
    /// Build a validated document structure
    ///
    /// An empty `sections` list is replaced with the `["General"]` sentinel
    /// before validation; every other invariant is enforced as-is.
    pub fn new(
        title: impl Into<String>,
        sections: Vec<String>,
        full_text: impl Into<String>,
        document_type: DocumentType,
    ) -> Result<Self, ValidationError> {
        let sections = if sections.is_empty() {
            vec![FALLBACK_SECTION.to_string()]
        } else {
            sections
        };

        let doc = Self {
            title: title.into(),
            sections,
            full_text: full_text.into(),
            document_type,
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Check every invariant
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checker = Checker::new("DocumentStructure");
        checker
            .non_empty("title", &self.title)
            .non_empty_list("sections", &self.sections)
            .min_chars("full_text", &self.full_text, MIN_FULL_TEXT_CHARS);
        checker.finish()
    }

    /// Section headings joined for prompts and logs
    pub fn sections_joined(&self) -> String {
        self.sections.join(", ")
    }
}

#[derive(Deserialize)]
struct RawDocumentStructure {
    title: String,
    sections: Vec<String>,
    full_text: String,
    document_type: DocumentType,
}

impl TryFrom<RawDocumentStructure> for DocumentStructure {
    type Error = ValidationError;

    fn try_from(raw: RawDocumentStructure) -> Result<Self, Self::Error> {
        // Deserialization is strict: the sentinel substitution belongs to
        // parsers, not to data arriving over the wire.
        let doc = Self {
            title: raw.title,
            sections: raw.sections,
            full_text: raw.full_text,
            document_type: raw.document_type,
        };
        doc.validate()?;
        Ok(doc)
    }
}
