//! Section correspondence between the two documents

use crate::document::DocumentStructure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a section in the original relates to the amendment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// Present in both, content differs
    #[default]
    Modified,
    /// Only present in the amendment
    Added,
    /// Only present in the original
    Removed,
    /// Present in both, content identical
    Unchanged,
}

impl Relationship {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Modified => "modified",
            Relationship::Added => "added",
            Relationship::Removed => "removed",
            Relationship::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modified" => Ok(Relationship::Modified),
            "added" => Ok(Relationship::Added),
            "removed" => Ok(Relationship::Removed),
            "unchanged" => Ok(Relationship::Unchanged),
            other => Err(format!("unknown relationship '{}'", other)),
        }
    }
}

/// One mapping record between an original and an amendment section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMapping {
    /// Section name in the original (empty for added sections)
    #[serde(default)]
    pub original_section: String,
    /// Section name in the amendment (empty for removed sections)
    #[serde(default)]
    pub amendment_section: String,
    /// How the two relate
    #[serde(alias = "status", default)]
    pub relationship: Relationship,
}

impl SectionMapping {
    /// Convenience constructor
    pub fn new(
        original_section: impl Into<String>,
        amendment_section: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self {
            original_section: original_section.into(),
            amendment_section: amendment_section.into(),
            relationship,
        }
    }
}

/// Output of the contextualization stage
///
/// Both input structures are carried forward verbatim because the extraction
/// stage needs the full texts again. An empty `corresponding_sections` is a
/// valid outcome (the documents share nothing recognizable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualizationResult {
    /// Parsed original contract
    pub original_structure: DocumentStructure,
    /// Parsed amendment
    pub amendment_structure: DocumentStructure,
    /// Section correspondences, in the order the stage produced them
    pub corresponding_sections: Vec<SectionMapping>,
    /// Free-form analysis notes (may be empty)
    #[serde(default)]
    pub analysis_notes: String,
}

impl ContextualizationResult {
    /// Mappings whose relationship is anything but `unchanged`
    pub fn changed_mappings(&self) -> impl Iterator<Item = &SectionMapping> {
        self.corresponding_sections
            .iter()
            .filter(|m| m.relationship != Relationship::Unchanged)
    }
}
