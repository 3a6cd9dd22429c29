//! The externally meaningful comparison output

use crate::validation::{Checker, ValidationError, Violation, ViolationKind, MIN_SUMMARY_CHARS};
use serde::{Deserialize, Serialize};

/// Substituted when the extraction stage names no sections
pub const FALLBACK_SECTIONS_CHANGED: &str = "General";

/// Substituted when the extraction stage names no topics
pub const FALLBACK_TOPICS_TOUCHED: &str = "Contract Terms";

/// Substituted when the extraction stage returns no summary
pub const FALLBACK_SUMMARY: &str =
    "Changes were detected between the original contract and its amendment.";

/// Which field of a result carries a fallback placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackField {
    /// `sections_changed == ["General"]`
    SectionsChanged,
    /// `topics_touched == ["Contract Terms"]`
    TopicsTouched,
    /// `summary_of_the_change` is the generic sentence
    Summary,
}

impl FallbackField {
    /// Field name as serialized
    pub fn field_name(&self) -> &'static str {
        match self {
            FallbackField::SectionsChanged => "sections_changed",
            FallbackField::TopicsTouched => "topics_touched",
            FallbackField::Summary => "summary_of_the_change",
        }
    }
}

/// Validated description of what changed between the two contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawContractChangeResult")]
pub struct ContractChangeResult {
    /// Section identifiers that were modified; never empty
    pub sections_changed: Vec<String>,
    /// Topics affected by the changes; never empty
    pub topics_touched: Vec<String>,
    /// Natural-language summary; at least 50 characters
    pub summary_of_the_change: String,
}

impl ContractChangeResult {
    /// Build a validated result
    pub fn new(
        sections_changed: Vec<String>,
        topics_touched: Vec<String>,
        summary_of_the_change: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let result = Self {
            sections_changed,
            topics_touched,
            summary_of_the_change: summary_of_the_change.into(),
        };
        result.validate()?;
        Ok(result)
    }

    /// Build a result, substituting placeholders for anything missing
    ///
    /// Missing or empty values are replaced; a present-but-short summary is
    /// kept and then rejected by validation.
    pub fn with_fallbacks(
        sections_changed: Option<Vec<String>>,
        topics_touched: Option<Vec<String>>,
        summary_of_the_change: Option<String>,
    ) -> Result<Self, ValidationError> {
        let sections = sections_changed
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| vec![FALLBACK_SECTIONS_CHANGED.to_string()]);
        let topics = topics_touched
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| vec![FALLBACK_TOPICS_TOUCHED.to_string()]);
        let summary = summary_of_the_change
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());
        Self::new(sections, topics, summary)
    }

    /// Check every invariant
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checker = Checker::new("ContractChangeResult");
        checker
            .non_empty_list("sections_changed", &self.sections_changed)
            .non_empty_list("topics_touched", &self.topics_touched)
            .min_chars("summary_of_the_change", &self.summary_of_the_change, MIN_SUMMARY_CHARS);
        checker.finish()
    }

    /// Re-run the full schema on a serialized copy of this value
    ///
    /// Goes through the same path as data arriving over the wire, so a value
    /// assembled by hand (bypassing `new`) is held to every invariant.
    pub fn revalidate(&self) -> Result<Self, ValidationError> {
        let value = serde_json::to_value(self).map_err(|e| schema_error(e.to_string()))?;
        Self::from_json_value(value)
    }

    /// Validate an arbitrary JSON value against the schema
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        let raw: RawContractChangeResult =
            serde_json::from_value(value).map_err(|e| schema_error(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Fields that currently hold a fallback placeholder
    pub fn fallback_fields(&self) -> Vec<FallbackField> {
        let mut fields = Vec::new();
        if self.sections_changed == [FALLBACK_SECTIONS_CHANGED] {
            fields.push(FallbackField::SectionsChanged);
        }
        if self.topics_touched == [FALLBACK_TOPICS_TOUCHED] {
            fields.push(FallbackField::TopicsTouched);
        }
        if self.summary_of_the_change == FALLBACK_SUMMARY {
            fields.push(FallbackField::Summary);
        }
        fields
    }
}

fn schema_error(reason: String) -> ValidationError {
    ValidationError {
        entity: "ContractChangeResult",
        violations: vec![Violation {
            field: "$",
            issue: ViolationKind::Invalid(reason),
        }],
    }
}

#[derive(Deserialize)]
struct RawContractChangeResult {
    sections_changed: Vec<String>,
    topics_touched: Vec<String>,
    summary_of_the_change: String,
}

impl TryFrom<RawContractChangeResult> for ContractChangeResult {
    type Error = ValidationError;

    fn try_from(raw: RawContractChangeResult) -> Result<Self, Self::Error> {
        Self::new(raw.sections_changed, raw.topics_touched, raw.summary_of_the_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary(len: usize) -> String {
        "A".repeat(len)
    }

    #[test]
    fn test_valid_result() {
        let result = ContractChangeResult::new(
            vec!["Section 1".into(), "Section 3.2".into()],
            vec!["Payment Terms".into(), "Liability".into()],
            "The amendment modifies the payment terms in Section 1, changing the due date from 30 days to 45 days.",
        )
        .unwrap();
        assert_eq!(result.sections_changed, vec!["Section 1", "Section 3.2"]);
        assert!(result.fallback_fields().is_empty());
    }

    #[test]
    fn test_empty_sections_changed_fails() {
        let err = ContractChangeResult::new(vec![], vec!["Payment Terms".into()], summary(50))
            .unwrap_err();
        assert!(err.names_field("sections_changed"));
        assert!(err.to_string().contains("sections_changed"));
    }

    #[test]
    fn test_empty_topics_touched_fails() {
        let err =
            ContractChangeResult::new(vec!["Section 1".into()], vec![], summary(50)).unwrap_err();
        assert!(err.names_field("topics_touched"));
    }

    #[test]
    fn test_summary_floor_is_exactly_fifty() {
        let build =
            |len| ContractChangeResult::new(vec!["S".into()], vec!["T".into()], summary(len));
        assert!(build(49).is_err());
        assert!(build(50).is_ok());
    }

    #[test]
    fn test_missing_field_fails_deserialization() {
        let json = r#"{"sections_changed": ["Section 1"], "topics_touched": ["Payment"]}"#;
        assert!(serde_json::from_str::<ContractChangeResult>(json).is_err());
    }

    #[test]
    fn test_fallbacks_fill_missing_fields() {
        let result = ContractChangeResult::with_fallbacks(None, Some(vec![]), None).unwrap();
        assert_eq!(result.sections_changed, vec!["General"]);
        assert_eq!(result.topics_touched, vec!["Contract Terms"]);
        assert_eq!(result.summary_of_the_change, FALLBACK_SUMMARY);
        assert_eq!(
            result.fallback_fields(),
            vec![
                FallbackField::SectionsChanged,
                FallbackField::TopicsTouched,
                FallbackField::Summary
            ]
        );
    }

    #[test]
    fn test_fallbacks_do_not_rescue_short_summary() {
        let err = ContractChangeResult::with_fallbacks(
            Some(vec!["2. Terms".into()]),
            Some(vec!["Duration".into()]),
            Some("Too short".into()),
        )
        .unwrap_err();
        assert!(err.names_field("summary_of_the_change"));
    }

    #[test]
    fn test_fallback_summary_meets_floor() {
        assert!(FALLBACK_SUMMARY.chars().count() >= MIN_SUMMARY_CHARS);
    }

    #[test]
    fn test_revalidate_catches_hand_built_value() {
        let bypassed = ContractChangeResult {
            sections_changed: vec![],
            topics_touched: vec!["Duration".into()],
            summary_of_the_change: "short".into(),
        };
        let err = bypassed.revalidate().unwrap_err();
        assert!(err.names_field("sections_changed"));
        assert!(err.names_field("summary_of_the_change"));
    }

    #[test]
    fn test_from_json_value_reports_wrong_type() {
        let value = serde_json::json!({
            "sections_changed": "Section 1",
            "topics_touched": ["Payment"],
            "summary_of_the_change": summary(60),
        });
        assert!(ContractChangeResult::from_json_value(value).is_err());
    }

    proptest! {
        #[test]
        fn prop_revalidation_is_identity(
            sections in prop::collection::vec("[A-Za-z0-9. ]{1,20}", 1..5),
            topics in prop::collection::vec("[A-Za-z ]{1,20}", 1..5),
            summary in "[A-Za-z ,.]{50,200}",
        ) {
            let result = ContractChangeResult::new(sections, topics, summary).unwrap();
            prop_assert_eq!(result.revalidate().unwrap(), result);
        }

        #[test]
        fn prop_short_summaries_always_rejected(summary in "[A-Za-z ]{0,49}") {
            let err = ContractChangeResult::new(vec!["S".into()], vec!["T".into()], summary)
                .unwrap_err();
            prop_assert!(err.names_field("summary_of_the_change"));
        }
    }
}
