//! Structural validation shared by every value type in the pipeline
//!
//! Validation collects all violations instead of stopping at the first one so
//! callers can report every offending field at once.

use std::fmt;
use thiserror::Error;

/// Minimum number of characters a parsed document's `full_text` must carry
pub const MIN_FULL_TEXT_CHARS: usize = 10;

/// Minimum number of characters for `summary_of_the_change`
pub const MIN_SUMMARY_CHARS: usize = 50;

/// A single broken invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub issue: ViolationKind,
}

/// Classification of a broken invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Text field is empty (or whitespace only)
    Empty,
    /// Sequence has no elements
    EmptyList,
    /// Text is shorter than the required floor
    TooShort {
        /// Required minimum (characters)
        min: usize,
        /// Actual length (characters)
        actual: usize,
    },
    /// Field is missing or has the wrong type
    Invalid(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            ViolationKind::Empty => write!(f, "{}: must not be empty", self.field),
            ViolationKind::EmptyList => {
                write!(f, "{}: must contain at least 1 item", self.field)
            }
            ViolationKind::TooShort { min, actual } => write!(
                f,
                "{}: must be at least {} characters (got {})",
                self.field, min, actual
            ),
            ViolationKind::Invalid(reason) => write!(f, "{}: {}", self.field, reason),
        }
    }
}

/// One or more invariants failed for a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} failed validation: {}", join_violations(.violations))]
pub struct ValidationError {
    /// Type that was being validated
    pub entity: &'static str,
    /// Every broken invariant, in field order
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Whether a specific field is among the violations
    pub fn names_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates violations for one entity
#[derive(Debug)]
pub(crate) struct Checker {
    entity: &'static str,
    violations: Vec<Violation>,
}

impl Checker {
    pub(crate) fn new(entity: &'static str) -> Self {
        Self {
            entity,
            violations: Vec::new(),
        }
    }

    pub(crate) fn non_empty(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, ViolationKind::Empty);
        }
        self
    }

    pub(crate) fn non_empty_list<T>(&mut self, field: &'static str, items: &[T]) -> &mut Self {
        if items.is_empty() {
            self.push(field, ViolationKind::EmptyList);
        }
        self
    }

    pub(crate) fn min_chars(&mut self, field: &'static str, value: &str, min: usize) -> &mut Self {
        let actual = value.chars().count();
        if actual < min {
            self.push(field, ViolationKind::TooShort { min, actual });
        }
        self
    }

    pub(crate) fn push(&mut self, field: &'static str, issue: ViolationKind) {
        self.violations.push(Violation { field, issue });
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                entity: self.entity,
                violations: self.violations,
            })
        }
    }
}
