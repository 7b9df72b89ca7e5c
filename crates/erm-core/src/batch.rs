//! Bulk request modes and result envelopes

use crate::error::Error;
use crate::properties::{Constraint, PropertyType, PropertyViolation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a bulk request treats invalid items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Any invalid item aborts the batch before anything is written
    #[default]
    Atomic,
    /// Valid items are written, invalid ones are reported
    Partial,
}

impl FromStr for BatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(Self::Atomic),
            "partial" => Ok(Self::Partial),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// Why a single bulk item was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorReason {
    InvalidTypeName,
    TypeNotInSchema,
    InvalidUuid,
    /// A property rule failed; `constraint` names which one
    Property {
        constraint: Constraint,
        #[serde(skip_serializing_if = "Option::is_none")]
        expected: Option<PropertyType>,
    },
    NotFound,
    SourceNotFound,
    TargetNotFound,
}

/// A rejected bulk item, addressed by its position in the submitted list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub reason: ItemErrorReason,
}

impl BatchItemError {
    pub fn new(index: usize, reason: ItemErrorReason) -> Self {
        Self {
            index,
            field: None,
            reason,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// One item error per property violation
    pub fn from_violations(index: usize, violations: Vec<PropertyViolation>) -> Vec<Self> {
        violations
            .into_iter()
            .map(|v| Self {
                index,
                field: Some(v.field),
                reason: ItemErrorReason::Property {
                    constraint: v.constraint,
                    expected: v.expected,
                },
            })
            .collect()
    }
}

/// Result of a bulk operation that passed its mode's checks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BulkOutcome<T> {
    /// Every item was valid and the repository result is returned verbatim
    Atomic { results: T },
    /// Valid items were written; `errors` lists the rest
    Partial { results: T, errors: Vec<BatchItemError> },
}

impl<T> BulkOutcome<T> {
    pub fn results(&self) -> &T {
        match self {
            Self::Atomic { results } | Self::Partial { results, .. } => results,
        }
    }

    pub fn into_results(self) -> T {
        match self {
            Self::Atomic { results } | Self::Partial { results, .. } => results,
        }
    }

    pub fn errors(&self) -> &[BatchItemError] {
        match self {
            Self::Atomic { .. } => &[],
            Self::Partial { errors, .. } => errors,
        }
    }
}

/// Valid items (with their original positions) and collected item errors
#[derive(Debug)]
pub(crate) struct Triage<T> {
    pub valid: Vec<(usize, T)>,
    pub errors: Vec<BatchItemError>,
}

impl<T> Default for Triage<T> {
    fn default() -> Self {
        Self {
            valid: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> Triage<T> {
    pub fn accept(&mut self, index: usize, item: T) {
        self.valid.push((index, item));
    }

    pub fn reject(&mut self, error: BatchItemError) {
        self.errors.push(error);
    }

    pub fn reject_all(&mut self, errors: Vec<BatchItemError>) {
        self.errors.extend(errors);
    }

    pub fn into_items(self) -> (Vec<T>, Vec<BatchItemError>) {
        (
            self.valid.into_iter().map(|(_, item)| item).collect(),
            self.errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_atomic() {
        assert_eq!(BatchMode::default(), BatchMode::Atomic);
        assert_eq!("partial".parse::<BatchMode>().unwrap(), BatchMode::Partial);
        assert_eq!(
            "lazy".parse::<BatchMode>().unwrap_err(),
            Error::InvalidMode("lazy".into())
        );
    }

    #[test]
    fn test_from_violations_keeps_index() {
        let errors = BatchItemError::from_violations(
            4,
            vec![PropertyViolation {
                field: "name".into(),
                constraint: Constraint::Required,
                expected: None,
            }],
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 4);
        assert_eq!(errors[0].field.as_deref(), Some("name"));
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = BulkOutcome::Partial {
            results: 3usize,
            errors: vec![BatchItemError::new(1, ItemErrorReason::NotFound)],
        };
        assert_eq!(*outcome.results(), 3);
        assert_eq!(outcome.errors()[0].index, 1);

        let atomic = BulkOutcome::Atomic { results: vec![1, 2] };
        assert!(atomic.errors().is_empty());
        assert_eq!(atomic.into_results(), vec![1, 2]);
    }
}
