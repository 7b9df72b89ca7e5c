//! Error types for the ERM core

use crate::batch::BatchItemError;
use crate::properties::PropertyViolation;
use thiserror::Error;

/// Result type alias using the ERM Error
pub type Result<T> = std::result::Result<T, Error>;

/// ERM error kinds
///
/// Input-validation variants render messages that contain the offending
/// concept word ("UUID", "direction", "depth", "limit", "offset") so callers
/// can match on the text as well as the variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Input validation
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid type name: {0:?} (must start with a letter and contain only letters, digits or underscores)")]
    InvalidTypeName(String),

    #[error("Invalid UUID for {field}: {value:?}")]
    InvalidUuid { field: String, value: String },

    #[error("Invalid direction: {0:?} (expected one of: in, out, both)")]
    InvalidDirection(String),

    #[error("Invalid depth: {depth} (must be between 1 and {max})")]
    InvalidDepth { depth: i64, max: u32 },

    #[error("Invalid limit: {0} (must be greater than 0)")]
    InvalidLimit(i64),

    #[error("Invalid offset: {0} (must be 0 or greater)")]
    InvalidOffset(i64),

    #[error("Invalid mode: {0:?} (expected atomic or partial)")]
    InvalidMode(String),

    #[error("{0} not defined in schema")]
    TypeNotInSchema(String),

    #[error("Property validation failed: {}", format_violations(.0))]
    PropertyViolations(Vec<PropertyViolation>),

    #[error("Invalid schema: {}", .0.join("; "))]
    SchemaInvalid(Vec<String>),

    // ─────────────────────────────────────────────────────────────────────────
    // Not found
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Schema not found")]
    SchemaNotFound,

    #[error("Not found")]
    NotFound,

    #[error("Source entity not found")]
    SourceNotFound,

    #[error("Target entity not found")]
    TargetNotFound,

    #[error("Edge endpoints not found")]
    EndpointsNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Batches
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Batch too large: {count} items (max {max})")]
    BatchTooLarge { count: usize, max: usize },

    #[error("Batch validation failed: {} invalid item(s)", .0.len())]
    BatchValidation(Vec<BatchItemError>),

    // ─────────────────────────────────────────────────────────────────────────
    // Conflicts and collaborator failures
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Schema version conflict")]
    VersionConflict,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

fn format_violations(violations: &[PropertyViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
