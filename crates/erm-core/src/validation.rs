//! Input validation: identifier grammar, UUIDs, enums and numeric bounds
//!
//! These checks run before any repository call so malformed input never
//! reaches storage.

use crate::batch::BatchMode;
use crate::edge::Direction;
use crate::error::{Error, Result};
use uuid::Uuid;

/// Maximum items in a single bulk request (1000)
pub const MAX_BATCH_SIZE: usize = 1000;

/// Maximum depth accepted by path finding (10)
pub const MAX_PATH_DEPTH: u32 = 10;

/// Maximum depth accepted by traversal (50)
pub const MAX_TRAVERSAL_DEPTH: u32 = 50;

/// Default page size for list queries (100)
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Largest page a list query returns (1000)
pub const MAX_LIST_LIMIT: usize = 1000;

/// Type names start with a letter, then letters, digits or underscores
pub fn valid_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Textual RFC 4122 UUID (hyphenated form)
pub fn valid_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}

pub fn valid_direction(value: &str) -> bool {
    value.parse::<Direction>().is_ok()
}

pub fn valid_mode(value: &str) -> bool {
    value.parse::<BatchMode>().is_ok()
}

pub fn validate_type_name(name: &str) -> Result<()> {
    if valid_type_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidTypeName(name.to_string()))
    }
}

/// Parse a UUID-typed id, naming the field in the error
pub fn parse_id<T: From<Uuid>>(field: &str, value: &str) -> Result<T> {
    match Uuid::try_parse(value) {
        Ok(id) if value.len() == 36 => Ok(T::from(id)),
        _ => Err(Error::InvalidUuid {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse an optional direction, defaulting to `both`
pub fn parse_direction(value: Option<&str>) -> Result<Direction> {
    match value {
        None => Ok(Direction::Both),
        Some(v) => v
            .parse::<Direction>()
            .map_err(|_| Error::InvalidDirection(v.to_string())),
    }
}

/// Parse an optional depth within `1..=max`
pub fn validate_depth(depth: Option<i64>, default: u32, max: u32) -> Result<u32> {
    match depth {
        None => Ok(default),
        Some(d) if d >= 1 && d <= i64::from(max) => Ok(d as u32),
        Some(d) => Err(Error::InvalidDepth { depth: d, max }),
    }
}

/// Optional limit must be positive
pub fn validate_limit(limit: Option<i64>) -> Result<Option<usize>> {
    match limit {
        None => Ok(None),
        Some(l) if l > 0 => Ok(Some(usize::try_from(l).unwrap_or(usize::MAX))),
        Some(l) => Err(Error::InvalidLimit(l)),
    }
}

/// Optional offset must not be negative
pub fn validate_offset(offset: Option<i64>) -> Result<Option<usize>> {
    match offset {
        None => Ok(None),
        Some(o) if o >= 0 => Ok(Some(usize::try_from(o).unwrap_or(usize::MAX))),
        Some(o) => Err(Error::InvalidOffset(o)),
    }
}

/// Batch bounds: 1..=MAX_BATCH_SIZE items
pub fn validate_batch_size(count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::EmptyBatch);
    }
    if count > MAX_BATCH_SIZE {
        return Err(Error::BatchTooLarge {
            count,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}
