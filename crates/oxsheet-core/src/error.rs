//! Error types for oxsheet-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
///
/// Callers that only care about the failure category (bounds problem vs.
/// malformed input vs. style lookup) can match on this instead of the
/// individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Address, index, count or value bounds; colliding ranges
    Range,
    /// Malformed address/range strings, invalid sheet names, wrong value type
    Format,
    /// Unknown style component kind, missing style reference, frozen registry
    Style,
    /// Operation would violate a worksheet or workbook invariant
    Worksheet,
    /// Underlying stream or container failure
    Io,
}

/// Errors that can occur in oxsheet-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// Number of values does not match the number of cells in a range
    #[error("Range holds {expected} cells but {actual} values were supplied")]
    RangeMismatch { expected: u64, actual: usize },

    /// Merged cell conflict
    #[error("Range {0} overlaps an existing merged region")]
    MergedCellConflict(String),

    /// A numeric or date value is outside the range the format can store
    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Unknown style component kind
    #[error("Unknown style component: {0}")]
    UnknownStyleComponent(String),

    /// Style lookup by id failed
    #[error("No {kind} with id {id} in the style registry")]
    MissingStyle { kind: &'static str, id: u32 },

    /// The style registry no longer accepts new entries
    #[error("Style registry is frozen")]
    RegistryFrozen,

    /// Invalid value type for operation
    #[error("Invalid value type: expected {expected}, got {actual}")]
    InvalidValueType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Operation would violate a worksheet invariant
    #[error("Worksheet error: {0}")]
    Worksheet(String),
}

impl Error {
    /// Create a worksheet invariant error with a message
    pub fn worksheet<S: Into<String>>(msg: S) -> Self {
        Error::Worksheet(msg.into())
    }

    /// Create a value-out-of-range error with a message
    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        Error::ValueOutOfRange(msg.into())
    }

    /// The category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RowOutOfBounds(..)
            | Error::ColumnOutOfBounds(..)
            | Error::RangeMismatch { .. }
            | Error::MergedCellConflict(_)
            | Error::ValueOutOfRange(_)
            | Error::SheetOutOfBounds(..) => ErrorKind::Range,
            Error::InvalidAddress(_)
            | Error::InvalidRange(_)
            | Error::InvalidSheetName(_)
            | Error::DuplicateSheetName(_)
            | Error::InvalidValueType { .. } => ErrorKind::Format,
            Error::UnknownStyleComponent(_)
            | Error::MissingStyle { .. }
            | Error::RegistryFrozen => ErrorKind::Style,
            Error::SheetNotFound(_) | Error::Worksheet(_) => ErrorKind::Worksheet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::RowOutOfBounds(5, 4).kind(), ErrorKind::Range);
        assert_eq!(
            Error::RangeMismatch {
                expected: 12,
                actual: 11
            }
            .kind(),
            ErrorKind::Range
        );
        assert_eq!(Error::InvalidAddress("A".into()).kind(), ErrorKind::Format);
        assert_eq!(Error::InvalidSheetName("a/b".into()).kind(), ErrorKind::Format);
        assert_eq!(Error::RegistryFrozen.kind(), ErrorKind::Style);
        assert_eq!(
            Error::worksheet("last visible sheet").kind(),
            ErrorKind::Worksheet
        );
    }

    #[test]
    fn test_error_messages() {
        let err = Error::RangeMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Range holds 4 cells but 3 values were supplied"
        );
    }
}
