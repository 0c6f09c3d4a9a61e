//! Error types for wire decoding.

use thiserror::Error;

/// Result type for wire decoding operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised while scanning a wire-format buffer.
///
/// Both variants are scoped to the message being decoded. Callers convert
/// them into "field absent" or "record dropped", never into a failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The buffer ended before a varint, fixed value or length-delimited
    /// payload was complete.
    #[error("message truncated at byte {offset}")]
    TruncatedMessage { offset: usize },

    /// A field could not be interpreted: a wire type that cannot be skipped,
    /// a varint longer than 64 bits, or a field number of zero.
    #[error("malformed field at byte {offset}: {reason}")]
    MalformedField { offset: usize, reason: String },
}

impl WireError {
    pub(crate) fn truncated(offset: usize) -> Self {
        WireError::TruncatedMessage { offset }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        WireError::MalformedField {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns true for [`WireError::TruncatedMessage`].
    pub fn is_truncation(&self) -> bool {
        matches!(self, WireError::TruncatedMessage { .. })
    }
}
