//! Frame Error Types

use thiserror::Error;

/// Errors raised while decoding an inbound CAN payload
#[derive(Debug, Error)]
pub enum FrameError {
    /// Payload text is not valid JSON
    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level JSON value is not an object
    #[error("Payload is not a JSON object")]
    NotAnObject,

    /// A key is present but holds the wrong JSON type
    #[error("Field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// A data element does not fit in a byte
    #[error("Data byte {index} out of range: {value}")]
    ByteOutOfRange { index: usize, value: String },
}
