//! Error types for the content store.

use thiserror::Error;

/// A stored value that does not match any known variant or shape
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown {field} value: {value:?}")]
    UnknownVariant { field: &'static str, value: String },

    #[error("Malformed public ratings: {0}")]
    PublicRatings(#[from] serde_json::Error),
}

/// A value that could not be turned into its stored form
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Cannot encode public ratings: {0}")]
    PublicRatings(#[from] serde_json::Error),
}

/// Errors surfaced by store operations.
///
/// Nothing is retried or swallowed; callers decide how to report these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// Whether this error came from reading a row the codec could not decode
    pub fn is_decode(&self) -> bool {
        matches!(self, StoreError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_failure_is_not_a_decode_error() {
        let json_err = serde_json::from_str::<i32>("x").unwrap_err();
        let err = StoreError::from(EncodeError::from(json_err));
        assert!(!err.is_decode());
        assert!(matches!(err, StoreError::Encode(_)));

        let json_err = serde_json::from_str::<i32>("x").unwrap_err();
        let err = StoreError::from(DecodeError::from(json_err));
        assert!(err.is_decode());
    }
}
