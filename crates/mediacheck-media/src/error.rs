//! Error types for mediacheck-media.

use thiserror::Error;

/// Result type for mediacheck-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mediacheck-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read, skip or write would leave the buffer.
    #[error("Out of bounds: need {need} bytes at position {position}, buffer length {len}")]
    OutOfBounds {
        position: usize,
        need: usize,
        len: usize,
    },

    /// A 64-bit field does not fit the platform's addressable range.
    #[error("Integer overflow: {0}")]
    Overflow(&'static str),

    /// Box structure is inconsistent with its declared layout.
    #[error("Invalid box: {0}")]
    InvalidBox(String),

    /// A box required by the surrounding structure was not present.
    #[error("Missing required box: {0}")]
    MissingBox(&'static str),
}

impl Error {
    /// Create an invalid box error.
    pub fn invalid_box(msg: impl Into<String>) -> Self {
        Self::InvalidBox(msg.into())
    }

    /// Create an out-of-bounds error.
    pub fn out_of_bounds(position: usize, need: usize, len: usize) -> Self {
        Self::OutOfBounds {
            position,
            need,
            len,
        }
    }

    /// Whether this error came from running off the end of a buffer.
    pub fn is_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::Overflow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_display() {
        let err = Error::out_of_bounds(10, 4, 12);
        assert_eq!(
            err.to_string(),
            "Out of bounds: need 4 bytes at position 10, buffer length 12"
        );
        assert!(err.is_bounds());
    }

    #[test]
    fn test_structural_errors_are_not_bounds() {
        assert!(!Error::MissingBox("moov").is_bounds());
        assert!(!Error::invalid_box("size smaller than header").is_bounds());
    }
}
