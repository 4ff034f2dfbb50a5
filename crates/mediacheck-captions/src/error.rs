//! Error types for caption extraction.

use thiserror::Error;

/// Errors raised while extracting or decoding captions.
#[derive(Debug, Error)]
pub enum CaptionError {
    /// Box or byte level failure in the media layer.
    #[error("Media error: {0}")]
    Media(#[from] mediacheck_media::Error),

    /// A DTVCC packet ended in the middle of a command.
    #[error("DTVCC packet exhausted at byte {0}")]
    PacketExhausted(usize),

    /// Media was presented before any init segment fixed the caption scheme.
    #[error("No caption scheme for representation {0}")]
    MissingScheme(String),
}

impl CaptionError {
    /// Whether the error came from reading past a buffer.
    pub fn is_bounds(&self) -> bool {
        match self {
            Self::Media(e) => e.is_bounds(),
            Self::PacketExhausted(_) => true,
            Self::MissingScheme(_) => false,
        }
    }
}

/// Result type for caption operations.
pub type Result<T> = std::result::Result<T, CaptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_classification() {
        let err: CaptionError = mediacheck_media::Error::out_of_bounds(4, 8, 6).into();
        assert!(err.is_bounds());
        assert!(CaptionError::PacketExhausted(3).is_bounds());
        assert!(!CaptionError::MissingScheme("video/1".into()).is_bounds());
    }
}
