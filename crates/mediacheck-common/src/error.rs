//! Common error types used throughout mediacheck.

/// Common error type for mediacheck.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A caption scheme URI or INSTREAM-ID was not recognized.
    #[error("Invalid caption scheme: {0}")]
    InvalidScheme(String),

    /// A caption stream label was malformed.
    #[error("Invalid caption stream: {0}")]
    InvalidStream(String),
}

impl Error {
    /// Create a new InvalidScheme error.
    pub fn invalid_scheme<S: Into<String>>(msg: S) -> Self {
        Self::InvalidScheme(msg.into())
    }

    /// Create a new InvalidStream error.
    pub fn invalid_stream<S: Into<String>>(msg: S) -> Self {
        Self::InvalidStream(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
