//! Service-level error type.
//!
//! Route handlers and the CLI funnel failures into [`Error`], which carries
//! enough context to derive an HTTP status code via [`Error::http_status`].
//! Messages in [`Error::Processing`] are shown to end users, so they never
//! contain filesystem paths; the detailed cause is logged where it happens.

/// Common error type for segtrim.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// The requested file was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A processing job failed; the message is safe to show to clients.
    #[error("{0}")]
    Processing(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Processing error.
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Map this error to an HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Processing(_) => 500,
            Error::Io(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Message suitable for an HTTP response body.
    ///
    /// I/O and internal errors are collapsed into a generic message since
    /// their text usually names server-side paths.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::Processing(msg) => msg.clone(),
            Error::NotFound(_) => "File not found.".to_string(),
            Error::Io(_) | Error::Internal(_) => {
                "Unexpected error while handling the request.".to_string()
            }
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
