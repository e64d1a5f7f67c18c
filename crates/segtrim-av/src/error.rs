//! Error types for segtrim-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing, planning, cutting or joining.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool exited unsuccessfully.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// The duration of the input could not be determined.
    #[error("probe failed: {message}")]
    Probe { message: String },

    /// Segment parameters violate `0 <= removal < segment`.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Cutting one plan window failed.
    #[error("cut failed for window {index} (start {start}s): {message}")]
    Cut {
        index: usize,
        start: f64,
        message: String,
    },

    /// Joining the cut windows failed.
    #[error("concatenation failed: {message}")]
    Concat { message: String },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An I/O error occurred while acquiring or releasing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job was cancelled before it finished.
    #[error("job cancelled")]
    Cancelled,
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a probe error.
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
        }
    }

    /// Create an invalid parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// The diagnostic text of the underlying failure.
    ///
    /// For tool failures this is the tool's stderr, without the
    /// "tool execution failed" prefix, so stage errors can wrap it verbatim.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::ToolFailed { message, .. } => message.clone(),
            Error::Probe { message } | Error::Concat { message } => message.clone(),
            Error::Cut { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Name of the job stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Probe { .. } | Error::FileNotFound { .. } => "probe",
            Error::InvalidParameters(_) => "plan",
            Error::Cut { .. } => "cut",
            Error::Concat { .. } => "concat",
            Error::Cancelled => "cancelled",
            Error::ToolNotFound { .. } | Error::ToolFailed { .. } => "tool",
            Error::Io(_) => "io",
        }
    }
}
