//! Unified error type for mediagate.
//!
//! Gateway operations only ever surface [`Error::InvalidInput`] and
//! [`Error::ConversionFailed`]; the remaining variants are produced by the
//! lower layers (tool discovery, process execution, configuration, playback)
//! and are folded into those two by the gateway where required.

use std::path::PathBuf;

/// Unified error type covering all failure modes in mediagate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input path does not reference an existing file.
    #[error("Invalid input: {} does not exist", path.display())]
    InvalidInput {
        /// The path that was checked.
        path: PathBuf,
    },

    /// The engine reported failure, the expected artifact is missing, or no
    /// diagnostic output could be obtained.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// An external tool could not be located, launched or awaited.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Configuration or argument validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The playback engine rejected a transport operation.
    #[error("Playback error: {0}")]
    Playback(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Map this error to the process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidInput { .. } => 2,
            Error::ConversionFailed(_) => 3,
            Error::Validation(_) => 4,
            Error::Tool { .. } => 1,
            Error::Playback(_) => 1,
            Error::Io { .. } => 1,
        }
    }

    /// Convenience constructor for [`Error::InvalidInput`].
    pub fn invalid_input(path: impl Into<PathBuf>) -> Self {
        Error::InvalidInput { path: path.into() }
    }

    /// Convenience constructor for [`Error::ConversionFailed`].
    pub fn conversion_failed(message: impl Into<String>) -> Self {
        Error::ConversionFailed(message.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Fold launch-level failures into [`Error::ConversionFailed`].
    ///
    /// `InvalidInput` and `ConversionFailed` pass through untouched; every
    /// other variant becomes `ConversionFailed` carrying its display text.
    pub fn into_conversion_failure(self) -> Self {
        match self {
            Error::InvalidInput { .. } | Error::ConversionFailed(_) => self,
            other => Error::ConversionFailed(other.to_string()),
        }
    }

    /// The diagnostic text carried by a [`Error::ConversionFailed`].
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Error::ConversionFailed(text) => Some(text),
            _ => None,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
