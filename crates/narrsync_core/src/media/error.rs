//! Media operation errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error from a media operation.
#[derive(Error, Debug)]
pub enum MediaError {
    /// A required tool is not installed.
    #[error("Required tool '{0}' not found in PATH")]
    ToolNotFound(String),

    /// A tool could not be started.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// A tool ran and exited with failure.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
        /// Full captured stderr.
        stderr: String,
    },

    /// Tool output could not be interpreted.
    #[error("Failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// WAV read/write failure.
    #[error("WAV error in {}: {source}", path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The operation reported success but produced nothing usable.
    #[error("Output file missing or empty: {}", .0.display())]
    OutputMissing(PathBuf),
}

impl MediaError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn wav(path: impl Into<PathBuf>, source: hound::Error) -> Self {
        Self::Wav {
            path: path.into(),
            source,
        }
    }

    /// Failure that retrying cannot fix (tool not installed).
    pub fn is_structural(&self) -> bool {
        matches!(self, MediaError::ToolNotFound(_))
    }

    /// Captured tool stderr, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            MediaError::CommandFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
