//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail

use std::fmt;
use std::io;

use thiserror::Error;

use crate::audio::AudioError;
use crate::media::MediaError;
use crate::narration::NarrationError;
use crate::video::VideoError;

/// Classification of a fatal failure, used for exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Narration, images or another required input is absent or empty.
    MissingInput,
    /// ffmpeg/ffprobe is not installed or not runnable.
    ToolUnavailable,
    /// Two chunks that must be joined disagree on format.
    InternalFormatMismatch,
    Other,
}

impl ErrorKind {
    /// Process exit status for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::MissingInput => 2,
            ErrorKind::ToolUnavailable => 3,
            ErrorKind::InternalFormatMismatch => 4,
            ErrorKind::Other => 1,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingInput => write!(f, "missing input"),
            ErrorKind::ToolUnavailable => write!(f, "tool unavailable"),
            ErrorKind::InternalFormatMismatch => write!(f, "internal format mismatch"),
            ErrorKind::Other => write!(f, "error"),
        }
    }
}

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The run finished without the results it should have recorded.
    #[error("Run '{run_name}' failed validation: {message}")]
    ValidationFailed { run_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn validation_failed(run_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            run_name: run_name.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::StepFailed { source, .. } => source.kind(),
            PipelineError::ValidationFailed { .. } => ErrorKind::Other,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// A required input is absent or has nothing usable in it.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// A required media tool can't be run.
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Chunks to be joined disagree on format.
    #[error("Format mismatch at item {item_id}: expected {expected}, got {actual}")]
    FormatMismatch {
        item_id: i64,
        expected: String,
        actual: String,
    },

    /// A media operation failed.
    #[error("{}{source}", item_prefix(.item_id))]
    Media {
        item_id: Option<i64>,
        #[source]
        source: MediaError,
    },

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

fn item_prefix(item_id: &Option<i64>) -> String {
    item_id
        .map(|id| format!("item {}: ", id))
        .unwrap_or_default()
}

impl StepError {
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Media failure attributed to one item.
    pub fn media_for(item_id: i64, source: MediaError) -> Self {
        match source {
            MediaError::ToolNotFound(tool) => Self::ToolUnavailable(tool),
            source => Self::Media {
                item_id: Some(item_id),
                source,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::MissingInput(_) => ErrorKind::MissingInput,
            StepError::ToolUnavailable(_) => ErrorKind::ToolUnavailable,
            StepError::FormatMismatch { .. } => ErrorKind::InternalFormatMismatch,
            StepError::Media { source, .. } if source.is_structural() => {
                ErrorKind::ToolUnavailable
            }
            _ => ErrorKind::Other,
        }
    }
}

impl From<MediaError> for StepError {
    fn from(source: MediaError) -> Self {
        match source {
            MediaError::ToolNotFound(tool) => Self::ToolUnavailable(tool),
            source => Self::Media {
                item_id: None,
                source,
            },
        }
    }
}

impl From<AudioError> for StepError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Media(e) => e.into(),
            AudioError::FormatMismatch {
                item_id,
                expected,
                actual,
            } => Self::FormatMismatch {
                item_id,
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            AudioError::NoChunks => Self::precondition_failed("no audio chunks to concatenate"),
            other => Self::other(other.to_string()),
        }
    }
}

impl From<VideoError> for StepError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::ImagesDirMissing(dir) => {
                Self::missing_input(format!("images directory not found: {}", dir.display()))
            }
            VideoError::NoImages(dir) => {
                Self::missing_input(format!("no usable images in {}", dir.display()))
            }
            VideoError::Media(e) => e.into(),
            VideoError::FormatMismatch {
                item_id,
                expected,
                actual,
            } => Self::FormatMismatch {
                item_id,
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            VideoError::Io { operation, source } => Self::IoError { operation, source },
        }
    }
}

impl From<NarrationError> for StepError {
    fn from(err: NarrationError) -> Self {
        Self::missing_input(err.to_string())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
