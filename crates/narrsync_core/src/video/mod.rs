//! Still-image video track: per-item segments and their concatenation.

pub mod concat;
pub mod segment;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::media::MediaError;
use crate::models::FrameSpec;

pub use concat::{check_segments, concat_list, write_concat_list};
pub use segment::{list_images, plan_frames, SegmentPlanner, SegmentRequest};

/// Errors from video track operations.
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Images directory not found: {}", .0.display())]
    ImagesDirMissing(PathBuf),

    #[error("No usable images in {}", .0.display())]
    NoImages(PathBuf),

    #[error(transparent)]
    Media(#[from] MediaError),

    /// A segment was rendered at a different geometry or rate.
    #[error("Video format mismatch at item {item_id}: expected {expected}, got {actual}")]
    FormatMismatch {
        item_id: i64,
        expected: FrameSpec,
        actual: FrameSpec,
    },

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl VideoError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

pub type VideoResult<T> = Result<T, VideoError>;
