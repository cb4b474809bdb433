//! Narration audio: lookup, normalization, durations, silence and joining.
//!
//! Every item ends up with exactly one canonical PCM chunk, either its own
//! normalized narration or synthesized silence. Durations are always taken
//! from sample frame counts so the video and caption timelines can be built
//! from them exactly.

pub mod concat;
pub mod duration;
pub mod normalizer;
pub mod resolver;
pub mod silence;

use std::path::PathBuf;

use thiserror::Error;

use crate::media::MediaError;
use crate::models::AudioFormat;

pub use concat::{concat_audio, ConcatSummary};
pub use duration::{
    get_estimator, placeholder_duration, DurationOracle, DurationStrategy, DurationVerdict,
    FixedEstimator, MeanEstimator, MedianEstimator, PlaceholderEstimator, ProbeStrategy,
    WavHeaderStrategy,
};
pub use normalizer::{normalize, normalize_args, NormalizedAudio};
pub use resolver::{AudioResolver, Resolution};
pub use silence::{synthesize_silence, Silence};

/// Errors from audio operations.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error(transparent)]
    Media(#[from] MediaError),

    /// A normalized chunk decoded but is not in the canonical format.
    #[error("{} decoded as {actual}, expected {expected}", path.display())]
    NotCanonical {
        path: PathBuf,
        expected: AudioFormat,
        actual: AudioFormat,
    },

    /// A normalized chunk holds no samples.
    #[error("{} contains no audio", .0.display())]
    Empty(PathBuf),

    /// Chunks disagree on format at concatenation time.
    #[error("Audio format mismatch at item {item_id}: expected {expected}, got {actual}")]
    FormatMismatch {
        item_id: i64,
        expected: AudioFormat,
        actual: AudioFormat,
    },

    /// No duration strategy could measure a chunk.
    #[error("cannot determine duration of {}: {}", path.display(), reasons.join("; "))]
    NoDuration { path: PathBuf, reasons: Vec<String> },

    #[error("No audio chunks to concatenate")]
    NoChunks,
}

impl AudioError {
    /// Whether another attempt at the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AudioError::Media(e) => !e.is_structural(),
            _ => false,
        }
    }

    /// The underlying tool is missing, so no item can be processed.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, AudioError::Media(e) if e.is_structural())
    }
}

pub type AudioResult<T> = Result<T, AudioError>;
