//! Silence synthesizer for items without usable narration.

use std::path::Path;

use super::AudioResult;
use crate::media::wav;
use crate::models::AudioFormat;

/// A written (or reused) silence chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Silence {
    pub frames: u64,
    /// Authoritative duration, `frames / sample_rate`.
    pub duration_seconds: f64,
    pub reused: bool,
}

/// Write `round(duration × sample_rate)` frames of silence to `path`.
///
/// At least one frame is always written. An existing file at `path` that
/// already has exactly that many frames in `format` is kept.
pub fn synthesize_silence(
    path: &Path,
    format: &AudioFormat,
    duration_seconds: f64,
) -> AudioResult<Silence> {
    let frames = format.frames_for(duration_seconds).max(1);
    let silence = Silence {
        frames,
        duration_seconds: format.duration_of(frames),
        reused: false,
    };

    if let Ok(info) = wav::read_info(path) {
        if info.format == *format && info.frames == frames {
            return Ok(Silence {
                reused: true,
                ..silence
            });
        }
    }

    wav::write_silence(path, format, frames)?;
    Ok(silence)
}
