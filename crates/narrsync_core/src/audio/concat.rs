//! Audio concatenator: joins canonical chunks into one track.
//!
//! Samples are copied verbatim in item order with no gaps. Every chunk must
//! match the canonical format; the first one that doesn't aborts the join.

use std::fs;
use std::path::Path;

use hound::WavWriter;

use super::{AudioError, AudioResult};
use crate::media::wav;
use crate::media::MediaError;
use crate::models::{AudioAsset, AudioFormat};

/// What the joined track contains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcatSummary {
    pub chunks: usize,
    pub frames: u64,
    pub duration_seconds: f64,
}

/// Join `chunks` (already in item order) into `output`.
pub fn concat_audio(
    chunks: &[AudioAsset],
    format: &AudioFormat,
    output: &Path,
) -> AudioResult<ConcatSummary> {
    if chunks.is_empty() {
        return Err(AudioError::NoChunks);
    }

    // Check everything before writing anything.
    for chunk in chunks {
        let info = wav::read_info(&chunk.path)?;
        if info.format != *format {
            return Err(AudioError::FormatMismatch {
                item_id: chunk.item_id,
                expected: *format,
                actual: info.format,
            });
        }
    }

    let part = wav::part_path(output);
    let mut writer =
        WavWriter::create(&part, format.wav_spec()).map_err(|e| MediaError::wav(&part, e))?;

    let mut frames = 0;
    for chunk in chunks {
        frames += wav::append_samples(&chunk.path, &mut writer, &part)?;
    }
    writer.finalize().map_err(|e| MediaError::wav(&part, e))?;

    fs::rename(&part, output)
        .map_err(|e| MediaError::io(format!("renaming {}", part.display()), e))?;

    Ok(ConcatSummary {
        chunks: chunks.len(),
        frames,
        duration_seconds: format.duration_of(frames),
    })
}
