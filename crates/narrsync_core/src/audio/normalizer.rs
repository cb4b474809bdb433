//! Audio normalizer: converts narration files to canonical PCM WAV.

use std::fs;
use std::path::Path;

use super::{AudioError, AudioResult};
use crate::media::wav::{self, WavInfo};
use crate::media::{MediaToolkit, OpReport};
use crate::models::AudioFormat;

/// A canonical chunk produced (or reused) for one item.
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    pub info: WavInfo,
    /// True if an up-to-date chunk from an earlier run was kept.
    pub reused: bool,
    pub report: Option<OpReport>,
}

/// ffmpeg arguments decoding `input` to `format` as WAV at `output`.
pub fn normalize_args(input: &Path, output: &Path, format: &AudioFormat) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vn".to_string(),
        "-ar".to_string(),
        format.sample_rate.to_string(),
        "-ac".to_string(),
        format.channels.to_string(),
        "-c:a".to_string(),
        format.pcm_codec(),
        "-f".to_string(),
        "wav".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Normalize `input` into `output`, reusing `output` when it is already a
/// canonical chunk at least as new as `input`.
///
/// The result is always verified by reading it back as WAV.
pub fn normalize(
    toolkit: &dyn MediaToolkit,
    input: &Path,
    output: &Path,
    format: &AudioFormat,
) -> AudioResult<NormalizedAudio> {
    if is_up_to_date(input, output) {
        if let Ok(info) = verify(output, format) {
            return Ok(NormalizedAudio {
                info,
                reused: true,
                report: None,
            });
        }
    }

    let report = toolkit.normalize_audio(input, output, format)?;
    let info = verify(output, format)?;
    Ok(NormalizedAudio {
        info,
        reused: false,
        report: Some(report),
    })
}

/// Check that `path` decodes as a non-empty chunk in `format`.
pub fn verify(path: &Path, format: &AudioFormat) -> AudioResult<WavInfo> {
    let info = wav::read_info(path)?;
    if info.format != *format {
        return Err(AudioError::NotCanonical {
            path: path.to_path_buf(),
            expected: *format,
            actual: info.format,
        });
    }
    if info.frames == 0 {
        return Err(AudioError::Empty(path.to_path_buf()));
    }
    Ok(info)
}

fn is_up_to_date(input: &Path, output: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(input), modified(output)) {
        (Some(src), Some(out)) => out >= src,
        _ => false,
    }
}
