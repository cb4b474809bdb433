//! Media-related data structures (audio formats, frames, assets, segments).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::SampleFormat;

/// PCM audio format: sample rate, channel count and sample encoding.
///
/// Every chunk is normalized to one canonical format before concatenation,
/// so two chunks can be joined only when their formats compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Integer or float samples.
    #[serde(default)]
    pub sample_format: SampleFormat,
}

impl AudioFormat {
    /// 44.1 kHz stereo 16-bit linear PCM.
    pub const fn canonical() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    /// Number of sample frames needed to cover `seconds` (rounded).
    pub fn frames_for(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }

    /// Exact duration of `frames` sample frames.
    pub fn duration_of(&self, frames: u64) -> f64 {
        frames as f64 / self.sample_rate as f64
    }

    /// Name of the ffmpeg PCM codec producing this format.
    pub fn pcm_codec(&self) -> String {
        format!("pcm_{}le", self.sample_format.tag(self.bits_per_sample))
    }

    /// WAV header spec for this format.
    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: self.sample_format.into(),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::canonical()
    }
}

impl From<hound::WavSpec> for AudioFormat {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            sample_format: spec.sample_format.into(),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz / {} ch / {}",
            self.sample_rate,
            self.channels,
            self.sample_format.tag(self.bits_per_sample)
        )
    }
}

/// Output frame geometry and rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FrameSpec {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Index of the frame boundary nearest to `seconds`.
    pub fn frame_at(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.fps as f64).round() as u64
    }

    /// Duration of `frames` frames in seconds.
    pub fn duration_of(&self, frames: u64) -> f64 {
        frames as f64 / self.fps as f64
    }
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self::new(1280, 720, 30)
    }
}

impl fmt::Display for FrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.fps)
    }
}

/// One item's audio chunk in canonical format.
///
/// Either normalized narration audio or synthesized placeholder silence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// Narration item this chunk belongs to.
    pub item_id: i64,
    /// Canonical WAV chunk in the scratch directory.
    pub path: PathBuf,
    /// Authoritative duration (frames / sample rate).
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Sample frames in the chunk.
    pub frames: u64,
    /// True if this chunk is synthesized silence.
    pub is_placeholder: bool,
}

impl AudioAsset {
    /// Describe a canonical chunk of `frames` sample frames.
    pub fn new(
        item_id: i64,
        path: PathBuf,
        format: &AudioFormat,
        frames: u64,
        is_placeholder: bool,
    ) -> Self {
        Self {
            item_id,
            path,
            duration_seconds: format.duration_of(frames),
            sample_rate: format.sample_rate,
            channels: format.channels,
            frames,
            is_placeholder,
        }
    }
}

/// One item's rendered still-image clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub item_id: i64,
    /// Source still image.
    pub image_path: PathBuf,
    /// The item's audio duration.
    pub duration_seconds: f64,
    /// Rendered clip in the scratch directory.
    pub output_path: PathBuf,
    /// Exact number of frames rendered.
    pub frame_count: u64,
    /// Geometry and rate the clip was rendered at.
    pub frame: FrameSpec,
    /// Fingerprint of everything that determines the rendered bytes.
    #[serde(default)]
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_format_frames_are_exact() {
        let fmt = AudioFormat::canonical();
        assert_eq!(fmt.frames_for(1.5), 66_150);
        assert_eq!(fmt.duration_of(66_150), 1.5);
        assert_eq!(fmt.pcm_codec(), "pcm_s16le");
    }

    #[test]
    fn frames_for_rounds_to_nearest() {
        let fmt = AudioFormat::canonical();
        // 0.1 / 44100 of a frame either side rounds back
        assert_eq!(fmt.frames_for(1.0 + 0.4 / 44_100.0), 44_100);
        assert_eq!(fmt.frames_for(1.0 + 0.6 / 44_100.0), 44_101);
        assert_eq!(fmt.frames_for(-3.0), 0);
    }

    #[test]
    fn format_display_is_readable() {
        assert_eq!(AudioFormat::canonical().to_string(), "44100 Hz / 2 ch / s16");
    }

    #[test]
    fn frame_spec_boundaries() {
        let spec = FrameSpec::default();
        assert_eq!(spec.frame_at(2.0), 60);
        assert_eq!(spec.frame_at(5.51), 165);
        assert!((spec.duration_of(45) - 1.5).abs() < 1e-12);
        assert_eq!(spec.to_string(), "1280x720@30");
    }

    #[test]
    fn asset_duration_comes_from_frames() {
        let asset = AudioAsset::new(
            3,
            PathBuf::from("norm_003.wav"),
            &AudioFormat::canonical(),
            88_200,
            false,
        );
        assert_eq!(asset.duration_seconds, 2.0);
        assert_eq!(asset.channels, 2);
    }
}
