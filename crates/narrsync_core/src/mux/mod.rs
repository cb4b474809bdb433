//! Final muxing: silent video + narration track + burned-in captions.
//!
//! # Architecture
//!
//! - **style**: Builds the `force_style` override for the subtitles filter
//! - **args_builder**: Converts a `MuxRequest` into ffmpeg arguments

mod args_builder;
mod style;

use std::path::PathBuf;

pub use args_builder::{escape_filter_path, format_args_pretty, MuxArgsBuilder};
pub use style::SubtitleStyle;

use crate::config::Settings;

/// Everything the muxer needs to produce the deliverable.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxRequest {
    /// Concatenated silent video.
    pub video: PathBuf,
    /// Concatenated narration track.
    pub audio: PathBuf,
    /// SRT burned into the frames.
    pub subtitles: PathBuf,
    pub output: PathBuf,
    pub style: SubtitleStyle,
    pub crf: u32,
    pub preset: String,
    /// AAC bitrate, e.g. `192k`.
    pub audio_bitrate: String,
}

impl MuxRequest {
    pub fn new(
        video: PathBuf,
        audio: PathBuf,
        subtitles: PathBuf,
        output: PathBuf,
        settings: &Settings,
    ) -> Self {
        Self {
            video,
            audio,
            subtitles,
            output,
            style: SubtitleStyle::from(&settings.subtitles),
            crf: settings.video.crf,
            preset: settings.video.preset.clone(),
            audio_bitrate: settings.audio.output_bitrate.clone(),
        }
    }
}
