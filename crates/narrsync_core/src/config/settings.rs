//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{AudioFormat, FrameSpec, PlaceholderPolicy, SampleFormat};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Canonical audio format and asset naming.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Output frame and encoder settings.
    #[serde(default)]
    pub video: VideoSettings,

    /// Caption timing and burn-in style.
    #[serde(default)]
    pub subtitles: SubtitleSettings,

    /// Worker pool, retries and placeholder policy.
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check values that would make the pipeline produce nonsense.
    ///
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.audio.sample_rate == 0 {
            problems.push("audio.sample_rate must be positive".to_string());
        }
        if self.audio.channels == 0 {
            problems.push("audio.channels must be positive".to_string());
        }
        // ffmpeg has no signed 8-bit WAV encoder
        if ![16, 24, 32].contains(&self.audio.bits_per_sample) {
            problems.push(format!(
                "audio.bits_per_sample must be 16, 24 or 32 (got {})",
                self.audio.bits_per_sample
            ));
        }
        if self.audio.extensions.is_empty() {
            problems.push("audio.extensions must list at least one extension".to_string());
        }
        if self.video.fps == 0 {
            problems.push("video.fps must be positive".to_string());
        }
        // libx264 with yuv420p needs even dimensions
        if self.video.width == 0 || self.video.width % 2 != 0 {
            problems.push(format!("video.width must be even and positive (got {})", self.video.width));
        }
        if self.video.height == 0 || self.video.height % 2 != 0 {
            problems.push(format!(
                "video.height must be even and positive (got {})",
                self.video.height
            ));
        }
        if !(self.video.fade_seconds >= 0.0) {
            problems.push("video.fade_seconds must be non-negative".to_string());
        }
        if !(self.subtitles.gap_seconds >= 0.0) {
            problems.push("subtitles.gap_seconds must be non-negative".to_string());
        }
        if self.subtitles.wrap_width == 0 {
            problems.push("subtitles.wrap_width must be positive".to_string());
        }
        if !(self.pipeline.fallback_duration_secs > 0.0) {
            problems.push("pipeline.fallback_duration_secs must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// JSON array of narration records.
    #[serde(default = "default_narration_file")]
    pub narration_file: String,

    /// Directory holding per-item narration audio.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,

    /// Directory holding still images.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Final deliverable.
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Root folder for per-run scratch directories.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Directory containing ffmpeg and ffprobe; blank means PATH.
    #[serde(default)]
    pub tools_dir: String,
}

fn default_narration_file() -> String {
    "narration.json".to_string()
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

fn default_images_dir() -> String {
    "assets".to_string()
}

fn default_output_file() -> String {
    "final_video_sync.mp4".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl PathSettings {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_file)
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            narration_file: default_narration_file(),
            audio_dir: default_audio_dir(),
            images_dir: default_images_dir(),
            output_file: default_output_file(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
            tools_dir: String::new(),
        }
    }
}

/// Canonical audio format and asset naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Canonical sample rate.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Canonical channel count.
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Canonical bit depth (signed integer PCM).
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,

    /// Audio file stem prefix; the item id follows, zero-padded.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Minimum digits of the zero-padded id.
    #[serde(default = "default_id_width")]
    pub id_width: usize,

    /// Extensions tried in order when resolving an item's audio.
    #[serde(default = "default_audio_extensions")]
    pub extensions: Vec<String>,

    /// AAC bitrate of the final deliverable.
    #[serde(default = "default_output_bitrate")]
    pub output_bitrate: String,
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_channels() -> u16 {
    2
}

fn default_bits_per_sample() -> u16 {
    16
}

fn default_file_prefix() -> String {
    "narration_".to_string()
}

fn default_id_width() -> usize {
    2
}

fn default_audio_extensions() -> Vec<String> {
    ["wav", "mp3", "m4a", "ogg", "flac"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_bitrate() -> String {
    "192k".to_string()
}

impl AudioSettings {
    /// The canonical PCM format every chunk is normalized to.
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bits_per_sample: default_bits_per_sample(),
            file_prefix: default_file_prefix(),
            id_width: default_id_width(),
            extensions: default_audio_extensions(),
            output_bitrate: default_output_bitrate(),
        }
    }
}

/// Output frame and encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Fade-in and fade-out length per segment (clamped to half the segment).
    #[serde(default = "default_fade_seconds")]
    pub fade_seconds: f64,

    /// libx264 constant rate factor.
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// libx264 preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Image extensions picked up from the images directory.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    30
}

fn default_fade_seconds() -> f64 {
    0.5
}

fn default_crf() -> u32 {
    20
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "webp", "bmp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl VideoSettings {
    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec::new(self.width, self.height, self.fps)
    }
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            fade_seconds: default_fade_seconds(),
            crf: default_crf(),
            preset: default_preset(),
            image_extensions: default_image_extensions(),
        }
    }
}

/// Caption timing and burn-in style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleSettings {
    /// Gap left before the next cue starts.
    #[serde(default = "default_gap_seconds")]
    pub gap_seconds: f64,

    /// Maximum characters per caption line.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    #[serde(default = "default_font_name")]
    pub font_name: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Bottom margin in pixels.
    #[serde(default = "default_margin_v")]
    pub margin_v: u32,

    /// ASS colour (`&HAABBGGRR`).
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,

    /// ASS colour (`&HAABBGGRR`).
    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    /// 1 = outline + shadow, 3 = opaque box.
    #[serde(default = "default_border_style")]
    pub border_style: u32,

    #[serde(default = "default_outline")]
    pub outline: u32,

    #[serde(default)]
    pub shadow: u32,

    /// Numpad-style alignment (2 = bottom centre).
    #[serde(default = "default_alignment")]
    pub alignment: u32,
}

fn default_gap_seconds() -> f64 {
    0.04
}

fn default_wrap_width() -> usize {
    50
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    20
}

fn default_margin_v() -> u32 {
    40
}

fn default_primary_colour() -> String {
    "&H00FFFFFF".to_string()
}

fn default_outline_colour() -> String {
    "&H00000000".to_string()
}

fn default_border_style() -> u32 {
    1
}

fn default_outline() -> u32 {
    2
}

fn default_alignment() -> u32 {
    2
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            gap_seconds: default_gap_seconds(),
            wrap_width: default_wrap_width(),
            font_name: default_font_name(),
            font_size: default_font_size(),
            margin_v: default_margin_v(),
            primary_colour: default_primary_colour(),
            outline_colour: default_outline_colour(),
            border_style: default_border_style(),
            outline: default_outline(),
            shadow: 0,
            alignment: default_alignment(),
        }
    }
}

/// Worker pool, retries and placeholder policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Per-item worker threads (0 = available parallelism, capped at 4).
    #[serde(default)]
    pub workers: usize,

    /// Extra attempts for a failed per-item media operation.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Keep the scratch directory after a successful run.
    #[serde(default)]
    pub keep_scratch: bool,

    /// How missing narration audio is sized.
    #[serde(default)]
    pub placeholder_policy: PlaceholderPolicy,

    /// Placeholder duration when no item has audio (or policy is `fixed`).
    #[serde(default = "default_fallback_duration")]
    pub fallback_duration_secs: f64,
}

fn default_retries() -> u32 {
    1
}

fn default_fallback_duration() -> f64 {
    2.0
}

impl PipelineSettings {
    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(4)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            retries: default_retries(),
            keep_scratch: false,
            placeholder_policy: PlaceholderPolicy::default(),
            fallback_duration_secs: default_fallback_duration(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show on error.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log full media tool command lines.
    #[serde(default = "default_true")]
    pub show_commands: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_commands: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Audio,
    Video,
    Subtitles,
    Pipeline,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Audio,
        ConfigSection::Video,
        ConfigSection::Subtitles,
        ConfigSection::Pipeline,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Audio => "audio",
            ConfigSection::Video => "video",
            ConfigSection::Subtitles => "subtitles",
            ConfigSection::Pipeline => "pipeline",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Input assets, output file and working directories",
            ConfigSection::Audio => "Canonical PCM format and narration audio naming",
            ConfigSection::Video => "Output frame size, rate and encoder",
            ConfigSection::Subtitles => "Caption timing and burn-in style",
            ConfigSection::Pipeline => "Workers, retries and placeholder sizing",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
