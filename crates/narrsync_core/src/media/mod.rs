//! Media operations behind a narrow capability interface.
//!
//! Pipeline stages talk to [`MediaToolkit`] with typed requests and paths;
//! they never build processes themselves. [`FfmpegToolkit`] implements the
//! trait with the native `ffmpeg`/`ffprobe` binaries. PCM work that needs
//! sample-exact control (probing frame counts, writing silence, joining
//! chunks) is done in-process by the [`wav`] helpers.
//!
//! # Architecture
//!
//! ```text
//! MediaToolkit (trait)
//!     ├── FfmpegToolkit  - ffmpeg / ffprobe child processes
//!     └── (tests) FakeToolkit - hound-backed stand-in
//! wav                 - hound WAV probing, silence, sample copy
//! runner / tools      - process spawning and tool locations
//! ```

mod error;
mod ffmpeg;
mod runner;
mod tools;
pub mod wav;

#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;

pub use error::{MediaError, MediaResult};
pub use ffmpeg::FfmpegToolkit;
pub use runner::{format_command, run_tool, ToolOutput};
pub use tools::ToolPaths;

use crate::models::AudioFormat;
use crate::mux::MuxRequest;
use crate::video::SegmentRequest;

/// What a completed media operation reports back for logging.
#[derive(Debug, Clone, Default)]
pub struct OpReport {
    /// Command line that was run, if a native tool was involved.
    pub command: Option<String>,
    /// Diagnostic output (tool stderr).
    pub output: String,
}

/// Capability interface for the blocking media operations of the pipeline.
///
/// Every method is a synchronous unit of work; implementations must be
/// usable from several worker threads at once, each writing its own output
/// path.
pub trait MediaToolkit: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Verify the underlying tools are installed and runnable.
    ///
    /// Called once before any work starts.
    fn check_available(&self) -> MediaResult<()>;

    /// Decode `input` (any container/codec) and write canonical PCM WAV.
    fn normalize_audio(
        &self,
        input: &Path,
        output: &Path,
        format: &AudioFormat,
    ) -> MediaResult<OpReport>;

    /// Container-level duration in seconds, `None` when the tool can't tell.
    fn probe_duration(&self, input: &Path) -> MediaResult<Option<f64>>;

    /// Render one still-image segment.
    fn render_segment(&self, request: &SegmentRequest) -> MediaResult<OpReport>;

    /// Join rendered segments listed in a concat list file (stream copy).
    fn concat_video(&self, list_file: &Path, output: &Path) -> MediaResult<OpReport>;

    /// Combine video, audio and burned-in subtitles into the deliverable.
    fn mux(&self, request: &MuxRequest) -> MediaResult<OpReport>;
}
