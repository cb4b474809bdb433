//! Pipeline step implementations.
//!
//! Each step handles one phase of turning narration, audio and stills into
//! the final video.

mod concat_audio;
mod concat_video;
mod load_narration;
mod mux;
mod preflight;
mod prepare_audio;
mod render_segments;
mod subtitles;

pub use concat_audio::ConcatAudioStep;
pub use concat_video::ConcatVideoStep;
pub use load_narration::LoadNarrationStep;
pub use mux::MuxStep;
pub use preflight::PreflightStep;
pub use prepare_audio::PrepareAudioStep;
pub use render_segments::RenderSegmentsStep;
pub use subtitles::SubtitlesStep;

use crate::logging::RunLogger;
use crate::media::{MediaError, OpReport};

/// Log the command line and tool output of a finished operation.
fn log_report(logger: &RunLogger, report: &OpReport) {
    if let Some(command) = &report.command {
        logger.command(command);
    }
    logger.output_block(&report.output, true);
}

/// Feed a failed operation's stderr into the tail buffer.
fn log_failure(logger: &RunLogger, error: &MediaError) {
    if let Some(stderr) = error.tool_output() {
        logger.output_block(stderr, true);
    }
}
