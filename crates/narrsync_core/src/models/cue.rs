//! Subtitle cues.

use serde::{Deserialize, Serialize};

/// One caption entry on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based, contiguous.
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Word-wrapped caption text (lines joined with `\n`).
    pub text: String,
}

impl SubtitleCue {
    /// Time the cue is on screen.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}
