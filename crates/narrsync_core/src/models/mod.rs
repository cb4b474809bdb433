//! Data models for narrsync.
//!
//! This module contains the core data structures that flow between
//! pipeline stages:
//! - Narration items as loaded from input
//! - Media descriptions (audio formats, frame specs, assets, segments)
//! - Subtitle cues derived from the duration sequence
//! - Enums used by configuration

mod cue;
mod enums;
mod media;
mod narration;

pub use cue::SubtitleCue;
pub use enums::{PlaceholderPolicy, SampleFormat};
pub use media::{AudioAsset, AudioFormat, FrameSpec, VideoSegment};
pub use narration::NarrationItem;
