//! Narration input: the ordered list of beats the video is built from.

mod loader;

pub use loader::{load_narration, parse_narration, LoadedNarration, NarrationError, SkippedRecord};
