//! Caption timeline and SRT output.
//!
//! Cues are derived purely from the ordered item durations: each item's
//! caption starts where its audio starts and ends a short gap before the
//! next item begins.

pub mod srt;
pub mod timeline;

pub use srt::{format_srt_time, write_srt, write_srt_file};
pub use timeline::{build_cues, wrap_text, TimelineOptions};
