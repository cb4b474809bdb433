//! narrsync core - narration-synchronized video assembly
//!
//! Turns a list of narration records, their audio files and a folder of
//! still images into one MP4 whose slideshow, narration track and burned-in
//! captions stay in sync. This crate contains all of the pipeline logic; the
//! `narrsync` binary is a thin CLI over [`orchestrator::run`].

pub mod audio;
pub mod config;
pub mod logging;
pub mod media;
pub mod models;
pub mod mux;
pub mod narration;
pub mod orchestrator;
pub mod subtitles;
pub mod video;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
