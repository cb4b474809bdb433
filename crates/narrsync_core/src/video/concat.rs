//! Video concatenator support: format agreement and the concat list.
//!
//! The join itself is a stream copy done by the media toolkit, which only
//! works when every segment shares geometry, rate and codec settings.

use std::fs;
use std::path::{Path, PathBuf};

use super::{VideoError, VideoResult};
use crate::media::MediaError;
use crate::models::{FrameSpec, VideoSegment};

/// Check every segment was rendered at `expected` and exists on disk.
pub fn check_segments(segments: &[VideoSegment], expected: &FrameSpec) -> VideoResult<()> {
    for segment in segments {
        if segment.frame != *expected {
            return Err(VideoError::FormatMismatch {
                item_id: segment.item_id,
                expected: *expected,
                actual: segment.frame,
            });
        }
        let present = fs::metadata(&segment.output_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !present {
            return Err(MediaError::OutputMissing(segment.output_path.clone()).into());
        }
    }
    Ok(())
}

/// Concat demuxer list for `paths`, one `file '...'` line each.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

/// Write the concat list for `segments` (absolute paths) to `list_path`.
pub fn write_concat_list(segments: &[VideoSegment], list_path: &Path) -> VideoResult<()> {
    let paths = segments
        .iter()
        .map(|s| {
            fs::canonicalize(&s.output_path)
                .map_err(|e| VideoError::io(format!("resolving {}", s.output_path.display()), e))
        })
        .collect::<VideoResult<Vec<_>>>()?;

    fs::write(list_path, concat_list(&paths))
        .map_err(|e| VideoError::io("writing concat list", e))
}
