//! [`MediaToolkit`] backed by the native `ffmpeg` and `ffprobe` binaries.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::error::{MediaError, MediaResult};
use super::runner::{format_command, run_tool};
use super::tools::ToolPaths;
use super::wav::part_path;
use super::{MediaToolkit, OpReport};
use crate::audio::normalizer::normalize_args;
use crate::models::AudioFormat;
use crate::mux::{MuxArgsBuilder, MuxRequest};
use crate::video::SegmentRequest;

/// Media toolkit that shells out to ffmpeg/ffprobe.
///
/// Every output is written under a `.part` name and renamed on success, so a
/// killed process never leaves a file that a later run would reuse.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolkit {
    tools: ToolPaths,
}

impl FfmpegToolkit {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    fn ffmpeg(&self, args: Vec<String>) -> MediaResult<OpReport> {
        let output = run_tool("ffmpeg", &self.tools.ffmpeg, &args)?;
        Ok(OpReport {
            command: Some(format_command(&self.tools.ffmpeg, &args)),
            output: output.stderr,
        })
    }

    /// Run ffmpeg writing to a `.part` sibling of `output`, then move it into place.
    fn ffmpeg_to(
        &self,
        output: &Path,
        build: impl FnOnce(&Path) -> Vec<String>,
    ) -> MediaResult<OpReport> {
        let part = part_path(output);
        let report = match self.ffmpeg(build(&part)) {
            Ok(report) => report,
            Err(e) => {
                let _ = fs::remove_file(&part);
                return Err(e);
            }
        };

        ensure_non_empty(&part)?;
        fs::rename(&part, output)
            .map_err(|e| MediaError::io(format!("renaming {}", part.display()), e))?;
        Ok(report)
    }
}

impl MediaToolkit for FfmpegToolkit {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn check_available(&self) -> MediaResult<()> {
        let version = vec!["-version".to_string()];
        run_tool("ffmpeg", &self.tools.ffmpeg, &version)?;
        run_tool("ffprobe", &self.tools.ffprobe, &version)?;
        Ok(())
    }

    fn normalize_audio(
        &self,
        input: &Path,
        output: &Path,
        format: &AudioFormat,
    ) -> MediaResult<OpReport> {
        self.ffmpeg_to(output, |dest| normalize_args(input, dest, format))
    }

    fn probe_duration(&self, input: &Path) -> MediaResult<Option<f64>> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "json".to_string(),
            input.to_string_lossy().to_string(),
        ];
        let output = run_tool("ffprobe", &self.tools.ffprobe, &args)?;
        parse_probe_duration(&output.stdout)
    }

    fn render_segment(&self, request: &SegmentRequest) -> MediaResult<OpReport> {
        self.ffmpeg_to(&request.output_path, |dest| request.ffmpeg_args(dest))
    }

    fn concat_video(&self, list_file: &Path, output: &Path) -> MediaResult<OpReport> {
        self.ffmpeg_to(output, |dest| concat_args(list_file, dest))
    }

    fn mux(&self, request: &MuxRequest) -> MediaResult<OpReport> {
        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| MediaError::io("creating output directory", e))?;
            }
        }
        self.ffmpeg_to(&request.output, |dest| MuxArgsBuilder::new(request).build(dest))
    }
}

/// Stream-copy concatenation through the concat demuxer.
fn concat_args(list_file: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_file.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Parse `ffprobe -show_entries format=duration -of json` output.
///
/// A missing or `N/A` duration is `None`, not an error.
fn parse_probe_duration(stdout: &str) -> MediaResult<Option<f64>> {
    let json: Value = serde_json::from_str(stdout).map_err(|e| MediaError::ParseError {
        tool: "ffprobe".to_string(),
        message: e.to_string(),
    })?;

    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| match d {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(duration)
}

fn ensure_non_empty(path: &Path) -> MediaResult<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(MediaError::OutputMissing(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_string_duration() {
        let out = r#"{"format": {"duration": "12.345000"}}"#;
        assert_eq!(parse_probe_duration(out).unwrap(), Some(12.345));
    }

    #[test]
    fn na_duration_is_none() {
        let out = r#"{"format": {"duration": "N/A"}}"#;
        assert_eq!(parse_probe_duration(out).unwrap(), None);
        assert_eq!(parse_probe_duration(r#"{"format": {}}"#).unwrap(), None);
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(
            parse_probe_duration("not json"),
            Err(MediaError::ParseError { .. })
        ));
    }

    #[test]
    fn concat_is_stream_copy() {
        let args = concat_args(Path::new("/w/segments.txt"), Path::new("/w/video.mp4.part"));
        let joined = args.join(" ");
        assert!(joined.contains("-f concat -safe 0 -i /w/segments.txt"));
        assert!(joined.contains("-c copy"));
        assert_eq!(args.last().unwrap(), "/w/video.mp4.part");
    }

    #[test]
    fn missing_binary_reports_tool_not_found() {
        let toolkit = FfmpegToolkit::new(ToolPaths {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe"),
        });
        let err = toolkit.check_available().unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn ensure_non_empty_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mp4");
        fs::write(&path, b"").unwrap();
        assert!(matches!(
            ensure_non_empty(&path),
            Err(MediaError::OutputMissing(_))
        ));
    }
}
