//! Test double for [`MediaToolkit`] that needs no native tools.
//!
//! Audio is handled with `hound` for real, so durations flow through the
//! pipeline exactly as they would with ffmpeg. Video outputs are small text
//! files describing what would have been rendered.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use hound::{WavReader, WavWriter};
use parking_lot::Mutex;

use super::error::{MediaError, MediaResult};
use super::wav;
use super::{MediaToolkit, OpReport};
use crate::models::AudioFormat;
use crate::mux::MuxRequest;
use crate::video::SegmentRequest;

/// Write a tone of `frames` frames in `format` (integer formats only).
pub(crate) fn write_tone(path: &Path, format: &AudioFormat, frames: u64) {
    let mut writer = WavWriter::create(path, format.wav_spec()).unwrap();
    for i in 0..frames {
        let v = ((i % 100) as i32 - 50) * 100;
        for _ in 0..format.channels {
            writer.write_sample(v).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// In-process stand-in for ffmpeg.
#[derive(Default)]
pub(crate) struct FakeToolkit {
    /// Tool reported as missing by `check_available`.
    missing_tool: Option<String>,
    /// Remaining injected failures keyed by input/output file name.
    failures: Mutex<HashMap<String, u32>>,
    /// Every operation, in call order.
    calls: Mutex<Vec<String>>,
    segments: Mutex<Vec<SegmentRequest>>,
    muxes: Mutex<Vec<MuxRequest>>,
}

impl FakeToolkit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn without_tool(tool: &str) -> Self {
        Self {
            missing_tool: Some(tool.to_string()),
            ..Self::default()
        }
    }

    /// Fail the next `times` operations touching a file named `file_name`.
    pub(crate) fn fail_on(self, file_name: &str, times: u32) -> Self {
        self.failures.lock().insert(file_name.to_string(), times);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(op))
            .count()
    }

    pub(crate) fn segments(&self) -> Vec<SegmentRequest> {
        let mut segments = self.segments.lock().clone();
        segments.sort_by_key(|s| s.item_id);
        segments
    }

    pub(crate) fn muxes(&self) -> Vec<MuxRequest> {
        self.muxes.lock().clone()
    }

    fn record(&self, op: &str, path: &Path) -> MediaResult<()> {
        let name = file_name(path);
        self.calls.lock().push(format!("{} {}", op, name));

        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MediaError::CommandFailed {
                    tool: "fake".to_string(),
                    exit_code: 1,
                    message: format!("injected failure for {}", name),
                    stderr: format!("injected failure for {}", name),
                });
            }
        }
        Ok(())
    }
}

impl MediaToolkit for FakeToolkit {
    fn name(&self) -> &str {
        "fake"
    }

    fn check_available(&self) -> MediaResult<()> {
        match &self.missing_tool {
            Some(tool) => Err(MediaError::ToolNotFound(tool.clone())),
            None => Ok(()),
        }
    }

    /// Resample by frame count only: sample values are copied when the
    /// formats already match and zeroed otherwise.
    fn normalize_audio(
        &self,
        input: &Path,
        output: &Path,
        format: &AudioFormat,
    ) -> MediaResult<OpReport> {
        self.record("normalize", input)?;

        let reader = WavReader::open(input).map_err(|e| MediaError::CommandFailed {
            tool: "fake".to_string(),
            exit_code: 1,
            message: format!("Invalid data found when processing input: {}", e),
            stderr: String::new(),
        })?;
        let source: AudioFormat = reader.spec().into();
        drop(reader);

        if source == *format {
            fs::copy(input, output).map_err(|e| MediaError::io("copying audio", e))?;
        } else {
            let info = wav::read_info(input)?;
            let frames = format.frames_for(info.duration_seconds());
            wav::write_silence(output, format, frames)?;
        }
        Ok(OpReport::default())
    }

    fn probe_duration(&self, input: &Path) -> MediaResult<Option<f64>> {
        self.record("probe", input)?;
        Ok(wav::read_info(input).ok().map(|info| info.duration_seconds()))
    }

    fn render_segment(&self, request: &SegmentRequest) -> MediaResult<OpReport> {
        self.record("render", &request.output_path)?;
        let body = format!(
            "segment item={} frames={} spec={} image={}\n",
            request.item_id,
            request.frame_count,
            request.frame,
            request.image_path.display()
        );
        fs::write(&request.output_path, body).map_err(|e| MediaError::io("writing segment", e))?;
        self.segments.lock().push(request.clone());
        Ok(OpReport::default())
    }

    /// Joins the listed files' bytes.
    fn concat_video(&self, list_file: &Path, output: &Path) -> MediaResult<OpReport> {
        self.record("concat", output)?;
        let list =
            fs::read_to_string(list_file).map_err(|e| MediaError::io("reading concat list", e))?;

        let mut joined = Vec::new();
        for line in list.lines() {
            let Some(rest) = line.strip_prefix("file '") else {
                continue;
            };
            let path = rest.trim_end_matches('\'').replace("'\\''", "'");
            let bytes = fs::read(&path).map_err(|e| MediaError::io("reading segment", e))?;
            joined.extend_from_slice(&bytes);
        }
        fs::write(output, joined).map_err(|e| MediaError::io("writing video", e))?;
        Ok(OpReport::default())
    }

    fn mux(&self, request: &MuxRequest) -> MediaResult<OpReport> {
        self.record("mux", &request.output)?;
        if let Some(parent) = request.output.parent() {
            fs::create_dir_all(parent).map_err(|e| MediaError::io("creating output dir", e))?;
        }
        fs::write(&request.output, b"muxed").map_err(|e| MediaError::io("writing output", e))?;
        self.muxes.lock().push(request.clone());
        Ok(OpReport::default())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
