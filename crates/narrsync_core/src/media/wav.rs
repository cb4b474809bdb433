//! In-process WAV handling with `hound`.
//!
//! Used wherever sample-exact control matters: reading the frame count of a
//! normalized chunk, writing silence of an exact length and appending chunks
//! without re-encoding.

use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use hound::{WavReader, WavWriter};

use super::error::{MediaError, MediaResult};
use crate::models::{AudioFormat, SampleFormat};

/// Format and length of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub format: AudioFormat,
    /// Sample frames (samples per channel).
    pub frames: u64,
}

impl WavInfo {
    /// Exact duration (frames / sample rate).
    pub fn duration_seconds(&self) -> f64 {
        self.format.duration_of(self.frames)
    }
}

/// Read the header of a WAV file.
pub fn read_info(path: &Path) -> MediaResult<WavInfo> {
    let reader = WavReader::open(path).map_err(|e| MediaError::wav(path, e))?;
    Ok(WavInfo {
        format: reader.spec().into(),
        frames: u64::from(reader.duration()),
    })
}

/// Write `frames` frames of digital silence in `format`.
///
/// The file is written next to `path` under a `.part` name and renamed into
/// place, so an interrupted write never leaves a truncated chunk behind.
pub fn write_silence(path: &Path, format: &AudioFormat, frames: u64) -> MediaResult<()> {
    let part = part_path(path);
    let mut writer =
        WavWriter::create(&part, format.wav_spec()).map_err(|e| MediaError::wav(&part, e))?;

    let samples = frames * u64::from(format.channels);
    match format.sample_format {
        SampleFormat::Int => {
            for _ in 0..samples {
                writer.write_sample(0i32).map_err(|e| MediaError::wav(&part, e))?;
            }
        }
        SampleFormat::Float => {
            for _ in 0..samples {
                writer.write_sample(0.0f32).map_err(|e| MediaError::wav(&part, e))?;
            }
        }
    }
    writer.finalize().map_err(|e| MediaError::wav(&part, e))?;

    fs::rename(&part, path)
        .map_err(|e| MediaError::io(format!("renaming {}", part.display()), e))?;
    Ok(())
}

/// Append every sample of `source` to `writer`, returning frames copied.
///
/// The caller is responsible for checking that the formats agree; samples
/// are copied verbatim.
pub fn append_samples<W: Write + Seek>(
    source: &Path,
    writer: &mut WavWriter<W>,
    destination: &Path,
) -> MediaResult<u64> {
    let mut reader = WavReader::open(source).map_err(|e| MediaError::wav(source, e))?;
    let spec = reader.spec();
    let mut samples: u64 = 0;

    match spec.sample_format {
        hound::SampleFormat::Int => {
            for sample in reader.samples::<i32>() {
                let sample = sample.map_err(|e| MediaError::wav(source, e))?;
                writer
                    .write_sample(sample)
                    .map_err(|e| MediaError::wav(destination, e))?;
                samples += 1;
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                let sample = sample.map_err(|e| MediaError::wav(source, e))?;
                writer
                    .write_sample(sample)
                    .map_err(|e| MediaError::wav(destination, e))?;
                samples += 1;
            }
        }
    }

    Ok(samples / u64::from(spec.channels.max(1)))
}

/// Temporary sibling used while a file is being written.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::write_tone;
    use tempfile::tempdir;

    #[test]
    fn silence_has_exact_frame_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("silence_002.wav");
        let fmt = AudioFormat::canonical();

        write_silence(&path, &fmt, fmt.frames_for(1.5)).unwrap();

        let info = read_info(&path).unwrap();
        assert_eq!(info.frames, 66_150);
        assert_eq!(info.format, fmt);
        assert_eq!(info.duration_seconds(), 1.5);
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn silence_is_all_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.wav");
        write_silence(&path, &AudioFormat::canonical(), 10).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        assert!(reader.samples::<i32>().all(|s| s.unwrap() == 0));
    }

    #[test]
    fn append_copies_all_frames() {
        let dir = tempdir().unwrap();
        let fmt = AudioFormat::canonical();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_tone(&a, &fmt, 300);
        write_tone(&b, &fmt, 150);

        let out = dir.path().join("out.wav");
        let mut writer = WavWriter::create(&out, fmt.wav_spec()).unwrap();
        assert_eq!(append_samples(&a, &mut writer, &out).unwrap(), 300);
        assert_eq!(append_samples(&b, &mut writer, &out).unwrap(), 150);
        writer.finalize().unwrap();

        assert_eq!(read_info(&out).unwrap().frames, 450);
    }

    #[test]
    fn read_info_rejects_non_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        fs::write(&path, b"not a wav file at all").unwrap();
        assert!(matches!(read_info(&path), Err(MediaError::Wav { .. })));
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/run/seg_001.mp4")),
            PathBuf::from("/tmp/run/seg_001.mp4.part")
        );
    }
}
