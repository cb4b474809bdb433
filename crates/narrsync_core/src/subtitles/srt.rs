//! SRT subtitle writer.
//!
//! # Timing Precision
//!
//! SRT uses millisecond timing (HH:MM:SS,mmm). Cue times are rounded to
//! the nearest millisecond at write time; a rounded end is then pulled back
//! to the next cue's rounded start if rounding pushed it past.

use std::fs;
use std::io;
use std::path::Path;

use crate::models::SubtitleCue;

/// Write cues to SRT format string.
pub fn write_srt(cues: &[SubtitleCue]) -> String {
    let starts: Vec<u64> = cues.iter().map(|c| to_ms(c.start_seconds)).collect();
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        let start = starts[i];
        let mut end = to_ms(cue.end_seconds).max(start);
        if let Some(&next) = starts.get(i + 1) {
            end = end.min(next.max(start));
        }

        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(start),
            format_srt_time(end)
        ));
        output.push_str(&cue.text);
        output.push('\n');
    }

    output
}

/// Write cues to an SRT file (UTF-8).
pub fn write_srt_file(cues: &[SubtitleCue], path: &Path) -> io::Result<()> {
    fs::write(path, write_srt(cues))
}

/// Format milliseconds as SRT timestamp (HH:MM:SS,mmm).
pub fn format_srt_time(ms: u64) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

fn to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(index: usize, start: f64, end: f64, text: &str) -> SubtitleCue {
        SubtitleCue {
            index,
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
        }
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_srt_time(0), "00:00:00,000");
        assert_eq!(format_srt_time(1500), "00:00:01,500");
        assert_eq!(format_srt_time(60_000), "00:01:00,000");
        assert_eq!(format_srt_time(3_723_004), "01:02:03,004");
    }

    #[test]
    fn writes_basic_srt() {
        let cues = vec![
            cue(1, 0.0, 1.96, "Hello, world!"),
            cue(2, 2.0, 5.46, "Two\nlines"),
        ];
        let expected = "1\n00:00:00,000 --> 00:00:01,960\nHello, world!\n\n2\n00:00:02,000 --> 00:00:05,460\nTwo\nlines\n";
        assert_eq!(write_srt(&cues), expected);
    }

    #[test]
    fn rounding_never_overlaps_next_cue() {
        // end 1.0004 would round to 1.000, start 1.0006 rounds to 1.001: fine.
        // end 1.0016 rounds to 1.002 but next start 1.0014 rounds to 1.001.
        let cues = vec![cue(1, 0.0, 1.0016, "a"), cue(2, 1.0014, 2.0, "b")];
        let out = write_srt(&cues);
        assert!(out.contains("00:00:00,000 --> 00:00:01,001"));
        assert!(out.contains("00:00:01,001 --> 00:00:02,000"));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.srt");
        write_srt_file(&[cue(1, 0.0, 1.0, "x")], &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("1\n00:00:00,000"));
    }
}
