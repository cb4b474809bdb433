//! Subtitle timeline builder.

use crate::config::SubtitleSettings;
use crate::models::{NarrationItem, SubtitleCue};

/// Cue timing and layout options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineOptions {
    /// Time left blank before the next cue (clamped per item to `[0, d]`).
    pub gap_seconds: f64,
    /// Maximum characters per line.
    pub wrap_width: usize,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            gap_seconds: 0.04,
            wrap_width: 50,
        }
    }
}

impl From<&SubtitleSettings> for TimelineOptions {
    fn from(settings: &SubtitleSettings) -> Self {
        Self {
            gap_seconds: settings.gap_seconds,
            wrap_width: settings.wrap_width,
        }
    }
}

/// Build one cue per item from the item durations, in order.
///
/// `items` and `durations` are parallel; extra entries in the longer one
/// are ignored.
pub fn build_cues(
    items: &[NarrationItem],
    durations: &[f64],
    options: &TimelineOptions,
) -> Vec<SubtitleCue> {
    let mut cursor = 0.0;
    items
        .iter()
        .zip(durations)
        .enumerate()
        .map(|(i, (item, &d))| {
            let d = d.max(0.0);
            let gap = options.gap_seconds.clamp(0.0, d);
            let cue = SubtitleCue {
                index: i + 1,
                start_seconds: cursor,
                end_seconds: cursor + d - gap,
                text: wrap_text(&item.text, options.wrap_width),
            };
            cursor += d;
            cue
        })
        .collect()
}

/// Greedy word wrap to `width` characters; lines are joined with `\n`.
///
/// Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        for piece in split_long(word, width) {
            let needed = if line.is_empty() {
                piece.chars().count()
            } else {
                line.chars().count() + 1 + piece.chars().count()
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&piece);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

fn split_long(word: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<NarrationItem> {
        (1..=n)
            .map(|i| NarrationItem::new(i as i64, format!("Beat {}", i)))
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn three_item_scenario() {
        let cues = build_cues(&items(3), &[2.0, 3.5, 1.0], &TimelineOptions::default());
        let times: Vec<(f64, f64)> = cues
            .iter()
            .map(|c| (c.start_seconds, c.end_seconds))
            .collect();

        let expected = [(0.0, 1.96), (2.0, 5.46), (5.5, 6.46)];
        for ((s, e), (es, ee)) in times.iter().zip(expected) {
            assert!(close(*s, es) && close(*e, ee), "got {:?}", times);
        }
        assert_eq!(cues.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn cues_never_overlap() {
        let durations = [0.01, 0.5, 0.02, 3.0, 0.0];
        let cues = build_cues(&items(5), &durations, &TimelineOptions::default());
        for pair in cues.windows(2) {
            assert!(pair[0].end_seconds <= pair[1].start_seconds);
            assert!(pair[0].start_seconds <= pair[0].end_seconds);
        }
        // gap clamped to the duration: zero-length cue, not negative
        assert!(close(cues[0].duration(), 0.0));
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(
            wrap_text(text, 15),
            "The quick brown\nfox jumps over\nthe lazy dog"
        );
        assert_eq!(wrap_text("short", 50), "short");
    }

    #[test]
    fn splits_words_longer_than_width() {
        assert_eq!(wrap_text("abcdefghij xy", 4), "abcd\nefgh\nij\nxy");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(wrap_text("  a \n b\tc  ", 50), "a b c");
    }
}
