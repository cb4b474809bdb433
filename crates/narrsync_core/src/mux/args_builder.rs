//! ffmpeg argument builder for the final mux.
//!
//! Builds the token list for one ffmpeg invocation that:
//!
//! - reads the silent video (input 0) and the narration track (input 1)
//! - burns the SRT into the frames with the `subtitles` filter
//! - re-encodes video with libx264 and audio to AAC
//! - stops at the shorter of the two streams (`-shortest`)

use std::path::Path;

use super::MuxRequest;

/// Builder for mux command-line arguments.
pub struct MuxArgsBuilder<'a> {
    request: &'a MuxRequest,
}

impl<'a> MuxArgsBuilder<'a> {
    pub fn new(request: &'a MuxRequest) -> Self {
        Self { request }
    }

    /// Build the complete argument list, writing to `output`.
    pub fn build(&self, output: &Path) -> Vec<String> {
        let mut tokens = Vec::new();

        self.add_global_options(&mut tokens);
        self.add_inputs(&mut tokens);

        tokens.push("-vf".to_string());
        tokens.push(self.subtitle_filter());

        self.add_stream_options(&mut tokens);

        tokens.push("-f".to_string());
        tokens.push("mp4".to_string());
        tokens.push(output.to_string_lossy().to_string());

        tokens
    }

    /// `subtitles='<path>':force_style='<style>'`
    pub fn subtitle_filter(&self) -> String {
        format!(
            "subtitles='{}':force_style='{}'",
            escape_filter_path(&self.request.subtitles),
            self.request.style.force_style()
        )
    }

    fn add_global_options(&self, tokens: &mut Vec<String>) {
        for t in ["-y", "-hide_banner", "-loglevel", "error"] {
            tokens.push(t.to_string());
        }
    }

    fn add_inputs(&self, tokens: &mut Vec<String>) {
        tokens.push("-i".to_string());
        tokens.push(self.request.video.to_string_lossy().to_string());
        tokens.push("-i".to_string());
        tokens.push(self.request.audio.to_string_lossy().to_string());
    }

    fn add_stream_options(&self, tokens: &mut Vec<String>) {
        let r = self.request;
        let options = [
            ("-map", "0:v:0".to_string()),
            ("-map", "1:a:0".to_string()),
            ("-c:v", "libx264".to_string()),
            ("-preset", r.preset.clone()),
            ("-crf", r.crf.to_string()),
            ("-pix_fmt", "yuv420p".to_string()),
            ("-c:a", "aac".to_string()),
            ("-b:a", r.audio_bitrate.clone()),
            ("-movflags", "+faststart".to_string()),
        ];
        for (flag, value) in options {
            tokens.push(flag.to_string());
            tokens.push(value);
        }
        tokens.push("-shortest".to_string());
    }
}

/// Escape a path for use inside a quoted filter option value.
///
/// The value is unescaped twice by ffmpeg: once by the filtergraph parser
/// and once by the filter option parser. Inside the quotes `:` only needs
/// the option-level backslash. A `'` closes the quote, emits `\\\'` (which
/// the graph level turns into `\'` and the option level into `'`) and
/// reopens it. Backslashes become forward slashes.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\\\\\''")
}

/// Format tokens for pretty display (one option per line).
pub fn format_args_pretty(tokens: &[String]) -> String {
    let mut result = String::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.starts_with('-') && i + 1 < tokens.len() && !tokens[i + 1].starts_with('-') {
            result.push_str(&format!("{} {} \\\n", token, tokens[i + 1]));
            i += 2;
        } else {
            result.push_str(&format!("{} \\\n", token));
            i += 1;
        }
    }

    result
}
