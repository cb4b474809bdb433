//! Locating the native media tools.

use std::path::Path;
use std::path::PathBuf;

/// Resolved paths of the tools the ffmpeg toolkit drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Use tools from a specific directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            ffmpeg: dir.join(exe_name("ffmpeg")),
            ffprobe: dir.join(exe_name("ffprobe")),
        }
    }

    /// Tools from the configured directory, or from PATH when it is blank.
    pub fn from_setting(tools_dir: &str) -> Self {
        let dir = tools_dir.trim();
        if dir.is_empty() {
            Self::default()
        } else {
            Self::in_dir(Path::new(dir))
        }
    }
}

impl Default for ToolPaths {
    /// Bare tool names, resolved through PATH when spawned.
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(exe_name("ffmpeg")),
            ffprobe: PathBuf::from(exe_name("ffprobe")),
        }
    }
}

fn exe_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}
