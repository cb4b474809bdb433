//! Audio resolver: maps items to narration files on disk.

use std::path::{Path, PathBuf};

use crate::config::{AudioSettings, PathSettings};
use crate::models::NarrationItem;

/// Outcome of looking up one item's narration audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    Missing,
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Found(p) => Some(p),
            Resolution::Missing => None,
        }
    }
}

/// Looks up `<prefix><id, zero-padded>.<ext>` in the audio directory.
///
/// Extensions are tried in configured order; the first existing file wins.
#[derive(Debug, Clone)]
pub struct AudioResolver {
    dir: PathBuf,
    prefix: String,
    id_width: usize,
    extensions: Vec<String>,
}

impl AudioResolver {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        id_width: usize,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            id_width,
            extensions,
        }
    }

    pub fn from_settings(paths: &PathSettings, audio: &AudioSettings) -> Self {
        Self::new(
            &paths.audio_dir,
            &audio.file_prefix,
            audio.id_width,
            audio.extensions.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File stem for an item id, e.g. `narration_07`.
    pub fn stem(&self, id: i64) -> String {
        format!("{}{:0width$}", self.prefix, id, width = self.id_width)
    }

    /// Paths tried for `id`, in order.
    pub fn candidates(&self, id: i64) -> Vec<PathBuf> {
        let stem = self.stem(id);
        self.extensions
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", stem, ext.trim_start_matches('.'))))
            .collect()
    }

    /// Find the item's audio. Never fails; absent files are `Missing`.
    pub fn resolve(&self, item: &NarrationItem) -> Resolution {
        self.candidates(item.id)
            .into_iter()
            .find(|p| p.is_file())
            .map(Resolution::Found)
            .unwrap_or(Resolution::Missing)
    }
}
