//! Core types for the orchestrator pipeline.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::{get_estimator, AudioResolver, PlaceholderEstimator};
use crate::config::Settings;
use crate::logging::RunLogger;
use crate::media::MediaToolkit;
use crate::models::{AudioAsset, NarrationItem, SubtitleCue, VideoSegment};
use crate::video::SegmentPlanner;

/// Read-only context passed to pipeline steps.
///
/// Contains run configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `RunState`.
pub struct Context {
    /// Application settings.
    pub settings: Settings,
    /// Run name/identifier.
    pub run_name: String,
    /// Run-specific scratch directory (under temp_root).
    pub work_dir: PathBuf,
    /// Final deliverable path.
    pub output_path: PathBuf,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    /// Media operations.
    pub toolkit: Arc<dyn MediaToolkit>,
    /// Sizes silence for items without audio.
    pub estimator: Box<dyn PlaceholderEstimator>,
    /// Manifest left by an earlier run in the same scratch directory.
    pub previous: Option<RunState>,
}

impl Context {
    /// Create a new context for a run.
    pub fn new(
        settings: Settings,
        run_name: impl Into<String>,
        work_dir: PathBuf,
        logger: Arc<RunLogger>,
        toolkit: Arc<dyn MediaToolkit>,
    ) -> Self {
        let estimator = get_estimator(
            settings.pipeline.placeholder_policy,
            settings.pipeline.fallback_duration_secs,
        );
        Self {
            output_path: settings.paths.output_path(),
            settings,
            run_name: run_name.into(),
            work_dir,
            logger,
            toolkit,
            estimator,
            previous: None,
        }
    }

    /// Replace the placeholder estimator.
    pub fn with_estimator(mut self, estimator: Box<dyn PlaceholderEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Attach the manifest of an earlier run.
    pub fn with_previous(mut self, previous: Option<RunState>) -> Self {
        self.previous = previous;
        self
    }

    pub fn narration_path(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.narration_file)
    }

    pub fn images_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.images_dir)
    }

    pub fn resolver(&self) -> AudioResolver {
        AudioResolver::from_settings(&self.settings.paths, &self.settings.audio)
    }

    pub fn segment_planner(&self) -> SegmentPlanner {
        SegmentPlanner::from_settings(&self.settings.video)
    }

    /// Normalized narration chunk for an item.
    pub fn normalized_path(&self, item_id: i64) -> PathBuf {
        self.work_dir.join(format!("norm_{:03}.wav", item_id))
    }

    /// Placeholder silence chunk for an item.
    pub fn silence_path(&self, item_id: i64) -> PathBuf {
        self.work_dir.join(format!("silence_{:03}.wav", item_id))
    }

    pub fn merged_audio_path(&self) -> PathBuf {
        self.work_dir.join("narration_merged.wav")
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.work_dir.join("segments.txt")
    }

    pub fn concat_video_path(&self) -> PathBuf {
        self.work_dir.join("video_concat.mp4")
    }

    pub fn captions_path(&self) -> PathBuf {
        self.work_dir.join("captions.srt")
    }

    pub fn manifest_path(&self) -> PathBuf {
        manifest_path(&self.work_dir)
    }

    /// Fingerprints of segments recorded by the previous run, by item id.
    pub fn previous_fingerprints(&self) -> HashMap<i64, String> {
        self.previous
            .iter()
            .flat_map(|p| p.segments.iter())
            .filter(|s| !s.fingerprint.is_empty())
            .map(|s| (s.item_id, s.fingerprint.clone()))
            .collect()
    }
}

/// Location of the manifest inside a scratch directory.
pub fn manifest_path(work_dir: &Path) -> PathBuf {
    work_dir.join("manifest.json")
}

/// Result of a step execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (with reason).
    Skipped(String),
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// This is the "write-once manifest": steps add their own section and never
/// overwrite another step's. It is saved as `manifest.json` in the scratch
/// directory so a re-run can reuse unchanged work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Run name.
    pub run_name: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Loaded narration items, in order.
    #[serde(default)]
    pub items: Vec<NarrationItem>,
    /// Narration records that were skipped while loading.
    #[serde(default)]
    pub skipped_records: usize,
    /// Usable still images, sorted by file name.
    #[serde(default)]
    pub images: Vec<PathBuf>,
    /// One canonical chunk per item, in item order.
    #[serde(default)]
    pub audio: Vec<AudioAsset>,
    /// Placeholder duration used for missing items (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_seconds: Option<f64>,
    /// One rendered segment per item, in item order.
    #[serde(default)]
    pub segments: Vec<VideoSegment>,
    /// Joined narration track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_audio: Option<MergedAudio>,
    /// Joined silent video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat_video: Option<PathBuf>,
    /// One cue per item, in item order.
    #[serde(default)]
    pub cues: Vec<SubtitleCue>,
    /// Written SRT file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captions: Option<PathBuf>,
    /// Final deliverable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<MuxOutput>,
}

impl RunState {
    /// Create a new run state with the given name.
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Durations of the items' audio, in order.
    pub fn durations(&self) -> Vec<f64> {
        self.audio.iter().map(|a| a.duration_seconds).collect()
    }

    /// Total narration length.
    pub fn total_duration(&self) -> f64 {
        match &self.merged_audio {
            Some(merged) => merged.duration_seconds,
            None => self.durations().iter().sum(),
        }
    }

    /// Ids of items that got placeholder silence.
    pub fn placeholder_ids(&self) -> Vec<i64> {
        self.audio
            .iter()
            .filter(|a| a.is_placeholder)
            .map(|a| a.item_id)
            .collect()
    }

    /// Save as pretty JSON, atomically.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let temp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, path)
    }

    /// Load a saved manifest; `None` if absent or unreadable.
    pub fn load(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Output of the audio concatenation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedAudio {
    pub path: PathBuf,
    pub frames: u64,
    pub duration_seconds: f64,
}

/// Output of the mux step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxOutput {
    pub path: PathBuf,
    pub size_bytes: u64,
}
