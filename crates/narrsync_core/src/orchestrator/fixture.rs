//! Test project on disk: narration file, audio and image directories, and
//! settings pointing at them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use super::types::Context;
use crate::config::Settings;
use crate::logging::{LogConfig, RunLogger};
use crate::media::fake::write_tone;
use crate::media::MediaToolkit;
use crate::models::AudioFormat;

pub(crate) const RUN: &str = "test_run";

pub(crate) struct Fixture {
    pub dir: TempDir,
    pub settings: Settings,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("audio")).unwrap();
        fs::create_dir_all(root.join("images")).unwrap();

        let path = |name: &str| root.join(name).to_string_lossy().to_string();
        let mut settings = Settings::default();
        settings.paths.narration_file = path("narration.json");
        settings.paths.audio_dir = path("audio");
        settings.paths.images_dir = path("images");
        settings.paths.output_file = path("out/final_video.mp4");
        settings.paths.temp_root = path(".temp");
        settings.paths.logs_folder = path(".logs");
        settings.pipeline.workers = 2;
        settings.pipeline.retries = 1;

        Self { dir, settings }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `{id, text}` records as the narration file.
    pub fn narration(&self, records: &[(i64, &str)]) {
        let json: Vec<_> = records
            .iter()
            .map(|(id, text)| serde_json::json!({ "id": id, "text": text }))
            .collect();
        self.narration_json(&serde_json::to_string(&json).unwrap());
    }

    pub fn narration_json(&self, json: &str) {
        fs::write(&self.settings.paths.narration_file, json).unwrap();
    }

    /// Canonical narration audio for `id`, `seconds` long.
    pub fn audio(&self, id: i64, seconds: f64) -> PathBuf {
        self.audio_in(id, &AudioFormat::canonical(), seconds)
    }

    pub fn audio_in(&self, id: i64, format: &AudioFormat, seconds: f64) -> PathBuf {
        let path = self.audio_path(id, "wav");
        write_tone(&path, format, format.frames_for(seconds));
        path
    }

    pub fn audio_path(&self, id: i64, ext: &str) -> PathBuf {
        Path::new(&self.settings.paths.audio_dir).join(format!("narration_{:02}.{}", id, ext))
    }

    /// `count` small PNG stills named `img_01.png`, `img_02.png`, ...
    pub fn images(&self, count: usize) {
        for i in 1..=count {
            let path = Path::new(&self.settings.paths.images_dir).join(format!("img_{:02}.png", i));
            image::RgbImage::new(16, 9).save(path).unwrap();
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        Path::new(&self.settings.paths.temp_root).join(RUN)
    }

    pub fn output_path(&self) -> PathBuf {
        self.settings.paths.output_path()
    }

    pub fn logger(&self) -> Arc<RunLogger> {
        Arc::new(RunLogger::tracing_only(
            RUN,
            LogConfig {
                mirror_to_tracing: false,
                ..LogConfig::default()
            },
        ))
    }

    pub fn context(&self, toolkit: Arc<dyn MediaToolkit>) -> Context {
        let work_dir = self.work_dir();
        fs::create_dir_all(&work_dir).unwrap();
        Context::new(self.settings.clone(), RUN, work_dir, self.logger(), toolkit)
    }
}
