//! Segment synthesizer.
//!
//! Each narration item becomes one still-image clip lasting exactly as long
//! as its audio. Clip lengths are planned in whole frames from the
//! cumulative audio timeline, so the joined video never drifts more than
//! half a frame from the joined audio.
//!
//! # Frame planning
//!
//! With `T_k` the end of item `k` on the audio timeline, the clip for item
//! `k` spans frames `round(T_{k-1} × fps)` up to `round(T_k × fps)`. A clip
//! is never shorter than one frame.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{VideoError, VideoResult};
use crate::config::VideoSettings;
use crate::models::{AudioAsset, FrameSpec};

/// Everything needed to render one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRequest {
    pub item_id: i64,
    pub image_path: PathBuf,
    pub output_path: PathBuf,
    /// Exact number of frames to render.
    pub frame_count: u64,
    pub frame: FrameSpec,
    /// Fade length, already clamped to half the clip.
    pub fade_seconds: f64,
    pub crf: u32,
    pub preset: String,
}

impl SegmentRequest {
    /// Length of the rendered clip.
    pub fn clip_seconds(&self) -> f64 {
        self.frame.duration_of(self.frame_count)
    }

    /// Scale to fit, pad to the frame, fade in and out.
    pub fn filter_graph(&self) -> String {
        let FrameSpec { width, height, fps } = self.frame;
        let mut filters = vec![
            format!("scale={width}:{height}:force_original_aspect_ratio=decrease"),
            format!("pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black"),
            "setsar=1".to_string(),
            format!("fps={fps}"),
            "format=yuv420p".to_string(),
        ];

        if self.fade_seconds > 0.0 {
            let fade = self.fade_seconds;
            let fade_out_start = (self.clip_seconds() - fade).max(0.0);
            filters.push(format!("fade=t=in:st=0:d={fade:.3}"));
            filters.push(format!("fade=t=out:st={fade_out_start:.3}:d={fade:.3}"));
        }

        filters.join(",")
    }

    /// ffmpeg arguments rendering this segment to `output`.
    pub fn ffmpeg_args(&self, output: &Path) -> Vec<String> {
        let fps = self.frame.fps.to_string();
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            fps.clone(),
            "-i".to_string(),
            self.image_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            self.filter_graph(),
            "-frames:v".to_string(),
            self.frame_count.to_string(),
            "-r".to_string(),
            fps,
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-an".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// SHA-256 over everything that determines the rendered bytes.
    ///
    /// Includes the source image's size and modification time, so editing
    /// an image in place invalidates its segments.
    pub fn fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct Inputs<'a> {
            image: &'a Path,
            image_len: Option<u64>,
            image_mtime_ns: Option<u128>,
            frame_count: u64,
            frame: FrameSpec,
            fade_ms: i64,
            crf: u32,
            preset: &'a str,
        }

        let meta = fs::metadata(&self.image_path).ok();
        let inputs = Inputs {
            image: &self.image_path,
            image_len: meta.as_ref().map(|m| m.len()),
            image_mtime_ns: meta
                .and_then(|m| m.modified().ok())
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_nanos()),
            frame_count: self.frame_count,
            frame: self.frame,
            fade_ms: (self.fade_seconds * 1000.0).round() as i64,
            crf: self.crf,
            preset: &self.preset,
        };

        let json = serde_json::to_string(&inputs).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Frame count of each clip, from item durations in order.
pub fn plan_frames(durations: &[f64], spec: &FrameSpec) -> Vec<u64> {
    let mut counts = Vec::with_capacity(durations.len());
    let mut elapsed = 0.0;
    let mut boundary = 0u64;

    for d in durations {
        elapsed += d;
        let next = spec.frame_at(elapsed).max(boundary + 1);
        counts.push(next - boundary);
        boundary = next;
    }
    counts
}

/// Usable images in `dir`, sorted by file name.
///
/// Files with other extensions are ignored; files whose header can't be
/// decoded are skipped with a warning.
pub fn list_images(dir: &Path, extensions: &[String]) -> VideoResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VideoError::ImagesDirMissing(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| VideoError::io("listing images", e))?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, extensions))
        .collect();
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let images: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|p| match readable_image(p) {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!("Skipping unreadable image {}: {}", p.display(), reason);
                false
            }
        })
        .collect();

    if images.is_empty() {
        return Err(VideoError::NoImages(dir.to_path_buf()));
    }
    Ok(images)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
}

fn readable_image(path: &Path) -> Result<(), String> {
    let reader = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| e.to_string())?;
    let (w, h) = reader.into_dimensions().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("image has no pixels".to_string());
    }
    Ok(())
}

/// Builds render requests for every item.
#[derive(Debug, Clone)]
pub struct SegmentPlanner {
    frame: FrameSpec,
    fade_seconds: f64,
    crf: u32,
    preset: String,
}

impl SegmentPlanner {
    pub fn from_settings(video: &VideoSettings) -> Self {
        Self {
            frame: video.frame_spec(),
            fade_seconds: video.fade_seconds,
            crf: video.crf,
            preset: video.preset.clone(),
        }
    }

    pub fn frame(&self) -> FrameSpec {
        self.frame
    }

    /// Output path of the segment for `item_id`.
    pub fn segment_path(work_dir: &Path, item_id: i64) -> PathBuf {
        work_dir.join(format!("seg_{:03}.mp4", item_id))
    }

    /// One request per audio asset, in order. Item `k` uses image `k mod n`.
    pub fn plan(
        &self,
        assets: &[AudioAsset],
        images: &[PathBuf],
        work_dir: &Path,
    ) -> VideoResult<Vec<SegmentRequest>> {
        if images.is_empty() {
            return Err(VideoError::NoImages(work_dir.to_path_buf()));
        }

        let durations: Vec<f64> = assets.iter().map(|a| a.duration_seconds).collect();
        let counts = plan_frames(&durations, &self.frame);

        let requests = assets
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(k, (asset, frame_count))| {
                let clip = self.frame.duration_of(frame_count);
                SegmentRequest {
                    item_id: asset.item_id,
                    image_path: images[k % images.len()].clone(),
                    output_path: Self::segment_path(work_dir, asset.item_id),
                    frame_count,
                    frame: self.frame,
                    fade_seconds: self.fade_seconds.min(clip / 2.0),
                    crf: self.crf,
                    preset: self.preset.clone(),
                }
            })
            .collect();
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFormat;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        VideoSettings::default().image_extensions
    }

    fn write_png(path: &Path) {
        image::RgbImage::new(8, 6).save(path).unwrap();
    }

    fn asset(id: i64, seconds: f64) -> AudioAsset {
        let fmt = AudioFormat::canonical();
        AudioAsset::new(id, PathBuf::from("x.wav"), &fmt, fmt.frames_for(seconds), false)
    }

    #[test]
    fn frames_follow_cumulative_timeline() {
        let spec = FrameSpec::default();
        // 1.01 + 1.01 + 1.01 at 30 fps: boundaries 30, 61, 91
        let counts = plan_frames(&[1.01, 1.01, 1.01], &spec);
        assert_eq!(counts, vec![30, 31, 30]);
        assert_eq!(counts.iter().sum::<u64>(), spec.frame_at(3.03));
    }

    #[test]
    fn total_never_drifts_past_half_frame() {
        let spec = FrameSpec::default();
        let durations: Vec<f64> = (0..200).map(|i| 0.7 + (i % 7) as f64 * 0.123).collect();
        let counts = plan_frames(&durations, &spec);
        let video = spec.duration_of(counts.iter().sum());
        let audio: f64 = durations.iter().sum();
        assert!((video - audio).abs() <= spec.frame_duration() / 2.0 + 1e-9);
    }

    #[test]
    fn tiny_items_still_get_a_frame() {
        let counts = plan_frames(&[0.001, 0.001, 1.0], &FrameSpec::default());
        assert_eq!(counts, vec![1, 1, 28]);
    }

    #[test]
    fn fade_is_clamped_to_half_clip() {
        let planner = SegmentPlanner::from_settings(&VideoSettings::default());
        let requests = planner
            .plan(
                &[asset(1, 2.0), asset(2, 0.6)],
                &[PathBuf::from("a.png")],
                Path::new("/w"),
            )
            .unwrap();
        assert_eq!(requests[0].fade_seconds, 0.5);
        assert!((requests[1].fade_seconds - 0.3).abs() < 1e-9);
    }

    #[test]
    fn images_are_assigned_cyclically() {
        let planner = SegmentPlanner::from_settings(&VideoSettings::default());
        let images = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let assets: Vec<AudioAsset> = (1..=5).map(|i| asset(i, 1.0)).collect();

        let requests = planner.plan(&assets, &images, Path::new("/w")).unwrap();
        let names: Vec<_> = requests
            .iter()
            .map(|r| r.image_path.to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "a.png", "b.png", "a.png"]);
        assert_eq!(requests[2].output_path, PathBuf::from("/w/seg_003.mp4"));
    }

    #[test]
    fn filter_graph_fades_out_at_clip_end() {
        let request = SegmentRequest {
            item_id: 1,
            image_path: PathBuf::from("a.png"),
            output_path: PathBuf::from("seg_001.mp4"),
            frame_count: 60,
            frame: FrameSpec::default(),
            fade_seconds: 0.5,
            crf: 20,
            preset: "veryfast".to_string(),
        };
        let graph = request.filter_graph();
        assert!(graph.starts_with("scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720"));
        assert!(graph.contains("fade=t=in:st=0:d=0.500"));
        assert!(graph.ends_with("fade=t=out:st=1.500:d=0.500"));

        let args = request.ffmpeg_args(Path::new("seg_001.mp4.part")).join(" ");
        assert!(args.contains("-frames:v 60"));
        assert!(args.contains("-c:v libx264 -preset veryfast -crf 20"));
    }

    #[test]
    fn zero_fade_has_no_fade_filters() {
        let mut settings = VideoSettings::default();
        settings.fade_seconds = 0.0;
        let planner = SegmentPlanner::from_settings(&settings);
        let requests = planner
            .plan(&[asset(1, 1.0)], &[PathBuf::from("a.png")], Path::new("/w"))
            .unwrap();
        assert!(!requests[0].filter_graph().contains("fade"));
    }

    #[test]
    fn fingerprint_tracks_render_inputs() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("a.png");
        write_png(&image);

        let planner = SegmentPlanner::from_settings(&VideoSettings::default());
        let a = planner
            .plan(&[asset(1, 2.0)], &[image.clone()], dir.path())
            .unwrap()
            .remove(0);
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let longer = SegmentRequest {
            frame_count: a.frame_count + 1,
            ..a.clone()
        };
        assert_ne!(a.fingerprint(), longer.fingerprint());
    }

    #[test]
    fn lists_images_sorted_and_skips_unreadable() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("b.png"));
        write_png(&dir.path().join("a.png"));
        fs::write(dir.path().join("c.jpg"), b"not really a jpeg").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let images = list_images(dir.path(), &exts()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn empty_directory_has_no_images() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            list_images(dir.path(), &exts()),
            Err(VideoError::NoImages(_))
        ));
        assert!(matches!(
            list_images(&dir.path().join("absent"), &exts()),
            Err(VideoError::ImagesDirMissing(_))
        ));
    }
}
