//! Deterministic export pipeline.
//!
//! Frames are rendered on a frame-indexed clock (`t = frame / fps`) rather
//! than a live one, so repeated runs on the same inputs produce
//! byte-identical frame sequences. Video is encoded to a temporary
//! video-only file, the audio track is prepared as a temporary PCM WAV, and
//! an external mux combines them into the final container. Both temp files
//! are removed on success and on failure.

pub mod encoder;
pub mod mux;

use std::path::{Path, PathBuf};

use chrono::Local;
use directories::UserDirs;
use serde::{Deserialize, Serialize};

use crate::audio::{pcm, DecodedAudio};
use crate::render::Composer;
use crate::{Error, Result};

use encoder::VideoEncoder;

/// Export frame rate. Fixed.
pub const EXPORT_FPS: u32 = 30;

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mp4,
    Avi,
    Mkv,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Avi => "avi",
            ContainerFormat::Mkv => "mkv",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp4" => Some(ContainerFormat::Mp4),
            "avi" => Some(ContainerFormat::Avi),
            "mkv" => Some(ContainerFormat::Mkv),
            _ => None,
        }
    }
}

/// Quality tier, mapped to libx264 CRF. Lower CRF is higher fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityTier {
    pub fn crf(&self) -> u32 {
        match self {
            QualityTier::High => 18,
            QualityTier::Medium => 23,
            QualityTier::Low => 28,
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityTier::Low),
            "medium" => Some(QualityTier::Medium),
            "high" => Some(QualityTier::High),
            _ => None,
        }
    }
}

/// One export run. Owns its temp files for the duration of the call.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub output_path: PathBuf,
    pub format: ContainerFormat,
    pub quality: QualityTier,
    pub fps: u32,
}

impl ExportJob {
    pub fn new(output_path: PathBuf, format: ContainerFormat, quality: QualityTier) -> Self {
        Self {
            output_path,
            format,
            quality,
            fps: EXPORT_FPS,
        }
    }
}

/// Number of frames for the given duration: `floor(duration * fps)`.
pub fn total_frames(duration_secs: f64, fps: u32) -> u64 {
    (duration_secs * fps as f64).floor().max(0.0) as u64
}

/// Presentation time of a frame on the deterministic clock.
pub fn frame_time(frame_index: u64, fps: u32) -> f64 {
    frame_index as f64 / fps as f64
}

/// Run an export job to completion.
///
/// Blocking; callers on an async runtime should wrap this in
/// `tokio::task::spawn_blocking`. `progress` is invoked once per encoded
/// frame with `(frames_done, total_frames)`.
pub fn run(
    job: &ExportJob,
    composer: &Composer<'_>,
    audio: &DecodedAudio,
    mut progress: impl FnMut(u64, u64),
) -> Result<PathBuf> {
    let video_tmp = std::env::temp_dir().join(format!(
        "wavesub_video_{}.{}",
        std::process::id(),
        job.format.extension()
    ));
    let audio_tmp = std::env::temp_dir().join(format!("wavesub_audio_{}.wav", std::process::id()));

    let result = render_and_mux(job, composer, audio, &video_tmp, &audio_tmp, &mut progress);

    // Temp files are removed on success and on failure.
    let _ = std::fs::remove_file(&video_tmp);
    let _ = std::fs::remove_file(&audio_tmp);

    result?;
    tracing::info!(path = %job.output_path.display(), "export complete");
    Ok(job.output_path.clone())
}

fn render_and_mux(
    job: &ExportJob,
    composer: &Composer<'_>,
    audio: &DecodedAudio,
    video_tmp: &Path,
    audio_tmp: &Path,
    progress: &mut impl FnMut(u64, u64),
) -> Result<()> {
    let duration = composer.duration_secs();
    if duration <= 0.0 {
        return Err(Error::export("nothing to export: audio duration is zero"));
    }

    let total = total_frames(duration, job.fps);
    tracing::info!(
        total_frames = total,
        fps = job.fps,
        format = job.format.extension(),
        crf = job.quality.crf(),
        "starting export"
    );

    let mut encoder = VideoEncoder::start(video_tmp, job.format, job.quality, job.fps)?;
    for frame_index in 0..total {
        let t = frame_time(frame_index, job.fps);
        let frame = composer.frame_at(t);
        encoder.write_frame(frame.as_raw())?;
        progress(frame_index + 1, total);
    }
    encoder.finish()?;

    pcm::write_pcm_wav(audio, audio_tmp)?;

    mux::mux(video_tmp, audio_tmp, &job.output_path, job.format)
}

/// Generate a timestamped output path in `directory`, or in the system
/// Videos folder when no directory is configured.
pub fn default_output_path(format: ContainerFormat, directory: Option<&Path>) -> Result<PathBuf> {
    let output_dir = match directory {
        Some(dir) => dir.to_path_buf(),
        None => {
            let user_dirs = UserDirs::new()
                .ok_or_else(|| Error::export("could not determine user directories"))?;
            user_dirs
                .video_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| user_dirs.home_dir().to_path_buf())
        }
    };

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).map_err(|e| Error::io(&output_dir, e))?;
    }

    let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
    Ok(output_dir.join(format!("wavesub_{}.{}", timestamp, format.extension())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AmplitudeBuffer;
    use crate::captions::CaptionTrack;
    use crate::render::RenderConfig;

    #[test]
    fn total_frames_floors_duration_times_fps() {
        assert_eq!(total_frames(10.0, 30), 300);
        assert_eq!(total_frames(10.016, 30), 300);
        assert_eq!(total_frames(0.0, 30), 0);
        assert_eq!(total_frames(-1.0, 30), 0);
        assert_eq!(total_frames(1.0 / 30.0, 30), 1);
    }

    #[test]
    fn frame_times_are_frame_index_over_fps() {
        assert_eq!(frame_time(0, 30), 0.0);
        assert!((frame_time(299, 30) - 9.9667).abs() < 1e-3);
        assert_eq!(frame_time(30, 30), 1.0);
    }

    #[test]
    fn quality_tiers_map_to_monotonic_crf() {
        assert!(QualityTier::High.crf() < QualityTier::Medium.crf());
        assert!(QualityTier::Medium.crf() < QualityTier::Low.crf());
    }

    #[test]
    fn container_formats_round_trip() {
        for format in [ContainerFormat::Mp4, ContainerFormat::Avi, ContainerFormat::Mkv] {
            assert_eq!(ContainerFormat::from_str(format.extension()), Some(format));
        }
        assert_eq!(ContainerFormat::from_str("mov"), None);
    }

    #[test]
    fn failed_export_removes_temp_files() {
        let video_tmp = std::env::temp_dir().join(format!(
            "wavesub_video_{}.mp4",
            std::process::id()
        ));
        let audio_tmp =
            std::env::temp_dir().join(format!("wavesub_audio_{}.wav", std::process::id()));
        std::fs::write(&video_tmp, b"stale").unwrap();
        std::fs::write(&audio_tmp, b"stale").unwrap();

        // Zero-duration audio fails the job before any encoding starts.
        let buffer = AmplitudeBuffer::from_raw(Vec::new(), 44_100);
        let track = CaptionTrack::default();
        let config = RenderConfig::default();
        let composer = Composer::new(&buffer, &track, &config, None);
        let audio = DecodedAudio {
            samples: Vec::new(),
            sample_rate: 44_100,
        };
        let job = ExportJob::new(
            std::env::temp_dir().join("wavesub_test_out.mp4"),
            ContainerFormat::Mp4,
            QualityTier::High,
        );

        let err = run(&job, &composer, &audio, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
        assert!(!video_tmp.exists());
        assert!(!audio_tmp.exists());
    }

    #[test]
    fn jobs_default_to_30_fps() {
        let job = ExportJob::new(
            PathBuf::from("out.mp4"),
            ContainerFormat::Mp4,
            QualityTier::High,
        );
        assert_eq!(job.fps, 30);
    }
}
