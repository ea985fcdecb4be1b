//! Video encoding via an external FFmpeg process.
//!
//! Frames are piped to FFmpeg stdin as raw RGB24 and encoded to a
//! video-only file; the audio track is muxed in afterwards. FFmpeg is
//! resolved from PATH first, with an auto-download fallback for
//! environments without a system install.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};

use ffmpeg_sidecar::command::FfmpegCommand;

use crate::export::{ContainerFormat, QualityTier};
use crate::render::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::{Error, Result};

const FRAME_BYTES: usize = (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize;

/// Resolve the path to the FFmpeg binary.
///
/// Prefers a previously downloaded sidecar binary next to the executable,
/// falling back to `ffmpeg` on PATH.
pub(crate) fn resolve_ffmpeg_path() -> PathBuf {
    let sidecar = ffmpeg_sidecar::paths::ffmpeg_path();
    if sidecar.exists() {
        sidecar
    } else {
        PathBuf::from("ffmpeg")
    }
}

pub(crate) fn new_ffmpeg_command() -> FfmpegCommand {
    FfmpegCommand::new_with_path(resolve_ffmpeg_path())
}

/// Ensure FFmpeg is available. Should be called once at startup.
///
/// Verifies the resolved binary by running `ffmpeg -version`; if that
/// fails, attempts ffmpeg-sidecar's auto-download.
pub fn ensure_ffmpeg() -> Result<()> {
    let ffmpeg = resolve_ffmpeg_path();
    match Command::new(&ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {
            tracing::debug!(path = %ffmpeg.display(), "ffmpeg verified");
            Ok(())
        }
        Ok(status) => Err(Error::export(format!(
            "ffmpeg at {} exited with status {}",
            ffmpeg.display(),
            status
        ))),
        Err(_) => {
            tracing::info!("ffmpeg not found, attempting auto-download");
            ffmpeg_sidecar::download::auto_download().map_err(|e| {
                Error::export(format!("ffmpeg not found and auto-download failed: {}", e))
            })
        }
    }
}

/// Encoder that pipes raw RGB24 frames to FFmpeg.
pub struct VideoEncoder {
    stdin: Option<ChildStdin>,
    child: Option<Child>,
    /// Last stderr line seen by the reader thread, for error reporting.
    stderr_tail: Arc<Mutex<Option<String>>>,
    output_path: PathBuf,
}

impl VideoEncoder {
    /// Spawn the FFmpeg encoding process for the fixed 900x400 canvas.
    pub fn start(
        output_path: &Path,
        format: ContainerFormat,
        quality: QualityTier,
        fps: u32,
    ) -> Result<Self> {
        let mut command = new_ffmpeg_command();
        command
            .args(["-f", "rawvideo"])
            .args(["-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", CANVAS_WIDTH, CANVAS_HEIGHT)])
            .args(["-r", &fps.to_string()])
            .args(["-i", "-"])
            .args(["-c:v", "libx264"])
            .args(["-preset", "medium"])
            .args(["-crf", &quality.crf().to_string()])
            .args(["-pix_fmt", "yuv420p"]);

        if format == ContainerFormat::Mp4 {
            command.args(["-movflags", "+faststart"]);
        }

        command
            .args(["-y"])
            .arg(output_path.to_string_lossy().to_string());

        let inner = command.as_inner_mut();
        inner.stdin(Stdio::piped());
        inner.stdout(Stdio::null());
        inner.stderr(Stdio::piped());

        let mut child = inner
            .spawn()
            .map_err(|e| Error::export(format!("failed to start ffmpeg: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::export("failed to open ffmpeg stdin"))?;

        // Drain stderr on a thread so the pipe never backs up during long
        // encodes; keep the last line for error reporting.
        let stderr_tail = Arc::new(Mutex::new(None));
        if let Some(stderr) = child.stderr.take() {
            let tail = Arc::clone(&stderr_tail);
            std::thread::spawn(move || {
                use std::io::{BufRead, BufReader};
                let reader = BufReader::new(stderr);
                for line in reader.lines().map_while(std::io::Result::ok) {
                    tracing::debug!(target: "ffmpeg", "{}", line);
                    if let Ok(mut tail) = tail.lock() {
                        *tail = Some(line);
                    }
                }
            });
        }

        Ok(Self {
            stdin: Some(stdin),
            child: Some(child),
            stderr_tail,
            output_path: output_path.to_path_buf(),
        })
    }

    /// Write one raw RGB24 frame.
    pub fn write_frame(&mut self, rgb: &[u8]) -> Result<()> {
        if rgb.len() != FRAME_BYTES {
            return Err(Error::export(format!(
                "frame has {} bytes, expected {}",
                rgb.len(),
                FRAME_BYTES
            )));
        }
        if let Some(ref mut stdin) = self.stdin {
            stdin
                .write_all(rgb)
                .map_err(|e| Error::export(format!("failed to write frame: {}", e)))?;
        }
        Ok(())
    }

    /// Close the input pipe and wait for FFmpeg to finalize the file.
    pub fn finish(mut self) -> Result<PathBuf> {
        drop(self.stdin.take());

        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .map_err(|e| Error::export(format!("ffmpeg process error: {}", e)))?;

            if !status.success() {
                let tail = self
                    .stderr_tail
                    .lock()
                    .ok()
                    .and_then(|t| t.clone())
                    .unwrap_or_else(|| format!("exit code {:?}", status.code()));
                return Err(Error::export(format!("ffmpeg encoding failed: {}", tail)));
            }
        }

        Ok(self.output_path)
    }
}
