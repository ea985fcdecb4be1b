//! Final mux of the encoded video and the PCM audio track.
//!
//! The video stream is stream-copied; audio is encoded to AAC at 192 kbps.
//! A mux failure fails the export.

use std::path::Path;
use std::process::Stdio;

use crate::export::encoder::new_ffmpeg_command;
use crate::export::ContainerFormat;
use crate::{Error, Result};

pub fn mux(
    video_path: &Path,
    audio_path: &Path,
    output_path: &Path,
    format: ContainerFormat,
) -> Result<()> {
    tracing::debug!(
        video = %video_path.display(),
        audio = %audio_path.display(),
        output = %output_path.display(),
        "muxing"
    );

    let mut command = new_ffmpeg_command();
    command
        .args(["-i", video_path.to_string_lossy().as_ref()])
        .args(["-i", audio_path.to_string_lossy().as_ref()])
        .args(["-c:v", "copy"])
        .args(["-c:a", "aac"])
        .args(["-b:a", "192k"])
        .args(["-map", "0:v"])
        .args(["-map", "1:a"])
        .args(["-shortest"]);

    if format == ContainerFormat::Mp4 {
        command.args(["-movflags", "+faststart"]);
    }

    command
        .args(["-y"])
        .arg(output_path.to_string_lossy().to_string());

    let inner = command.as_inner_mut();
    inner.stdout(Stdio::null());
    inner.stderr(Stdio::piped());

    let mut child = inner
        .spawn()
        .map_err(|e| Error::export(format!("failed to start ffmpeg for muxing: {}", e)))?;

    let stderr_output = if let Some(mut stderr) = child.stderr.take() {
        use std::io::Read;
        let mut output = String::new();
        let _ = stderr.read_to_string(&mut output);
        output
    } else {
        String::new()
    };

    let status = child
        .wait()
        .map_err(|e| Error::export(format!("ffmpeg mux process error: {}", e)))?;

    if !status.success() {
        let detail = stderr_output
            .lines()
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| format!("exit code {:?}", status.code()));
        return Err(Error::export(format!("ffmpeg muxing failed: {}", detail)));
    }

    Ok(())
}
