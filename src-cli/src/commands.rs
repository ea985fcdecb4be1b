//! CLI command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Notify;

use wavesub_core::audio::{decode_file, AmplitudeBuffer};
use wavesub_core::captions::CaptionTrack;
use wavesub_core::config::{load_config, save_config};
use wavesub_core::export::{self, encoder, ContainerFormat, ExportJob, QualityTier};
use wavesub_core::preview::engine::RodioEngine;
use wavesub_core::preview::{PreviewSession, PreviewSink, SessionData};
use wavesub_core::render::text::CaptionFont;
use wavesub_core::render::{ColorMode, Composer, Frame, RenderConfig, WaveformStyle};
use wavesub_core::transcribe::{JsonTranscriber, Transcriber};

use crate::colors;
use crate::exit_codes::ExitCode;
use crate::RenderArgs;

/// Parse an RRGGBB hex color, with or without a leading '#'.
fn parse_rgb(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Apply command-line render overrides on top of the persisted config.
fn apply_render_args(mut config: RenderConfig, args: &RenderArgs) -> Result<RenderConfig, String> {
    if let Some(style) = &args.style {
        config.style = WaveformStyle::from_str(style)
            .ok_or_else(|| format!("unknown style '{}' (expected line, bar, filled)", style))?;
    }
    if let Some(color) = &args.color {
        config.color_mode = if color.eq_ignore_ascii_case("rainbow") {
            ColorMode::Rainbow
        } else {
            ColorMode::Solid(
                parse_rgb(color)
                    .ok_or_else(|| format!("invalid color '{}' (expected RRGGBB hex or 'rainbow')", color))?,
            )
        };
    }
    if let Some(scale) = args.scale {
        config.amplitude_scale = scale;
    }
    if let Some(font) = &args.font {
        config.font.name = font.clone();
    }
    if let Some(font_file) = &args.font_file {
        config.font.path = Some(font_file.clone());
    }
    if let Some(size) = args.font_size {
        config.font.size = size;
    }
    if let Some(color) = &args.caption_color {
        config.caption_color = parse_rgb(color)
            .ok_or_else(|| format!("invalid caption color '{}' (expected RRGGBB hex)", color))?;
    }
    if let Some(max_words) = args.max_words {
        config.max_words = max_words;
    }
    Ok(config.clamped())
}

/// Load and chunk the transcript for `audio`.
fn load_track(
    audio: &Path,
    transcript: Option<&Path>,
    max_words: usize,
) -> wavesub_core::Result<CaptionTrack> {
    let transcriber = match transcript {
        Some(path) => JsonTranscriber::with_path(path),
        None => JsonTranscriber::new(),
    };
    let segments = transcriber.transcribe(audio)?;
    Ok(CaptionTrack::from_transcript(&segments, max_words))
}

/// Transcript load failure degrades the render to waveform-only.
fn load_track_or_empty(
    audio: &Path,
    transcript: Option<&Path>,
    max_words: usize,
    quiet: bool,
) -> CaptionTrack {
    match load_track(audio, transcript, max_words) {
        Ok(track) => track,
        Err(e) => {
            if !quiet {
                eprintln!(
                    "{}",
                    colors::warning(&format!("{}; continuing without captions", e))
                );
            }
            CaptionTrack::default()
        }
    }
}

/// Font load failure degrades the render to waveform-only captions.
fn load_font_or_none(config: &RenderConfig, quiet: bool) -> Option<CaptionFont> {
    match CaptionFont::load(&config.font) {
        Ok(font) => Some(font),
        Err(e) => {
            if !quiet {
                eprintln!(
                    "{}",
                    colors::warning(&format!("{}; captions will not be drawn", e))
                );
            }
            None
        }
    }
}

/// Print the chunked caption track.
pub async fn captions(
    input: PathBuf,
    transcript: Option<PathBuf>,
    max_words: Option<usize>,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let app = load_config();
    let max_words = max_words.unwrap_or(app.render.max_words).clamp(1, 20);

    // A .json argument is the transcript itself.
    let transcript = transcript.or_else(|| {
        matches!(input.extension().and_then(|e| e.to_str()), Some("json")).then(|| input.clone())
    });

    let track = match load_track(&input, transcript.as_deref(), max_words) {
        Ok(track) => track,
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            return ExitCode::from_error(&e);
        }
    };

    if json {
        match serde_json::to_string_pretty(track.segments()) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("{}", colors::error(&e.to_string()));
                return ExitCode::GeneralError;
            }
        }
    } else if track.is_empty() {
        if !quiet {
            println!("{}", colors::dim("No captions."));
        }
    } else {
        println!(
            "{}  {}  {}",
            colors::pad_left("START", 8, colors::header),
            colors::pad_left("END", 8, colors::header),
            colors::header("TEXT")
        );
        println!("{}  {}  {}", "-".repeat(8), "-".repeat(8), "-".repeat(4));
        for segment in track.segments() {
            println!(
                "{}  {}  {}",
                colors::pad_left(&format!("{:.2}", segment.start), 8, colors::number),
                colors::pad_left(&format!("{:.2}", segment.end), 8, colors::number),
                segment.text
            );
        }
    }
    ExitCode::Success
}

/// Preview sink that writes captions and the position indicator to the
/// terminal. Frames are rendered but not displayed.
struct TerminalSink {
    json: bool,
    quiet: bool,
    duration_secs: f64,
    finished: Notify,
}

impl PreviewSink for TerminalSink {
    fn on_frame(&self, _frame: Frame) {}

    fn on_caption(&self, text: &str) {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "event": "caption", "text": text })
            );
        } else if !self.quiet && !text.is_empty() {
            println!("\r{}", colors::caption(text));
        }
    }

    fn on_position(&self, percent: f64) {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "event": "position", "percent": percent })
            );
        } else if !self.quiet && colors::is_interactive() {
            use std::io::Write;
            let secs = self.duration_secs * percent / 100.0;
            print!("\r{} {:>5.1}%  ", colors::timestamp(secs), percent);
            let _ = std::io::stdout().flush();
        }
    }

    fn on_finished(&self) {
        self.finished.notify_one();
    }
}

/// Play a live preview of `audio`.
pub async fn preview(
    audio: PathBuf,
    transcript: Option<PathBuf>,
    seek: Option<f64>,
    render: RenderArgs,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let app = load_config();
    let config = match apply_render_args(app.render_snapshot(), &render) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}", colors::error(&msg));
            return ExitCode::InvalidArguments;
        }
    };

    let buffer = match AmplitudeBuffer::from_file(&audio) {
        Ok(buffer) => buffer,
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            return ExitCode::AudioDecodeFailed;
        }
    };

    let track = load_track_or_empty(&audio, transcript.as_deref(), config.max_words, quiet);
    let font = load_font_or_none(&config, quiet);

    let engine = match RodioEngine::open(&audio) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            return ExitCode::PlaybackFailed;
        }
    };

    let sink = Arc::new(TerminalSink {
        json,
        quiet,
        duration_secs: buffer.duration_secs(),
        finished: Notify::new(),
    });

    let session = PreviewSession::new(
        SessionData {
            buffer,
            track,
            config,
            font,
        },
        engine,
        sink.clone(),
    );

    if let Err(e) = session.start().await {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return ExitCode::PlaybackFailed;
    }

    if let Some(t) = seek {
        if let Err(e) = session.seek(t).await {
            if !quiet {
                eprintln!("{}", colors::warning(&e.to_string()));
            }
        }
    }

    if !quiet && !json {
        println!(
            "{} {}",
            colors::dim("Previewing"),
            colors::path(&audio.display().to_string())
        );
        println!("{}", colors::dim("Press Ctrl-C to stop."));
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sink.finished.notified() => {}
    }
    session.stop().await;

    if !quiet && !json {
        println!("\n{}", colors::success("Preview stopped."));
    }
    ExitCode::Success
}

/// Export a video of the waveform and captions.
#[allow(clippy::too_many_arguments)]
pub async fn export(
    audio: PathBuf,
    transcript: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
    quality: Option<String>,
    render: RenderArgs,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let app = load_config();
    let config = match apply_render_args(app.render_snapshot(), &render) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}", colors::error(&msg));
            return ExitCode::InvalidArguments;
        }
    };

    let format = match format {
        Some(s) => match ContainerFormat::from_str(&s) {
            Some(format) => format,
            None => {
                eprintln!(
                    "{}",
                    colors::error(&format!("unknown format '{}' (expected mp4, avi, mkv)", s))
                );
                return ExitCode::InvalidArguments;
            }
        },
        None => app.export.format,
    };
    let quality = match quality {
        Some(s) => match QualityTier::from_str(&s) {
            Some(quality) => quality,
            None => {
                eprintln!(
                    "{}",
                    colors::error(&format!(
                        "unknown quality '{}' (expected low, medium, high)",
                        s
                    ))
                );
                return ExitCode::InvalidArguments;
            }
        },
        None => app.export.quality,
    };

    if let Err(e) = encoder::ensure_ffmpeg() {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return ExitCode::ExportFailed;
    }

    let decoded = match decode_file(&audio) {
        Ok(decoded) => decoded,
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            return ExitCode::AudioDecodeFailed;
        }
    };
    let buffer = AmplitudeBuffer::from_decoded(&decoded);
    let track = load_track_or_empty(&audio, transcript.as_deref(), config.max_words, quiet);
    let font = load_font_or_none(&config, quiet);

    let output_path = match output {
        Some(path) => path,
        None => {
            let directory = app.export.directory.as_deref().map(Path::new);
            match export::default_output_path(format, directory) {
                Ok(path) => path,
                Err(e) => {
                    if !quiet {
                        eprintln!("{}", colors::error(&e.to_string()));
                    }
                    return ExitCode::ExportFailed;
                }
            }
        }
    };

    let job = ExportJob::new(output_path, format, quality);
    let show_progress = !quiet && !json && colors::is_stderr_interactive();

    let result = tokio::task::spawn_blocking(move || {
        let composer = Composer::new(&buffer, &track, &config, font.as_ref());
        export::run(&job, &composer, &decoded, |done, total| {
            if show_progress && (done % 30 == 0 || done == total) {
                use std::io::Write;
                let percent = done as f64 / total as f64 * 100.0;
                eprint!("\rEncoding frame {}/{} ({:>5.1}%)  ", done, total, percent);
                let _ = std::io::stderr().flush();
            }
        })
    })
    .await;

    match result {
        Ok(Ok(path)) => {
            if show_progress {
                eprintln!();
            }
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "output": path.display().to_string() })
                );
            } else if !quiet {
                println!(
                    "{} {}",
                    colors::success("Exported"),
                    colors::path(&path.display().to_string())
                );
            }
            ExitCode::Success
        }
        Ok(Err(e)) => {
            if show_progress {
                eprintln!();
            }
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            ExitCode::from_error(&e)
        }
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&format!("export task failed: {}", e)));
            }
            ExitCode::GeneralError
        }
    }
}

/// Print the effective configuration.
pub fn config_show(_json: bool) -> ExitCode {
    let app = load_config();
    match serde_json::to_string_pretty(&app) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            ExitCode::GeneralError
        }
    }
}

/// Persist render/export settings.
pub fn config_set(
    format: Option<String>,
    quality: Option<String>,
    render: RenderArgs,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let mut app = load_config();

    app.render = match apply_render_args(app.render.clone(), &render) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}", colors::error(&msg));
            return ExitCode::InvalidArguments;
        }
    };
    if let Some(s) = format {
        match ContainerFormat::from_str(&s) {
            Some(format) => app.export.format = format,
            None => {
                eprintln!("{}", colors::error(&format!("unknown format '{}'", s)));
                return ExitCode::InvalidArguments;
            }
        }
    }
    if let Some(s) = quality {
        match QualityTier::from_str(&s) {
            Some(quality) => app.export.quality = quality,
            None => {
                eprintln!("{}", colors::error(&format!("unknown quality '{}'", s)));
                return ExitCode::InvalidArguments;
            }
        }
    }

    match save_config(&app) {
        Ok(()) => {
            if json {
                config_show(json)
            } else {
                if !quiet {
                    println!("{}", colors::success("Configuration saved."));
                }
                ExitCode::Success
            }
        }
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            ExitCode::GeneralError
        }
    }
}

/// Print version information.
pub fn version(json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "name": "wavesub",
                "version": env!("CARGO_PKG_VERSION"),
            })
        );
    } else {
        println!("wavesub {}", env!("CARGO_PKG_VERSION"));
    }
}
