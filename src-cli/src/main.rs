//! wavesub Command-Line Interface
//!
//! Renders an audio file's waveform with time-synchronized captions:
//! inspect the chunked caption track, play a live preview, or export a
//! video with the audio muxed in.

mod colors;
mod commands;
mod exit_codes;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use exit_codes::ExitCode;
use tracing_subscriber::EnvFilter;

/// wavesub - Waveform and Caption Rendering CLI
#[derive(Parser, Debug)]
#[command(name = "wavesub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the chunked caption track for a transcript
    Captions {
        /// Audio file (transcript defaults to the sibling .json) or a
        /// transcript .json directly
        input: PathBuf,

        /// Explicit transcript JSON path
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Max words per caption chunk (1-20)
        #[arg(short, long)]
        max_words: Option<usize>,
    },
    /// Play a live preview with synchronized captions
    Preview {
        /// Audio file to preview
        audio: PathBuf,

        /// Explicit transcript JSON path
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Start playback at this position (seconds)
        #[arg(short, long)]
        seek: Option<f64>,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Export a video of the waveform and captions
    Export {
        /// Audio file to export
        audio: PathBuf,

        /// Explicit transcript JSON path
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Output file path (defaults to the Videos folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: mp4, avi, mkv
        #[arg(short, long)]
        format: Option<String>,

        /// Quality tier: low, medium, high
        #[arg(long)]
        quality: Option<String>,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Show or edit the persisted configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Persist render/export settings given via flags
    Set {
        /// Output format: mp4, avi, mkv
        #[arg(short, long)]
        format: Option<String>,

        /// Quality tier: low, medium, high
        #[arg(long)]
        quality: Option<String>,

        #[command(flatten)]
        render: RenderArgs,
    },
}

/// Render settings. Flags override the persisted configuration.
#[derive(Parser, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Waveform style: line, bar, filled
    #[arg(long)]
    style: Option<String>,

    /// Waveform color as RRGGBB hex, or 'rainbow'
    #[arg(long)]
    color: Option<String>,

    /// Amplitude scale (0.1-5.0)
    #[arg(long)]
    scale: Option<f32>,

    /// Caption font family name
    #[arg(long)]
    font: Option<String>,

    /// Explicit path to a .ttf/.otf font file
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Caption font size in pixels
    #[arg(long)]
    font_size: Option<f32>,

    /// Caption color as RRGGBB hex
    #[arg(long)]
    caption_color: Option<String>,

    /// Max words per caption chunk (1-20)
    #[arg(long)]
    max_words: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Build the async runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let exit_code = runtime.block_on(run(cli));
    std::process::exit(exit_code.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Captions {
            input,
            transcript,
            max_words,
        } => commands::captions(input, transcript, max_words, cli.json, cli.quiet).await,
        Commands::Preview {
            audio,
            transcript,
            seek,
            render,
        } => commands::preview(audio, transcript, seek, render, cli.json, cli.quiet).await,
        Commands::Export {
            audio,
            transcript,
            output,
            format,
            quality,
            render,
        } => {
            commands::export(
                audio, transcript, output, format, quality, render, cli.json, cli.quiet,
            )
            .await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(cli.json),
            ConfigAction::Set {
                format,
                quality,
                render,
            } => commands::config_set(format, quality, render, cli.json, cli.quiet),
        },
        Commands::Version => {
            commands::version(cli.json);
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify the CLI definition is valid
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_captions() {
        let cli = Cli::try_parse_from(["wavesub", "captions", "talk.wav"]).unwrap();
        assert!(!cli.json);
        match cli.command {
            Commands::Captions {
                input,
                transcript,
                max_words,
            } => {
                assert_eq!(input, PathBuf::from("talk.wav"));
                assert!(transcript.is_none());
                assert!(max_words.is_none());
            }
            _ => panic!("Expected Captions command"),
        }
    }

    #[test]
    fn parse_captions_with_max_words() {
        let cli =
            Cli::try_parse_from(["wavesub", "captions", "talk.json", "-m", "5"]).unwrap();
        match cli.command {
            Commands::Captions { max_words, .. } => assert_eq!(max_words, Some(5)),
            _ => panic!("Expected Captions command"),
        }
    }

    #[test]
    fn parse_preview_with_render_flags() {
        let cli = Cli::try_parse_from([
            "wavesub", "preview", "talk.wav", "--style", "bar", "--color", "rainbow", "--scale",
            "2.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Preview { audio, render, .. } => {
                assert_eq!(audio, PathBuf::from("talk.wav"));
                assert_eq!(render.style, Some("bar".to_string()));
                assert_eq!(render.color, Some("rainbow".to_string()));
                assert_eq!(render.scale, Some(2.5));
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn parse_preview_with_seek() {
        let cli = Cli::try_parse_from(["wavesub", "preview", "talk.wav", "-s", "12.5"]).unwrap();
        match cli.command {
            Commands::Preview { seek, .. } => assert_eq!(seek, Some(12.5)),
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn parse_export_with_options() {
        let cli = Cli::try_parse_from([
            "wavesub",
            "export",
            "talk.wav",
            "-o",
            "/tmp/out.mkv",
            "-f",
            "mkv",
            "--quality",
            "medium",
        ])
        .unwrap();
        match cli.command {
            Commands::Export {
                output,
                format,
                quality,
                ..
            } => {
                assert_eq!(output, Some(PathBuf::from("/tmp/out.mkv")));
                assert_eq!(format, Some("mkv".to_string()));
                assert_eq!(quality, Some("medium".to_string()));
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn parse_export_with_json_flag() {
        let cli = Cli::try_parse_from(["wavesub", "export", "talk.wav", "--json"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn parse_config_show() {
        let cli = Cli::try_parse_from(["wavesub", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn parse_config_set_style() {
        let cli =
            Cli::try_parse_from(["wavesub", "config", "set", "--style", "filled"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Set { render, .. },
            } => assert_eq!(render.style, Some("filled".to_string())),
            _ => panic!("Expected Config Set command"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["wavesub", "captions", "talk.wav", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    #[test]
    fn parse_version() {
        let cli = Cli::try_parse_from(["wavesub", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn parse_invalid_command() {
        let result = Cli::try_parse_from(["wavesub", "invalid"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_missing_audio_argument() {
        let result = Cli::try_parse_from(["wavesub", "preview"]);
        assert!(result.is_err());
    }
}
