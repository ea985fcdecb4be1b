//! Exit codes for the CLI.
//!
//! These codes enable scripting integration by providing structured
//! feedback about operation results.

use wavesub_core::Error;

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,
    /// General/unspecified error
    GeneralError = 1,
    /// Invalid command-line arguments
    InvalidArguments = 2,
    /// Audio file could not be read or decoded
    AudioDecodeFailed = 3,
    /// Transcript missing or malformed
    TranscriptFailed = 4,
    /// Audio playback failed
    PlaybackFailed = 5,
    /// Video export failed
    ExportFailed = 6,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a core error to the matching exit code.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Transcription(_) => ExitCode::TranscriptFailed,
            Error::Playback(_) => ExitCode::PlaybackFailed,
            Error::Export(_) => ExitCode::ExportFailed,
            Error::Font(_) => ExitCode::GeneralError,
            Error::Io { .. } => ExitCode::AudioDecodeFailed,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::AudioDecodeFailed => write!(f, "audio decode failed"),
            ExitCode::TranscriptFailed => write!(f, "transcript failed"),
            ExitCode::PlaybackFailed => write!(f, "playback failed"),
            ExitCode::ExportFailed => write!(f, "export failed"),
        }
    }
}
