//! Error types for wavesub.
//!
//! Three failure categories are surfaced to callers: transcription,
//! playback, and export. Each aborts the operation that raised it; there
//! are no automatic retries.

use std::path::PathBuf;

/// Errors produced by the wavesub engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transcription model or transcript parsing failure.
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Audio engine or audio file failure (decode, device, seek).
    #[error("playback failed: {0}")]
    Playback(String),

    /// Encoder, mux, or filesystem failure during export.
    #[error("export failed: {0}")]
    Export(String),

    /// Font file could not be found or parsed.
    #[error("font unavailable: {0}")]
    Font(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn transcription(msg: impl ToString) -> Self {
        Error::Transcription(msg.to_string())
    }

    pub fn playback(msg: impl ToString) -> Self {
        Error::Playback(msg.to_string())
    }

    pub fn export(msg: impl ToString) -> Self {
        Error::Export(msg.to_string())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
