//! Transcription collaborator interface.
//!
//! The speech-to-text model is a black box that produces word-level
//! timestamps. The engine consumes its output through [`Transcriber`];
//! the shipped implementation loads a whisper-style JSON transcript from
//! disk (`whisper --output_format json --word_timestamps True`, or any
//! producer emitting the same `segments[].words[]` shape).
//!
//! Transcription is long-running and must not block the preview loop, so
//! callers run it off the interactive context (see
//! [`transcribe_in_background`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::{Error, Result};

/// One timestamped word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// An ordered sequence of timestamped words, as produced per utterance by
/// the transcription model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub words: Vec<Word>,
}

/// Transcription collaborator: audio path in, word-timestamped segments out.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>>;
}

/// Loads a precomputed whisper JSON transcript sitting next to the audio
/// file (or at an explicit path).
pub struct JsonTranscriber {
    transcript_path: Option<PathBuf>,
}

impl JsonTranscriber {
    /// Resolve the transcript as `<audio>.json` next to the audio file.
    pub fn new() -> Self {
        Self {
            transcript_path: None,
        }
    }

    /// Use an explicit transcript path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            transcript_path: Some(path.into()),
        }
    }

    fn resolve_path(&self, audio: &Path) -> PathBuf {
        match &self.transcript_path {
            Some(path) => path.clone(),
            None => audio.with_extension("json"),
        }
    }
}

impl Default for JsonTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber for JsonTranscriber {
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>> {
        let path = self.resolve_path(audio);
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::transcription(format!("cannot read transcript {}: {}", path.display(), e))
        })?;
        parse_whisper_json(&contents)
    }
}

/// Parse whisper's JSON output shape, keeping only word timings.
pub fn parse_whisper_json(contents: &str) -> Result<Vec<TranscriptSegment>> {
    #[derive(Deserialize)]
    struct RawTranscript {
        segments: Vec<RawSegment>,
    }
    #[derive(Deserialize)]
    struct RawSegment {
        #[serde(default)]
        words: Vec<Word>,
    }

    let raw: RawTranscript = serde_json::from_str(contents)
        .map_err(|e| Error::transcription(format!("malformed transcript JSON: {}", e)))?;

    Ok(raw
        .segments
        .into_iter()
        .filter(|s| !s.words.is_empty())
        .map(|s| TranscriptSegment { words: s.words })
        .collect())
}

/// Run a transcriber off the interactive context.
///
/// The worker posts its result back over a oneshot channel instead of
/// touching shared state; the owning context applies it at its next
/// scheduling point.
pub fn transcribe_in_background<T>(
    transcriber: T,
    audio: PathBuf,
) -> oneshot::Receiver<Result<Vec<TranscriptSegment>>>
where
    T: Transcriber + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let result = transcriber.transcribe(&audio);
        if let Err(ref e) = result {
            tracing::error!("transcription failed: {}", e);
        }
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "text": " Hello world",
        "segments": [
            {
                "id": 0,
                "text": " Hello world",
                "words": [
                    {"word": "Hello", "start": 0.4, "end": 0.9, "probability": 0.98},
                    {"word": "world", "start": 1.0, "end": 1.4, "probability": 0.97}
                ]
            },
            {
                "id": 1,
                "words": []
            }
        ],
        "language": "en"
    }"#;

    #[test]
    fn parses_whisper_json_word_timings() {
        let segments = parse_whisper_json(SAMPLE).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].words.len(), 2);
        assert_eq!(segments[0].words[0].word, "Hello");
        assert_eq!(segments[0].words[0].start, 0.4);
        assert_eq!(segments[0].words[1].end, 1.4);
    }

    #[test]
    fn malformed_json_is_a_transcription_error() {
        let err = parse_whisper_json("not json").unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }

    #[tokio::test]
    async fn background_transcription_posts_result() {
        struct Fixed;
        impl Transcriber for Fixed {
            fn transcribe(&self, _audio: &Path) -> Result<Vec<TranscriptSegment>> {
                Ok(vec![TranscriptSegment {
                    words: vec![Word {
                        word: "ok".into(),
                        start: 0.0,
                        end: 0.5,
                    }],
                }])
            }
        }

        let rx = transcribe_in_background(Fixed, PathBuf::from("unused.wav"));
        let segments = rx.await.unwrap().unwrap();
        assert_eq!(segments[0].words[0].word, "ok");
    }
}
