//! Caption segmentation and time-based resolution.
//!
//! Word-timestamped transcription output is chunked into fixed-size caption
//! segments once per transcription run; the resulting track is immutable and
//! replaced wholesale on re-transcription.

use serde::{Deserialize, Serialize};

use crate::transcribe::TranscriptSegment;

/// One timed caption chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Start time in seconds (first word's start).
    pub start: f64,
    /// End time in seconds (last word's end).
    pub end: f64,
    /// Words joined with single spaces.
    pub text: String,
}

/// Chronologically ordered caption segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    segments: Vec<CaptionSegment>,
}

impl CaptionTrack {
    /// Build a caption track by chunking each transcription segment's word
    /// sequence into consecutive groups of at most `max_words`. Chunks never
    /// cross transcription-segment boundaries.
    ///
    /// Word timestamps are taken as-is; monotonicity is the transcription
    /// collaborator's contract and is not re-validated here.
    pub fn from_transcript(transcript: &[TranscriptSegment], max_words: usize) -> Self {
        let max_words = max_words.max(1);
        let mut segments = Vec::new();

        for segment in transcript {
            for chunk in segment.words.chunks(max_words) {
                let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
                    continue;
                };
                let text = chunk
                    .iter()
                    .map(|w| w.word.trim())
                    .collect::<Vec<_>>()
                    .join(" ");
                segments.push(CaptionSegment {
                    start: first.start,
                    end: last.end,
                    text,
                });
            }
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Caption text active at time `t`: the first segment in chronological
    /// order with `start <= t <= end`, or the empty string.
    ///
    /// Linear scan; caption counts are small relative to audio duration.
    /// If segments overlap (malformed transcription), the first match wins.
    pub fn resolve(&self, t: f64) -> &str {
        self.segments
            .iter()
            .find(|s| s.start <= t && t <= s.end)
            .map(|s| s.text.as_str())
            .unwrap_or("")
    }
}
