//! Core engine for time-synchronized waveform and caption rendering.
//!
//! Decodes an audio file into an amplitude buffer, chunks a word-level
//! transcript into timed captions, and renders both onto a fixed 900x400
//! canvas. The same composer drives the live preview loop and the
//! deterministic video export pipeline, so what plays is what exports.

pub mod audio;
pub mod captions;
pub mod config;
pub mod error;
pub mod export;
pub mod preview;
pub mod render;
pub mod transcribe;

pub use audio::{decode_file, AmplitudeBuffer, DecodedAudio};
pub use captions::{CaptionSegment, CaptionTrack};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use export::{ContainerFormat, ExportJob, QualityTier};
pub use render::{Composer, RenderConfig, WaveformStyle};
pub use transcribe::{Transcriber, TranscriptSegment};
