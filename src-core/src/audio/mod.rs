//! Audio ingestion: decoding, amplitude extraction, and export PCM.

pub mod amplitude;
pub mod decode;
pub mod pcm;

pub use amplitude::AmplitudeBuffer;
pub use decode::{decode_file, DecodedAudio};
