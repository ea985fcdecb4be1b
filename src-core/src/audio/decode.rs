//! Audio file decoding.
//!
//! Decoding is delegated to rodio's symphonia backend, which covers the
//! supported input containers (wav/mp3/m4a/flac/ogg/aac). Multi-channel
//! sources are downmixed to mono by averaging, since both the amplitude
//! buffer and the export PCM track are mono.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, Source};

use crate::{Error, Result};

/// Decoded audio: mono f32 samples plus the source sample rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Duration in seconds, derived from sample count and rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 samples.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| Error::playback(format!("cannot decode {}: {}", path.display(), e)))?;

    let sample_rate = decoder.sample_rate();
    let channels = decoder.channels() as usize;
    if channels == 0 {
        return Err(Error::playback(format!(
            "{}: decoder reported zero channels",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = decoder.collect();
    let samples = downmix(&interleaved, channels);

    tracing::debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = samples.len(),
        "decoded audio"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Average interleaved channels into a mono signal.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_mono_is_identity() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples);
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&interleaved, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn duration_derives_from_len_and_rate() {
        let audio = DecodedAudio {
            samples: vec![0.0; 44_100],
            sample_rate: 44_100,
        };
        assert!((audio.duration_secs() - 1.0).abs() < 1e-9);
    }
}
