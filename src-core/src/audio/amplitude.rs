//! Per-sample amplitude magnitudes for waveform rendering.

use std::path::Path;

use crate::audio::decode::{decode_file, DecodedAudio};
use crate::Result;

/// Absolute-value sample magnitudes plus sample rate.
///
/// Built once per audio source and never mutated; opening a different audio
/// file replaces the buffer wholesale.
#[derive(Debug, Clone)]
pub struct AmplitudeBuffer {
    magnitudes: Vec<f32>,
    sample_rate: u32,
}

impl AmplitudeBuffer {
    /// Build from already decoded audio.
    pub fn from_decoded(audio: &DecodedAudio) -> Self {
        Self {
            magnitudes: audio.samples.iter().map(|s| s.abs()).collect(),
            sample_rate: audio.sample_rate,
        }
    }

    /// Decode an audio file and build the buffer.
    pub fn from_file(path: &Path) -> Result<Self> {
        let audio = decode_file(path)?;
        Ok(Self::from_decoded(&audio))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(magnitudes: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            magnitudes,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds: `len / sample_rate`.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.magnitudes.len() as f64 / self.sample_rate as f64
    }

    /// Magnitude at absolute sample index `i`.
    pub fn magnitude(&self, i: usize) -> f32 {
        self.magnitudes[i]
    }

    /// Starting sample index for time `t`: `floor(t / duration * len)`,
    /// clamped to the buffer length.
    pub fn sample_index_at(&self, t: f64) -> usize {
        let duration = self.duration_secs();
        if duration <= 0.0 {
            return 0;
        }
        let index = (t / duration * self.magnitudes.len() as f64).floor();
        (index.max(0.0) as usize).min(self.magnitudes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitudes_are_absolute_values() {
        let audio = DecodedAudio {
            samples: vec![-0.5, 0.25, -1.0],
            sample_rate: 10,
        };
        let buffer = AmplitudeBuffer::from_decoded(&audio);
        assert_eq!(buffer.magnitude(0), 0.5);
        assert_eq!(buffer.magnitude(1), 0.25);
        assert_eq!(buffer.magnitude(2), 1.0);
    }

    #[test]
    fn sample_index_maps_time_linearly() {
        // 1000 samples at 100 Hz = 10 seconds.
        let buffer = AmplitudeBuffer::from_raw(vec![0.0; 1000], 100);
        assert_eq!(buffer.sample_index_at(0.0), 0);
        assert_eq!(buffer.sample_index_at(5.0), 500);
        assert_eq!(buffer.sample_index_at(10.0), 1000);
        // Past-the-end queries clamp instead of overflowing.
        assert_eq!(buffer.sample_index_at(20.0), 1000);
        assert_eq!(buffer.sample_index_at(-1.0), 0);
    }

    #[test]
    fn empty_buffer_has_zero_duration() {
        let buffer = AmplitudeBuffer::from_raw(vec![], 44_100);
        assert_eq!(buffer.duration_secs(), 0.0);
        assert_eq!(buffer.sample_index_at(1.0), 0);
    }
}
