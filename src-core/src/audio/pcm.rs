//! Export audio track preparation.
//!
//! The mux step expects a 44.1 kHz 16-bit PCM WAV file. Sources at other
//! rates are resampled; f32 samples are clamped and scaled to i16.

use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::audio::decode::DecodedAudio;
use crate::{Error, Result};

/// Sample rate of the exported PCM track.
pub const EXPORT_SAMPLE_RATE: u32 = 44_100;

const RESAMPLE_CHUNK: usize = 1024;

/// Write the decoded audio as a 44.1 kHz mono 16-bit PCM WAV file.
pub fn write_pcm_wav(audio: &DecodedAudio, path: &Path) -> Result<()> {
    let samples = if audio.sample_rate == EXPORT_SAMPLE_RATE {
        std::borrow::Cow::Borrowed(&audio.samples)
    } else {
        std::borrow::Cow::Owned(resample(
            &audio.samples,
            audio.sample_rate,
            EXPORT_SAMPLE_RATE,
        )?)
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: EXPORT_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| Error::export(format!("cannot create {}: {}", path.display(), e)))?;
    for &sample in samples.iter() {
        let value = (sample.clamp(-1.0, 1.0) * 32_767.0) as i16;
        writer
            .write_sample(value)
            .map_err(|e| Error::export(format!("failed to write PCM sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| Error::export(format!("failed to finalize {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), samples = samples.len(), "wrote PCM track");
    Ok(())
}

/// Resample a mono signal with a windowed-sinc resampler.
fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        RESAMPLE_CHUNK,
        1,
    )
    .map_err(|e| Error::export(format!("resampler construction failed: {}", e)))?;

    let ratio = to_rate as f64 / from_rate as f64;
    let mut output = Vec::with_capacity((input.len() as f64 * ratio) as usize + RESAMPLE_CHUNK);
    let mut pos = 0;

    while input.len() - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let chunks = resampler
            .process(&[&input[pos..pos + n]], None)
            .map_err(|e| Error::export(format!("resampling failed: {}", e)))?;
        output.extend_from_slice(&chunks[0]);
        pos += n;
    }

    if pos < input.len() {
        let chunks = resampler
            .process_partial(Some(&[&input[pos..]]), None)
            .map_err(|e| Error::export(format!("resampling failed: {}", e)))?;
        output.extend_from_slice(&chunks[0]);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_doubles_length_within_tolerance() {
        let input: Vec<f32> = (0..4096)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        let output = resample(&input, 22_050, 44_100).unwrap();
        let expected = input.len() * 2;
        let tolerance = expected / 10;
        assert!(
            output.len().abs_diff(expected) <= tolerance,
            "expected ~{} samples, got {}",
            expected,
            output.len()
        );
    }

    #[test]
    fn wav_written_at_export_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.wav");
        let audio = DecodedAudio {
            samples: vec![0.0, 0.5, -0.5, 1.0, -1.0, 2.0],
            sample_rate: EXPORT_SAMPLE_RATE,
        };
        write_pcm_wav(&audio, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, EXPORT_SAMPLE_RATE);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], 32_767);
        // Out-of-range input clamps instead of wrapping.
        assert_eq!(samples[5], 32_767);
    }
}
