//! Waveform drawing-primitive generation.
//!
//! Maps a fixed-size window of the amplitude buffer onto the canvas. The
//! window starts at an absolute sample index and is clamped at the buffer
//! end; it never reads past `len`.

use crate::audio::AmplitudeBuffer;
use crate::render::{RenderConfig, Rgb, CANVAS_HEIGHT, CANVAS_WIDTH, WINDOW_SAMPLES};

/// Stroke width of `Line` style primitives.
pub const LINE_STROKE: u32 = 2;
/// Width of `Bar` and `Filled` style primitives.
pub const FILL_WIDTH: u32 = 3;

/// One drawing primitive for a single amplitude sample.
///
/// `top`/`bottom` may extend past the canvas at large amplitude scales;
/// the rasterizer clips, matching the reference behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Vertical line segment of stroke width [`LINE_STROKE`] centered at `x`.
    Line { x: u32, top: i32, bottom: i32, color: Rgb },
    /// Filled rectangle of width [`FILL_WIDTH`] anchored at `x`.
    Bar { x: u32, top: i32, bottom: i32, color: Rgb },
    /// Filled quad of width [`FILL_WIDTH`] from the baseline up to the peak.
    Filled { x: u32, top: i32, bottom: i32, color: Rgb },
}

impl Primitive {
    pub fn x(&self) -> u32 {
        match *self {
            Primitive::Line { x, .. } | Primitive::Bar { x, .. } | Primitive::Filled { x, .. } => x,
        }
    }

    pub fn color(&self) -> Rgb {
        match *self {
            Primitive::Line { color, .. }
            | Primitive::Bar { color, .. }
            | Primitive::Filled { color, .. } => color,
        }
    }
}

/// Generate the ordered primitive sequence for the window starting at
/// absolute sample index `start`, covering `[start, min(start + W, len))`.
pub fn window_primitives(
    buffer: &AmplitudeBuffer,
    start: usize,
    config: &RenderConfig,
) -> Vec<Primitive> {
    let end = (start + WINDOW_SAMPLES).min(buffer.len());
    if start >= end {
        return Vec::new();
    }

    let center = (CANVAS_HEIGHT / 2) as i32;
    let mut primitives = Vec::with_capacity(end - start);

    for i in start..end {
        let k = (i - start) as u32;
        let x = k * CANVAS_WIDTH / WINDOW_SAMPLES as u32;

        let amp = buffer.magnitude(i) * config.amplitude_scale;
        let bar_height = (amp * (CANVAS_HEIGHT / 2) as f32).floor() as i32;
        let half = bar_height / 2;

        // Rainbow keys on the absolute index so the colors travel as the
        // window advances.
        let color = config.color_mode.color_at(i);

        let primitive = match config.style {
            crate::render::WaveformStyle::Line => Primitive::Line {
                x,
                top: center - half,
                bottom: center + half,
                color,
            },
            crate::render::WaveformStyle::Bar => Primitive::Bar {
                x,
                top: center - half,
                bottom: center + half,
                color,
            },
            crate::render::WaveformStyle::Filled => Primitive::Filled {
                x,
                top: center - half,
                bottom: center,
                color,
            },
        };
        primitives.push(primitive);
    }

    primitives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ColorMode, WaveformStyle, RAINBOW};

    fn buffer_of(len: usize, value: f32) -> AmplitudeBuffer {
        AmplitudeBuffer::from_raw(vec![value; len], 44_100)
    }

    #[test]
    fn x_positions_are_monotonic_and_on_canvas() {
        let buffer = buffer_of(1000, 0.5);
        let config = RenderConfig::default();
        let primitives = window_primitives(&buffer, 100, &config);
        assert_eq!(primitives.len(), WINDOW_SAMPLES);

        let mut previous = 0;
        for p in &primitives {
            assert!(p.x() >= previous);
            assert!(p.x() < CANVAS_WIDTH);
            previous = p.x();
        }
        assert_eq!(primitives[0].x(), 0);
    }

    #[test]
    fn window_clamps_at_buffer_end() {
        let buffer = buffer_of(250, 0.5);
        let config = RenderConfig::default();
        // Only 50 samples remain past index 200.
        assert_eq!(window_primitives(&buffer, 200, &config).len(), 50);
        assert!(window_primitives(&buffer, 250, &config).is_empty());
        assert!(window_primitives(&buffer, 9999, &config).is_empty());
    }

    #[test]
    fn bar_height_scales_with_amplitude() {
        let buffer = buffer_of(400, 0.5);
        let config = RenderConfig {
            style: WaveformStyle::Bar,
            amplitude_scale: 1.0,
            ..Default::default()
        };
        let primitives = window_primitives(&buffer, 0, &config);
        // 0.5 * 200 = 100 -> half = 50 around center 200.
        match primitives[0] {
            Primitive::Bar { top, bottom, .. } => {
                assert_eq!(top, 150);
                assert_eq!(bottom, 250);
            }
            other => panic!("expected Bar, got {:?}", other),
        }
    }

    #[test]
    fn filled_spans_baseline_to_peak() {
        let buffer = buffer_of(400, 1.0);
        let config = RenderConfig {
            style: WaveformStyle::Filled,
            ..Default::default()
        };
        let primitives = window_primitives(&buffer, 0, &config);
        match primitives[0] {
            Primitive::Filled { top, bottom, .. } => {
                assert_eq!(top, 100);
                assert_eq!(bottom, 200);
            }
            other => panic!("expected Filled, got {:?}", other),
        }
    }

    #[test]
    fn rainbow_repeats_every_seven_regardless_of_window_start() {
        let buffer = buffer_of(1000, 0.5);
        let config = RenderConfig {
            color_mode: ColorMode::Rainbow,
            ..Default::default()
        };
        let start = 693;
        let primitives = window_primitives(&buffer, start, &config);
        for (k, p) in primitives.iter().enumerate() {
            assert_eq!(p.color(), RAINBOW[(start + k) % 7]);
        }
        // Same local offset, different window start: color jumps.
        let shifted = window_primitives(&buffer, start + 1, &config);
        assert_ne!(primitives[0].color(), shifted[0].color());
    }
}
