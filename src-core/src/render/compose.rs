//! The composer: one point in time to one rendered frame.
//!
//! Pure given `(t, buffer, caption track, render config)` and shared
//! verbatim between the live preview and the export pipeline. That purity
//! is what makes exported video reproducible.

use image::Rgb as ImageRgb;

use crate::audio::AmplitudeBuffer;
use crate::captions::CaptionTrack;
use crate::render::text::{draw_caption, CaptionFont};
use crate::render::waveform::{window_primitives, Primitive, FILL_WIDTH, LINE_STROKE};
use crate::render::{Frame, RenderConfig, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Combines waveform primitives and the active caption into frames.
pub struct Composer<'a> {
    buffer: &'a AmplitudeBuffer,
    track: &'a CaptionTrack,
    config: &'a RenderConfig,
    /// Caption rasterization is skipped when no font is available.
    font: Option<&'a CaptionFont>,
}

impl<'a> Composer<'a> {
    pub fn new(
        buffer: &'a AmplitudeBuffer,
        track: &'a CaptionTrack,
        config: &'a RenderConfig,
        font: Option<&'a CaptionFont>,
    ) -> Self {
        Self {
            buffer,
            track,
            config,
            font,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    pub fn track(&self) -> &CaptionTrack {
        self.track
    }

    /// Audio duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// Render the frame for time `t` seconds.
    pub fn frame_at(&self, t: f64) -> Frame {
        let mut frame = Frame::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, ImageRgb([0, 0, 0]));

        let start = self.buffer.sample_index_at(t);
        for primitive in window_primitives(self.buffer, start, self.config) {
            draw_primitive(&mut frame, &primitive);
        }

        let caption = self.track.resolve(t);
        if !caption.is_empty() {
            if let Some(font) = self.font {
                draw_caption(&mut frame, font, caption, self.config.caption_color);
            }
        }

        frame
    }
}

/// Fill a vertical span, clipping to the canvas.
fn fill_span(frame: &mut Frame, x0: i32, width: u32, top: i32, bottom: i32, color: [u8; 3]) {
    let y0 = top.max(0);
    let y1 = bottom.min(CANVAS_HEIGHT as i32 - 1);
    for x in x0..x0 + width as i32 {
        if x < 0 || x >= CANVAS_WIDTH as i32 {
            continue;
        }
        for y in y0..=y1 {
            frame.put_pixel(x as u32, y as u32, ImageRgb(color));
        }
    }
}

fn draw_primitive(frame: &mut Frame, primitive: &Primitive) {
    match *primitive {
        Primitive::Line {
            x,
            top,
            bottom,
            color,
        } => {
            fill_span(frame, x as i32, LINE_STROKE, top, bottom, color);
        }
        Primitive::Bar {
            x,
            top,
            bottom,
            color,
        }
        | Primitive::Filled {
            x,
            top,
            bottom,
            color,
        } => {
            fill_span(frame, x as i32, FILL_WIDTH, top, bottom, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ColorMode, WaveformStyle};

    fn composer_parts() -> (AmplitudeBuffer, CaptionTrack, RenderConfig) {
        let buffer = AmplitudeBuffer::from_raw(
            (0..3000).map(|i| (i % 100) as f32 / 100.0).collect(),
            300,
        );
        let track = CaptionTrack::default();
        let config = RenderConfig {
            style: WaveformStyle::Bar,
            color_mode: ColorMode::Solid([255, 0, 0]),
            ..Default::default()
        };
        (buffer, track, config)
    }

    #[test]
    fn frames_have_canvas_dimensions() {
        let (buffer, track, config) = composer_parts();
        let composer = Composer::new(&buffer, &track, &config, None);
        let frame = composer.frame_at(0.0);
        assert_eq!(frame.width(), CANVAS_WIDTH);
        assert_eq!(frame.height(), CANVAS_HEIGHT);
    }

    #[test]
    fn composition_is_deterministic() {
        let (buffer, track, config) = composer_parts();
        let composer = Composer::new(&buffer, &track, &config, None);
        for t in [0.0, 1.234, 5.0, 9.9667] {
            let a = composer.frame_at(t);
            let b = composer.frame_at(t);
            assert_eq!(a.as_raw(), b.as_raw(), "t={}", t);
        }
    }

    #[test]
    fn waveform_pixels_use_configured_color() {
        let (buffer, track, config) = composer_parts();
        let composer = Composer::new(&buffer, &track, &config, None);
        let frame = composer.frame_at(1.0);
        let found = frame.pixels().any(|p| p.0 == [255, 0, 0]);
        assert!(found, "no waveform pixels drawn");
    }

    #[test]
    fn time_past_duration_renders_empty_window() {
        let (buffer, track, config) = composer_parts();
        let composer = Composer::new(&buffer, &track, &config, None);
        // 3000 samples at 300 Hz = 10 s; t beyond that clamps to an empty
        // window rather than panicking.
        let frame = composer.frame_at(99.0);
        assert!(frame.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn out_of_canvas_amplitudes_are_clipped() {
        let buffer = AmplitudeBuffer::from_raw(vec![1.0; 1000], 100);
        let track = CaptionTrack::default();
        let config = RenderConfig {
            amplitude_scale: 5.0,
            ..Default::default()
        };
        let composer = Composer::new(&buffer, &track, &config, None);
        // Span exceeds the canvas; drawing must clamp, not panic.
        let _ = composer.frame_at(0.0);
    }
}
