//! Frame rendering: waveform primitives, caption text, and the composer.

pub mod compose;
pub mod text;
pub mod waveform;

use serde::{Deserialize, Serialize};

pub use compose::Composer;

/// Canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 900;
/// Canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 400;
/// Number of amplitude samples shown per frame.
pub const WINDOW_SAMPLES: usize = 200;

/// A rendered frame: fixed-size RGB canvas, recreated per frame.
pub type Frame = image::RgbImage;

/// RGB color triple.
pub type Rgb = [u8; 3];

/// Seven-color rainbow palette, cycled by absolute sample index.
pub const RAINBOW: [Rgb; 7] = [
    [255, 0, 0],   // red
    [255, 127, 0], // orange
    [255, 255, 0], // yellow
    [0, 255, 0],   // green
    [0, 0, 255],   // blue
    [75, 0, 130],  // indigo
    [148, 0, 211], // violet
];

/// Waveform drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaveformStyle {
    /// Vertical line segments, stroke width 2.
    #[default]
    Line,
    /// Filled rectangles, width 3.
    Bar,
    /// Filled quads from the baseline up to the amplitude peak, width 3.
    Filled,
}

impl WaveformStyle {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "line" => Some(Self::Line),
            "bar" => Some(Self::Bar),
            "filled" => Some(Self::Filled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Filled => "filled",
        }
    }
}

/// How waveform primitives are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// A single configured color for every sample.
    Solid(Rgb),
    /// `RAINBOW[i % 7]` keyed on the absolute sample index, so the colors
    /// travel as the window advances.
    Rainbow,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Solid([0, 255, 0])
    }
}

impl ColorMode {
    /// Color for the sample at absolute index `i`.
    pub fn color_at(&self, i: usize) -> Rgb {
        match self {
            ColorMode::Solid(rgb) => *rgb,
            ColorMode::Rainbow => RAINBOW[i % RAINBOW.len()],
        }
    }
}

/// Caption font selection: a family name resolved against the system font
/// directories, or an explicit file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Font family name, e.g. "Arial" or "DejaVuSans".
    #[serde(default = "default_font_name")]
    pub name: String,
    /// Explicit path to a .ttf/.otf file. Takes precedence over `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<std::path::PathBuf>,
    /// Size in pixels.
    #[serde(default = "default_font_size")]
    pub size: f32,
}

fn default_font_name() -> String {
    "DejaVuSans".to_string()
}

fn default_font_size() -> f32 {
    18.0
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            name: default_font_name(),
            path: None,
            size: default_font_size(),
        }
    }
}

/// Immutable render settings, snapshotted once per preview session or
/// export job. Edits made while a render is active apply to the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub style: WaveformStyle,
    #[serde(default)]
    pub color_mode: ColorMode,
    /// Amplitude multiplier, clamped to [0.1, 5.0].
    #[serde(default = "default_amplitude_scale")]
    pub amplitude_scale: f32,
    #[serde(default)]
    pub font: FontSpec,
    /// Caption text color.
    #[serde(default = "default_caption_color")]
    pub caption_color: Rgb,
    /// Max words per caption chunk, clamped to [1, 20].
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

fn default_amplitude_scale() -> f32 {
    1.0
}

fn default_caption_color() -> Rgb {
    [0, 255, 0]
}

fn default_max_words() -> usize {
    10
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            style: WaveformStyle::default(),
            color_mode: ColorMode::default(),
            amplitude_scale: default_amplitude_scale(),
            font: FontSpec::default(),
            caption_color: default_caption_color(),
            max_words: default_max_words(),
        }
    }
}

impl RenderConfig {
    /// Clamp tunable fields to their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.amplitude_scale = self.amplitude_scale.clamp(0.1, 5.0);
        self.max_words = self.max_words.clamp(1, 20);
        self
    }
}
