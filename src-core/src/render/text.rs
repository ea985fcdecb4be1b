//! Caption text rasterization.
//!
//! Fonts are loaded from disk at runtime: an explicit path from the config,
//! or a family-name lookup across the standard system font directories.
//! Glyphs are rasterized with fontdue and alpha-blended onto the frame.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};

use crate::render::{FontSpec, Frame, Rgb};
use crate::{Error, Result};

/// Horizontal center of the caption anchor.
pub const CAPTION_CENTER_X: i32 = 450;
/// Vertical center of the caption anchor.
pub const CAPTION_CENTER_Y: i32 = 375;
/// Maximum caption line width in pixels before wrapping.
pub const CAPTION_MAX_WIDTH: f32 = 800.0;

/// A loaded caption font plus its configured pixel size.
pub struct CaptionFont {
    font: Font,
    size: f32,
}

impl CaptionFont {
    /// Load the font named by `spec`, searching system font directories if
    /// no explicit path is given.
    pub fn load(spec: &FontSpec) -> Result<Self> {
        let path = match &spec.path {
            Some(path) => path.clone(),
            None => find_font_file(&spec.name).ok_or_else(|| {
                Error::Font(format!("no font file found for family '{}'", spec.name))
            })?,
        };

        let bytes = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| Error::Font(format!("cannot parse {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), size = spec.size, "loaded caption font");
        Ok(Self {
            font,
            size: spec.size,
        })
    }

    /// Advance width of `text` at the configured size.
    fn line_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, self.size).advance_width)
            .sum()
    }
}

/// Directories searched for font files, most specific first.
fn font_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join(".fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs.push(PathBuf::from("/usr/local/share/fonts"));
    dirs.push(PathBuf::from("/usr/share/fonts"));
    dirs.push(PathBuf::from("/Library/Fonts"));
    dirs.push(PathBuf::from("/System/Library/Fonts"));
    dirs.push(PathBuf::from("C:\\Windows\\Fonts"));
    dirs
}

/// Find a `.ttf`/`.otf` file whose stem matches the family name
/// (case-insensitive, spaces ignored).
fn find_font_file(family: &str) -> Option<PathBuf> {
    let needle = family.to_lowercase().replace(' ', "");
    for dir in font_search_dirs() {
        if let Some(path) = search_dir(&dir, &needle, 0) {
            return Some(path);
        }
    }
    None
}

fn search_dir(dir: &Path, needle: &str, depth: usize) -> Option<PathBuf> {
    if depth > 3 {
        return None;
    }
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = search_dir(&path, needle, depth + 1) {
                return Some(found);
            }
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !ext.eq_ignore_ascii_case("ttf") && !ext.eq_ignore_ascii_case("otf") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.to_lowercase().replace(' ', "") == needle {
            return Some(path);
        }
    }
    None
}

/// Draw `text` centered on the caption anchor, wrapping at
/// [`CAPTION_MAX_WIDTH`]. The wrapped line block is centered vertically on
/// the anchor as well.
pub fn draw_caption(frame: &mut Frame, font: &CaptionFont, text: &str, color: Rgb) {
    if text.is_empty() {
        return;
    }

    let lines = wrap_words(
        &text.split_whitespace().collect::<Vec<_>>(),
        CAPTION_MAX_WIDTH,
        |word| font.line_width(word),
        font.line_width(" "),
    );

    let line_height = font.size * 1.2;
    let block_height = line_height * lines.len() as f32;
    let mut baseline = CAPTION_CENTER_Y as f32 - block_height / 2.0 + font.size;

    for line in &lines {
        draw_line(frame, font, line, color, baseline);
        baseline += line_height;
    }
}

/// Greedy word wrap. `measure` returns the advance width of one word.
fn wrap_words(
    words: &[&str],
    max_width: f32,
    measure: impl Fn(&str) -> f32,
    space_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;

    for word in words {
        let word_width = measure(word);
        let extra = if current.is_empty() {
            word_width
        } else {
            space_width + word_width
        };
        if !current.is_empty() && current_width + extra > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += space_width;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Rasterize one line of text, centered horizontally on the caption anchor.
fn draw_line(frame: &mut Frame, font: &CaptionFont, line: &str, color: Rgb, baseline: f32) {
    let width = font.line_width(line);
    let mut cursor_x = CAPTION_CENTER_X as f32 - width / 2.0;

    for ch in line.chars() {
        let (metrics, bitmap) = font.font.rasterize(ch, font.size);
        let glyph_x = cursor_x as i32 + metrics.xmin;
        let glyph_y = baseline as i32 - metrics.height as i32 - metrics.ymin;

        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                let coverage = bitmap[gy * metrics.width + gx];
                if coverage == 0 {
                    continue;
                }
                let px = glyph_x + gx as i32;
                let py = glyph_y + gy as i32;
                if px < 0 || py < 0 || px >= frame.width() as i32 || py >= frame.height() as i32 {
                    continue;
                }
                let pixel = frame.get_pixel_mut(px as u32, py as u32);
                let alpha = coverage as u16;
                for c in 0..3 {
                    let bg = pixel.0[c] as u16;
                    let fg = color[c] as u16;
                    pixel.0[c] = ((bg * (255 - alpha) + fg * alpha) / 255) as u8;
                }
            }
        }
        cursor_x += metrics.advance_width;
    }
}
