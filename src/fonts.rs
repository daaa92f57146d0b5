//! Font faces for the composed images.
//! Tries TrueType files first (via `ab_glyph`, drawn by `imageproc`) and falls back to a
//! built-in 5x7 bitmap face when no file can be loaded. The fallback only degrades the
//! look of the image, it never fails.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::config::FontConfig;

/// A drawable face: a loaded TrueType font or the built-in bitmap glyphs.
#[derive(Clone, Default)]
pub enum FontFace {
    Truetype { font: FontArc, path: PathBuf },
    /// Built-in 5x7 bitmap glyphs
    #[default]
    Builtin,
    /// Built-in glyphs with widened strokes
    BuiltinBold,
}

impl fmt::Display for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontFace::Truetype { path, .. } => write!(f, "TrueType ({})", path.display()),
            FontFace::Builtin => write!(f, "built-in bitmap"),
            FontFace::BuiltinBold => write!(f, "built-in bitmap (bold)"),
        }
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FontFace({})", self)
    }
}

/// Loads a TrueType/OpenType file. Missing or unparsable files yield `None`.
pub fn try_load_font(path: &Path) -> Option<FontFace> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "font file unavailable");
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(FontFace::Truetype {
            font,
            path: path.to_path_buf(),
        }),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "font file is not a usable font");
            None
        }
    }
}

/// First loadable candidate, or `fallback`.
fn first_loadable(candidates: &[PathBuf], fallback: FontFace) -> FontFace {
    candidates
        .iter()
        .find_map(|p| try_load_font(p))
        .unwrap_or(fallback)
}

impl FontFace {
    pub fn is_builtin(&self) -> bool {
        !matches!(self, FontFace::Truetype { .. })
    }

    /// Width and height in pixels of `text` drawn at `scale`.
    pub fn measure(&self, scale: f32, text: &str) -> (u32, u32) {
        match self {
            FontFace::Truetype { font, .. } => text_size(scale, font, text),
            FontFace::Builtin | FontFace::BuiltinBold => {
                let px = bitmap_pixel(scale);
                let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
                let width = chars
                    .saturating_mul(CELL_W)
                    .saturating_sub(CELL_W - GLYPH_W)
                    .saturating_mul(px);
                (width, GLYPH_H.saturating_mul(px))
            }
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`). Off-canvas parts are clipped.
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, scale: f32, text: &str) {
        match self {
            FontFace::Truetype { font, .. } => draw_text_mut(canvas, color, x, y, scale, font, text),
            FontFace::Builtin => draw_bitmap(canvas, color, x, y, scale, text, false),
            FontFace::BuiltinBold => draw_bitmap(canvas, color, x, y, scale, text, true),
        }
    }
}

/// The two faces the composer needs, with their pixel sizes.
#[derive(Clone, Debug)]
pub struct Fonts {
    pub title: FontFace,
    pub body: FontFace,
    pub title_size: f32,
    pub body_size: f32,
}

impl Fonts {
    /// Resolves the configured font files, falling back per face to the built-in glyphs.
    pub fn load(config: &FontConfig) -> Self {
        let fonts = Self {
            title: first_loadable(&config.bold, FontFace::BuiltinBold),
            body: first_loadable(&config.regular, FontFace::Builtin),
            title_size: config.title_size,
            body_size: config.body_size,
        };
        if fonts.title.is_builtin() || fonts.body.is_builtin() {
            tracing::warn!(title = %fonts.title, body = %fonts.body, "using built-in fallback font");
        } else {
            tracing::info!(title = %fonts.title, body = %fonts.body, "fonts loaded");
        }
        fonts
    }

    /// Built-in faces only. Output does not depend on the host's installed fonts.
    pub fn builtin(config: &FontConfig) -> Self {
        Self {
            title: FontFace::BuiltinBold,
            body: FontFace::Builtin,
            title_size: config.title_size,
            body_size: config.body_size,
        }
    }
}

// *************** Built-in bitmap face ***************

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const CELL_W: u32 = GLYPH_W + 1;

/// Size of one glyph dot in pixels: a 5x7 glyph is roughly 70% of the requested em height.
fn bitmap_pixel(scale: f32) -> u32 {
    ((scale / 10.0).round() as u32).max(1)
}

fn draw_bitmap(canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, scale: f32, text: &str, bold: bool) {
    let px = bitmap_pixel(scale);
    let dot_w = if bold { px.saturating_add(px.div_ceil(2)) } else { px };
    let step = i64::from(CELL_W) * i64::from(px);
    let mut pen_x = i64::from(x);
    for c in text.chars() {
        if pen_x >= i64::from(canvas.width()) {
            break;
        }
        let rows = glyph(c);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let dx = pen_x + i64::from(col) * i64::from(px);
                let dy = i64::from(y) + row as i64 * i64::from(px);
                fill_dot(canvas, color, dx, dy, dot_w, px);
            }
        }
        pen_x = pen_x.saturating_add(step);
    }
}

/// Fills the part of the `w`x`h` dot at (`x`, `y`) that lies on the canvas.
fn fill_dot(canvas: &mut RgbImage, color: Rgb<u8>, x: i64, y: i64, w: u32, h: u32) {
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + i64::from(w)).min(i64::from(canvas.width()));
    let bottom = (y + i64::from(h)).min(i64::from(canvas.height()));
    if left >= right || top >= bottom {
        return;
    }
    // Clipped to the canvas, so every value fits the rect's i32/u32 fields
    let rect = Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32);
    draw_filled_rect_mut(canvas, rect, color);
}

/// Strips Latin-1 accents and upper-cases; the bitmap face only has capitals.
fn fold(c: char) -> char {
    let base = match c {
        'À'..='Å' | 'à'..='å' => 'A',
        'Ç' | 'ç' => 'C',
        'È'..='Ë' | 'è'..='ë' => 'E',
        'Ì'..='Ï' | 'ì'..='ï' => 'I',
        'Ñ' | 'ñ' => 'N',
        'Ò'..='Ö' | 'ò'..='ö' => 'O',
        'Ù'..='Ü' | 'ù'..='ü' => 'U',
        'Ý' | 'ý' | 'ÿ' => 'Y',
        other => other,
    };
    base.to_ascii_uppercase()
}

fn glyph(c: char) -> [u8; 7] {
    match fold(c) {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '[' => [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E],
        ']' => [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}
