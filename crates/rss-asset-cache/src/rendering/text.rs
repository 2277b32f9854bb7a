//! Text measurement and drawing for tag badges

use font8x8::{BASIC_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS, UnicodeFonts};
use tiny_skia::{Color, PathBuilder};

use super::canvas::Canvas;

/// Bounding box of a single line of text, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
}

/// Text layout capability consumed by the tag badge recipe
pub trait TextRenderer: Send + Sync {
    /// Size of `text` laid out on a single line at `font_size`
    fn measure(&self, text: &str, font_size: f32) -> TextMetrics;

    /// Draw `text` with its top-left corner at `origin`
    fn draw(&self, canvas: &mut Canvas, text: &str, font_size: f32, origin: (f32, f32), color: Color);
}

/// Glyph cell edge of the font8x8 sets
const CELL: usize = 8;

/// Renders text with the public-domain 8×8 bitmap glyphs from `font8x8`
///
/// A glyph cell spans `font_size / 10` points per glyph pixel, with line height
/// `1.2 × font_size`; at 14 pt that gives an 11.2 pt advance and a 16.8 pt line.
/// Characters outside the Basic Latin, Latin-1, Greek and Hiragana sets draw as `?`.
#[derive(Debug, Clone, Default)]
pub struct BitmapFontRenderer {
    /// Lines wider than this are measured at this width (and clipped when drawn)
    max_width: Option<f32>,
}

impl BitmapFontRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_width(max_width: f32) -> Self {
        Self {
            max_width: Some(max_width),
        }
    }

    fn glyph_pixel(font_size: f32) -> f32 {
        font_size / 10.0
    }

    fn line_height(font_size: f32) -> f32 {
        font_size * 1.2
    }

    fn glyph(ch: char) -> [u8; CELL] {
        BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| GREEK_FONTS.get(ch))
            .or_else(|| HIRAGANA_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; CELL])
    }
}

impl TextRenderer for BitmapFontRenderer {
    fn measure(&self, text: &str, font_size: f32) -> TextMetrics {
        let advance = Self::glyph_pixel(font_size) * CELL as f32;
        let width = text.chars().count() as f32 * advance;
        TextMetrics {
            width: self.max_width.map_or(width, |max| width.min(max)),
            height: Self::line_height(font_size),
        }
    }

    fn draw(&self, canvas: &mut Canvas, text: &str, font_size: f32, origin: (f32, f32), color: Color) {
        let unit = Self::glyph_pixel(font_size);
        let advance = unit * CELL as f32;
        let top = origin.1 + (Self::line_height(font_size) - advance) / 2.0;
        let right_edge = self.max_width.map(|max| origin.0 + max);

        let mut builder = PathBuilder::new();
        for (index, ch) in text.chars().enumerate() {
            let left = origin.0 + index as f32 * advance;
            if right_edge.is_some_and(|edge| left >= edge) {
                break;
            }

            for (row, bits) in Self::glyph(ch).iter().enumerate() {
                for col in 0..CELL {
                    // font8x8 stores the leftmost pixel in the lowest bit
                    if bits & (1 << col) != 0
                        && let Some(cell) = tiny_skia::Rect::from_xywh(
                            left + col as f32 * unit,
                            top + row as f32 * unit,
                            unit,
                            unit,
                        )
                    {
                        builder.push_rect(cell);
                    }
                }
            }
        }

        // All-blank text (spaces) yields no path
        if let Some(path) = builder.finish() {
            canvas.fill_path(&path, color);
        }
    }
}
