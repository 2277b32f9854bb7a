//! Procedurally drawn assets: tag badges and list icons

use std::sync::Arc;

use super::canvas::{self, Canvas, palette};
use super::text::TextRenderer;
use crate::config::RenderConfig;
use crate::errors::AssetResult;
use crate::models::{Bitmap, Size};

/// Depth of the pennant notch on the left edge of a tag badge
const TAG_NOTCH: f32 = 10.0;
const TAG_PADDING_X: f32 = 16.0;
const TAG_PADDING_Y: f32 = 2.0;
const TAG_TEXT_ORIGIN: (f32, f32) = (12.0, 0.0);
const ICON_LINE_WIDTH: f32 = 1.0;

/// Draws the fixed-design assets at the configured render scale
#[derive(Clone)]
pub struct AssetRenderer {
    text: Arc<dyn TextRenderer>,
    scale: f32,
    tag_font_size: f32,
}

impl AssetRenderer {
    pub fn new(text: Arc<dyn TextRenderer>, config: &RenderConfig) -> Self {
        Self {
            text,
            scale: config.scale,
            tag_font_size: config.tag_font_size,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Gray pennant-shaped label with `text` inside
    pub fn tag_badge(&self, text: &str) -> AssetResult<Bitmap> {
        let metrics = self.text.measure(text, self.tag_font_size);
        let width = metrics.width.ceil() + TAG_PADDING_X;
        let height = metrics.height.ceil() + TAG_PADDING_Y;

        let mut canvas = Canvas::new(width, height, self.scale)?;
        let pennant = canvas::polygon(&[
            (TAG_NOTCH, 0.0),
            (0.0, height / 2.0),
            (TAG_NOTCH, height),
            (width, height),
            (width, 0.0),
        ])?;
        canvas.clip_to(&pennant)?;
        canvas.fill_rect(canvas::rect(0.0, 0.0, width, height)?, palette::badge_fill());
        self.text.draw(
            &mut canvas,
            text,
            self.tag_font_size,
            TAG_TEXT_ORIGIN,
            palette::ink(),
        );
        canvas.into_bitmap()
    }

    /// Outlined folder/bookmark glyph used for the "stock" (saved) action
    pub fn stock_icon(&self, size: Size) -> AssetResult<Bitmap> {
        let w = size.width() as f32;
        let h = size.height() as f32;

        let mut canvas = Canvas::new(w, h, self.scale)?;
        let outline = canvas::polygon(&[
            (1.0, 1.0),
            (w / 3.0, 1.0),
            (w / 3.0 + 2.0, h / 4.0),
            (w - 1.0, h / 4.0),
            (w - 1.0, h - 1.0),
            (1.0, h - 1.0),
        ])?;
        canvas.stroke_path(&outline, palette::ink(), ICON_LINE_WIDTH);
        canvas.into_bitmap()
    }

    /// Outlined speech-bubble ellipse used for the comment count
    pub fn comment_icon(&self, size: Size) -> AssetResult<Bitmap> {
        let w = size.width() as f32;
        let h = size.height() as f32;

        let mut canvas = Canvas::new(w, h, self.scale)?;
        // Inset 1pt horizontally and 2pt vertically; tiny sizes still get a sliver
        let bounds = canvas::rect(1.0, 2.0, (w - 2.0).max(0.5), (h - 4.0).max(0.5))?;
        let outline = canvas::ellipse(bounds)?;
        canvas.stroke_path(&outline, palette::ink(), ICON_LINE_WIDTH);
        canvas.into_bitmap()
    }
}
