//! Raster drawing surface backed by tiny-skia
//!
//! Drawing commands are expressed in logical points; the canvas applies the
//! render scale when rasterizing, so a 24×24 point icon at scale 2.0 produces a
//! 48×48 pixel bitmap.

use tiny_skia::{
    Color, FillRule, Mask, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

use crate::errors::{AssetError, AssetResult};
use crate::models::Bitmap;
use crate::models::size::scale_dimension;

/// Fixed colors used by the procedural assets
pub mod palette {
    use tiny_skia::Color;

    /// Stroke and text color (30% gray)
    pub fn ink() -> Color {
        Color::from_rgba8(77, 77, 77, 255)
    }

    /// Tag badge background (80% gray)
    pub fn badge_fill() -> Color {
        Color::from_rgba8(204, 204, 204, 255)
    }
}

pub struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
    clip: Option<Mask>,
}

impl Canvas {
    /// Allocate a transparent surface of `width` × `height` points
    pub fn new(width: f32, height: f32, scale: f32) -> AssetResult<Self> {
        let pixel_width = scale_dimension(width, scale);
        let pixel_height = scale_dimension(height, scale);
        let pixmap = Pixmap::new(pixel_width, pixel_height).ok_or_else(|| {
            AssetError::render(
                "canvas",
                format!("cannot allocate {pixel_width}x{pixel_height} surface"),
            )
        })?;

        Ok(Self {
            pixmap,
            transform: Transform::from_scale(scale, scale),
            clip: None,
        })
    }

    pub fn pixel_dimensions(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Restrict all subsequent drawing to the interior of `path`
    pub fn clip_to(&mut self, path: &Path) -> AssetResult<()> {
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())
            .ok_or_else(|| AssetError::render("clip mask", "cannot allocate mask"))?;
        mask.fill_path(path, FillRule::Winding, true, self.transform);
        self.clip = Some(mask);
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let paint = solid(color);
        self.pixmap
            .fill_rect(rect, &paint, self.transform, self.clip.as_ref());
    }

    pub fn fill_path(&mut self, path: &Path, color: Color) {
        let paint = solid(color);
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            self.transform,
            self.clip.as_ref(),
        );
    }

    pub fn stroke_path(&mut self, path: &Path, color: Color, line_width: f32) {
        let paint = solid(color);
        let stroke = Stroke {
            width: line_width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.transform, self.clip.as_ref());
    }

    /// Finish drawing and snapshot the surface
    pub fn into_bitmap(self) -> AssetResult<Bitmap> {
        Bitmap::from_pixmap(&self.pixmap)
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

pub fn rect(x: f32, y: f32, width: f32, height: f32) -> AssetResult<Rect> {
    Rect::from_xywh(x, y, width, height)
        .ok_or_else(|| AssetError::render("rect", format!("invalid rect {x},{y} {width}x{height}")))
}

/// Closed polygon through `points`
pub fn polygon(points: &[(f32, f32)]) -> AssetResult<Path> {
    let mut builder = PathBuilder::new();
    let mut iter = points.iter();
    let Some(&(x, y)) = iter.next() else {
        return Err(AssetError::render("polygon", "no points"));
    };
    builder.move_to(x, y);
    for &(x, y) in iter {
        builder.line_to(x, y);
    }
    builder.close();
    builder
        .finish()
        .ok_or_else(|| AssetError::render("polygon", "degenerate path"))
}

/// Ellipse inscribed in `bounds`
pub fn ellipse(bounds: Rect) -> AssetResult<Path> {
    PathBuilder::from_oval(bounds)
        .ok_or_else(|| AssetError::render("ellipse", format!("degenerate bounds {bounds:?}")))
}
