//! Decoded or rendered raster images held by the cache

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::errors::{AssetError, AssetResult};

/// An immutable RGBA pixel buffer with its dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Decode encoded image bytes (PNG, JPEG, GIF, WebP)
    pub fn decode(bytes: &[u8], source_name: &str) -> AssetResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::decode(source_name, e.to_string()))?;
        Ok(Self::from_image(image.to_rgba8()))
    }

    /// Convert a tiny-skia surface (premultiplied) into straight-alpha RGBA
    pub fn from_pixmap(pixmap: &tiny_skia::Pixmap) -> AssetResult<Self> {
        let mut raw = Vec::with_capacity(pixmap.data().len());
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }

        RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
            .map(Self::from_image)
            .ok_or_else(|| AssetError::render("bitmap", "pixel buffer does not match surface size"))
    }

    /// Stretch-to-fit resize into exactly `width` × `height` pixels
    ///
    /// The aspect ratio of the source is not preserved.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if self.image.dimensions() == (width, height) {
            return self.clone();
        }
        Self::from_image(imageops::resize(&self.image, width, height, FilterType::Triangle))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Approximate heap footprint of the pixel buffer
    pub fn byte_size(&self) -> usize {
        self.image.as_raw().len()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut png_bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
        Ok(png_bytes)
    }
}
