//! Logical sizes requested by UI callers

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width × height in logical points
///
/// Both dimensions are clamped to at least 1 so every drawing surface derived
/// from a `Size` can be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Size {
    width: u32,
    height: u32,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid size '{input}': expected WIDTHxHEIGHT, e.g. 100x50")]
pub struct SizeParseError {
    input: String,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel dimensions of this size at the given render scale
    pub fn to_pixels(&self, scale: f32) -> (u32, u32) {
        (scale_dimension(self.width as f32, scale), scale_dimension(self.height as f32, scale))
    }
}

/// Round a logical length up to whole pixels, never below one
pub fn scale_dimension(points: f32, scale: f32) -> u32 {
    let pixels = (points * scale).ceil();
    if pixels.is_finite() && pixels >= 1.0 {
        pixels.min(u32::MAX as f32) as u32
    } else {
        1
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SizeParseError {
            input: s.to_string(),
        };

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
        let width = w.trim().parse::<u32>().map_err(|_| err())?;
        let height = h.trim().parse::<u32>().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self::new(width, height))
    }
}
