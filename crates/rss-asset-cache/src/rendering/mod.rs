//! Procedural rasterization of badges and icons

pub mod canvas;
pub mod recipes;
pub mod text;

pub use canvas::Canvas;
pub use recipes::AssetRenderer;
pub use text::{BitmapFontRenderer, TextMetrics, TextRenderer};
