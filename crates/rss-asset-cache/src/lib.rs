//! Bounded in-memory cache of the images an RSS article list renders
//!
//! Remote thumbnails, the bundled placeholder, and procedurally drawn badges
//! and icons are all served from one [`AssetCache`], constructed at the
//! composition root and shared behind an `Arc`.

pub mod assets;
pub mod config;
pub mod errors;
pub mod models;
pub mod rendering;
pub mod services;
pub mod utils;

pub use config::Config;
pub use errors::{AppError, AppResult, AssetError, AssetResult};
pub use models::{Bitmap, Size};
pub use services::{AssetCache, AssetCacheBuilder, CacheKey, CacheStats};
