/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Cache defaults
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

// HTTP fetcher defaults
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("rss-asset-cache/", env!("CARGO_PKG_VERSION"));

// Rendering defaults
pub const DEFAULT_RENDER_SCALE: f32 = 1.0;
pub const DEFAULT_TAG_FONT_SIZE: f32 = 14.0;

// Bundled asset defaults
pub const DEFAULT_PLACEHOLDER_ASSET: &str = "placeholder.png";
