//! Service layer
//!
//! Services own shared state and orchestrate the lower layers (fetching,
//! bundled assets, rendering). They are constructed once at the composition
//! root and passed around behind `Arc`.

pub mod asset_cache;

pub use asset_cache::{AssetCache, AssetCacheBuilder, CacheKey, CacheStats};
