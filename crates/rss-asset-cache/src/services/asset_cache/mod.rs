//! In-memory asset cache for the article list UI
//!
//! Every asset the list renders goes through one shared [`AssetCache`]:
//!
//! - Remote images fetched over HTTP, decoded, and stretched to the requested size
//! - The bundled placeholder at any size
//! - Procedurally drawn tag badges and stock/comment icons
//!
//! Entries are keyed by [`CacheKey`], populated at most once per key even under
//! concurrent requests, and bounded by LRU eviction.

pub mod key;
pub mod service;

pub use key::CacheKey;
pub use service::{AssetCache, AssetCacheBuilder, CacheStats};
