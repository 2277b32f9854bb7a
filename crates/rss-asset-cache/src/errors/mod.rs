//! Centralized error handling for the asset cache
//!
//! Two layers of errors exist:
//!
//! - **AssetError**: failures while populating a single cache entry (fetch,
//!   decode, bundled asset lookup, rasterization). The cache collapses these
//!   into an absent result for best-effort requests, so callers of the cache
//!   never see them directly.
//! - **AppError**: failures at the application edge (configuration, writing
//!   output files, serialization) used by the command-line front end.
//!
//! # Usage
//!
//! ```rust
//! use rss_asset_cache::errors::{AssetError, AssetResult};
//!
//! fn example_loader(name: &str) -> AssetResult<Vec<u8>> {
//!     Err(AssetError::missing(name))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for cache population Results
pub type AssetResult<T> = Result<T, AssetError>;
