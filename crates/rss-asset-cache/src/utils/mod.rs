//! Utility modules shared across the crate

pub mod http_client;
pub mod url;

pub use http_client::{HttpImageFetcher, ImageFetcher};
pub use url::UrlUtils;
