//! Error type definitions for the asset cache

use thiserror::Error;

/// Failures that can occur while producing a single cache entry
#[derive(Error, Debug)]
pub enum AssetError {
    /// Transport-level failure (DNS, connect, TLS, reset)
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },

    /// The server answered with a non-success status
    #[error("HTTP error: {url} returned {status}")]
    HttpStatus { url: String, status: u16 },

    /// The server answered successfully but sent nothing
    #[error("Empty response body: {url}")]
    EmptyBody { url: String },

    /// Bytes were retrieved but are not a decodable image
    #[error("Decode failed: {source_name} - {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// A bundled asset is absent from the package
    #[error("Bundled asset missing: {name}")]
    AssetMissing { name: String },

    /// The raster pipeline could not produce a surface or path
    #[error("Render failed: {what} - {message}")]
    Render { what: String, message: String },

    /// Filesystem errors from directory-backed bundles
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache population errors surfaced at the application edge
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Image encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AssetError {
    /// Create a transport failure for a URL
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode failure
    pub fn decode<S: Into<String>, M: Into<String>>(source_name: S, message: M) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a missing bundled asset error
    pub fn missing<S: Into<String>>(name: S) -> Self {
        Self::AssetMissing { name: name.into() }
    }

    /// Create a rasterization failure
    pub fn render<W: Into<String>, M: Into<String>>(what: W, message: M) -> Self {
        Self::Render {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened in the raster pipeline rather than in I/O
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. })
    }
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
