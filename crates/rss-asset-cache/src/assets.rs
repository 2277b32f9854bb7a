use async_trait::async_trait;
use rust_embed::RustEmbed;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::errors::{AssetError, AssetResult};

/// Images shipped inside the binary (placeholder artwork)
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct BundledAssets;

/// Lookup of packaged assets by logical name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetBundle: Send + Sync {
    /// Load the raw bytes of a bundled asset
    async fn load(&self, name: &str) -> AssetResult<Vec<u8>>;
}

/// Serves assets compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl EmbeddedAssets {
    /// List all available bundled assets
    pub fn list_assets() -> impl Iterator<Item = std::borrow::Cow<'static, str>> {
        BundledAssets::iter()
    }
}

#[async_trait]
impl AssetBundle for EmbeddedAssets {
    async fn load(&self, name: &str) -> AssetResult<Vec<u8>> {
        BundledAssets::get(name)
            .map(|file| file.data.into_owned())
            .ok_or_else(|| AssetError::missing(name))
    }
}

/// Serves assets from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a logical name below the root, refusing anything that could escape it
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let mut components = relative.components().peekable();
        components.peek()?;
        if components.all(|c| matches!(c, Component::Normal(_))) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

#[async_trait]
impl AssetBundle for DirectoryAssets {
    async fn load(&self, name: &str) -> AssetResult<Vec<u8>> {
        let Some(path) = self.resolve(name) else {
            debug!("Rejected bundled asset name outside bundle root: {}", name);
            return Err(AssetError::missing(name));
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AssetError::missing(name)),
            Err(e) => Err(AssetError::Io(e)),
        }
    }
}
