use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Bounding policy for the in-memory cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries held at once (default: 200)
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

/// Remote image fetcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(
        default = "default_connect_timeout",
        with = "duration_serde::duration"
    )]
    pub connect_timeout: Duration,

    /// Total request timeout; unset means a slow server is waited on indefinitely
    #[serde(
        default,
        with = "duration_serde::option_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout: Option<Duration>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Procedural drawing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixels per logical point (1.0 = 1x, 2.0 = retina)
    #[serde(default = "default_render_scale")]
    pub scale: f32,

    /// Point size of the tag badge font
    #[serde(default = "default_tag_font_size")]
    pub tag_font_size: f32,
}

/// Bundled asset lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Name of the placeholder image inside the bundle
    #[serde(default = "default_placeholder_asset")]
    pub placeholder: String,

    /// Serve bundled assets from this directory instead of the embedded set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_dir: Option<PathBuf>,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_render_scale() -> f32 {
    DEFAULT_RENDER_SCALE
}

fn default_tag_font_size() -> f32 {
    DEFAULT_TAG_FONT_SIZE
}

fn default_placeholder_asset() -> String {
    DEFAULT_PLACEHOLDER_ASSET.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: default_render_scale(),
            tag_font_size: default_tag_font_size(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder_asset(),
            bundle_dir: None,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("cache.capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(format!(
                "render.scale must be a positive number, got {}",
                self.scale
            ));
        }
        if !self.tag_font_size.is_finite() || self.tag_font_size <= 0.0 {
            return Err(format!(
                "render.tag_font_size must be a positive number, got {}",
                self.tag_font_size
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            info!("Config file {} not found, using defaults", config_file);
            Self::default()
        };
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;
        self.render.validate()?;
        if self.assets.placeholder.trim().is_empty() {
            return Err("assets.placeholder must name a bundled asset".to_string());
        }
        Ok(())
    }
}
