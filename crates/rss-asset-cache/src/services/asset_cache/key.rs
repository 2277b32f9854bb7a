//! Structured cache keys

use std::fmt;

use crate::models::Size;

/// Identity of a cacheable asset
///
/// Every parameter that changes the produced pixels is part of the key, so two
/// keys compare equal exactly when they would render identical bitmaps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    RemoteImage { url: String, size: Option<Size> },
    Placeholder { size: Size },
    TagBadge { text: String },
    StockIcon { size: Size },
    CommentIcon { size: Size },
}

impl CacheKey {
    pub fn remote_image(url: &str, size: Option<Size>) -> Self {
        Self::RemoteImage {
            url: url.to_string(),
            size,
        }
    }

    pub fn tag_badge(text: &str) -> Self {
        Self::TagBadge {
            text: text.to_string(),
        }
    }

    /// Short name of the asset kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteImage { .. } => "remote-image",
            Self::Placeholder { .. } => "placeholder",
            Self::TagBadge { .. } => "tag",
            Self::StockIcon { .. } => "stock-icon",
            Self::CommentIcon { .. } => "comment-icon",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteImage { url, size: None } => write!(f, "{}:{}", self.kind(), url),
            Self::RemoteImage {
                url,
                size: Some(size),
            } => write!(f, "{}:{}@{}", self.kind(), url, size),
            Self::TagBadge { text } => write!(f, "{}:{}", self.kind(), text),
            Self::Placeholder { size } | Self::StockIcon { size } | Self::CommentIcon { size } => {
                write!(f, "{}:{}", self.kind(), size)
            }
        }
    }
}
