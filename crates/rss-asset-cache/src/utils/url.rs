//! URL helpers used when logging remote image requests

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Query parameters whose values are treated as secrets
static CREDENTIAL_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<prefix>[?&](?:username|password|user|pass|pwd|passwd|token|key)=)[^&#]*")
        .expect("credential pattern is a valid regex")
});

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Mask credentials embedded in a URL so it can be logged safely
    ///
    /// Both userinfo (`user:pass@host`) and common credential query parameters
    /// are replaced with `****`.
    ///
    /// ```rust
    /// use rss_asset_cache::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::obfuscate_credentials("http://feed.example.com/a.png?token=abc"),
    ///     "http://feed.example.com/a.png?token=****"
    /// );
    /// ```
    pub fn obfuscate_credentials(url: &str) -> String {
        let masked = match Url::parse(url) {
            Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
                let _ = parsed.set_username("****");
                let _ = parsed.set_password(Some("****"));
                parsed.to_string()
            }
            _ => url.to_string(),
        };

        CREDENTIAL_PARAM
            .replace_all(&masked, "${prefix}****")
            .into_owned()
    }

    /// Whether the string parses as an absolute http(s) URL
    pub fn is_http_url(url: &str) -> bool {
        Url::parse(url)
            .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .unwrap_or(false)
    }
}
