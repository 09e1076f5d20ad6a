//! Utility functions and helpers.

pub mod fs;
#[cfg(feature = "opengraph")]
pub mod http;

use chrono::Local;
use url::Url;

/// Format used for creation timestamps on resources and sections.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y:%H:%M:%S";

/// Current local time as a creation timestamp.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}
