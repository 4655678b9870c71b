//! Shared constants for browser-backed head operations

/// Default Chrome user agent
///
/// Pinned to a current stable Chrome so sites serve the same markup real
/// visitors get. Override per deployment with `browser.user_agent`.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Subdirectory of the user cache dir holding a downloaded Chromium
pub const MANAGED_BROWSER_CACHE_DIR: &str = "fitflix-seo/chromium";

pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
