//! Head metadata synchronization for Fitflix page views
//!
//! Applies each view's title, description, social-sharing and indexing
//! metadata to the document head, against an in-memory head or a live
//! browser page.

mod browser;
pub mod browser_setup;
pub mod head;
pub mod manager;
pub mod metadata;
pub mod page_extractor;
mod utils;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::metadata::MetadataError;
use crate::utils::constants::DEFAULT_NAVIGATION_TIMEOUT_MS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    /// Route (e.g. `/leaderboards`) to the metadata its view publishes
    #[serde(default)]
    pub pages: BTreeMap<String, MetadataRecord>,
}

/// Site-wide values the manager falls back to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_tagline")]
    pub tagline: String,

    /// og:image / twitter:image when a record names none
    #[serde(default = "default_fallback_og_image")]
    pub fallback_og_image: String,

    /// Origin that routes are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Chrome binary to launch; skips discovery when set
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Download a managed Chromium when no installed browser is found
    #[serde(default = "default_download")]
    pub download: bool,

    /// Chrome sandboxing; unset means on, except inside containers
    #[serde(default)]
    pub sandbox: Option<bool>,

    /// Appended after every built-in Chrome flag
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_app_name() -> String {
    "Fitflix".to_string()
}
fn default_tagline() -> String {
    "Your Ultimate Fitness Destination".to_string()
}
fn default_fallback_og_image() -> String {
    "/images/og-default.jpg".to_string()
}
fn default_base_url() -> String {
    "https://fitflix.in".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_disable_security() -> bool {
    false
}

fn default_download() -> bool {
    true
}

fn default_navigation_timeout_ms() -> u64 {
    DEFAULT_NAVIGATION_TIMEOUT_MS
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            browser: BrowserConfig::default(),
            pages: BTreeMap::new(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            tagline: default_tagline(),
            fallback_og_image: default_fallback_og_image(),
            base_url: default_base_url(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            user_agent: None,
            executable: None,
            download: default_download(),
            sandbox: None,
            extra_args: Vec::new(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl SiteConfig {
    /// Title restored when a view is torn down
    pub fn default_title(&self) -> String {
        format!("{} - {}", self.app_name, self.tagline)
    }

    /// Absolute URL of `route` on this site
    pub fn route_url(&self, route: &str) -> anyhow::Result<String> {
        let base = url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid site base_url: {}", self.base_url))?;
        let joined = base
            .join(route)
            .with_context(|| format!("Invalid route: {route}"))?;
        Ok(joined.to_string())
    }
}

impl Config {
    pub fn record_for(&self, route: &str) -> Result<&MetadataRecord, MetadataError> {
        self.pages
            .get(route)
            .ok_or_else(|| MetadataError::UnknownRoute(route.to_string()))
    }

    /// Check every catalog record
    pub fn validate(&self) -> anyhow::Result<()> {
        for (route, record) in &self.pages {
            record
                .validate()
                .with_context(|| format!("Invalid metadata for route {route}"))?;
        }
        Ok(())
    }
}

/// Load config from config.yaml in package root, or defaults if absent
pub fn load_yaml_config() -> anyhow::Result<Config> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.yaml");

    if config_path.exists() {
        load_yaml_config_from(&config_path)
    } else {
        Ok(Config::default())
    }
}

/// Load and validate config from an explicit file
pub fn load_yaml_config_from(path: &Path) -> anyhow::Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

pub use browser::{BrowserError, BrowserResult, BrowserSession};
pub use head::{HeadState, MemoryHead, PageHead, TagKey};
pub use manager::{ActiveView, SeoMetadataManager};
pub use metadata::MetadataRecord;
pub use page_extractor::{HeadSnapshot, SnapshotIssue, extract_head_snapshot};
