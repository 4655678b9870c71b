//! A launched Chrome with its CDP event task and throwaway profile

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::BrowserConfig;
use crate::browser_setup::launch_chrome;

pub(crate) struct RunningBrowser {
    browser: Browser,
    events: JoinHandle<()>,
    /// `None` once the profile has been removed
    profile_dir: Option<PathBuf>,
}

impl RunningBrowser {
    /// Launch Chrome with a per-process profile directory
    ///
    /// The directory is removed again if the launch fails.
    pub(crate) async fn launch(config: &BrowserConfig) -> Result<Self> {
        let profile_dir =
            std::env::temp_dir().join(format!("fitflix_seo_profile_{}", std::process::id()));
        tokio::fs::create_dir_all(&profile_dir)
            .await
            .with_context(|| format!("Failed to create profile {}", profile_dir.display()))?;

        match launch_chrome(config, &profile_dir).await {
            Ok((browser, events)) => Ok(Self {
                browser,
                events,
                profile_dir: Some(profile_dir),
            }),
            Err(e) => {
                remove_profile(&profile_dir);
                Err(e)
            }
        }
    }

    /// `Browser.getVersion` round trip
    pub(crate) async fn is_responsive(&self) -> bool {
        match self.browser.version().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Chrome health check failed: {e}");
                false
            }
        }
    }

    /// Close every open tab and return a new `about:blank` page
    pub(crate) async fn fresh_page(&self) -> Result<Page> {
        if let Ok(pages) = self.browser.pages().await {
            for page in pages {
                let _ = page.close().await;
            }
        }
        self.browser
            .new_page("about:blank")
            .await
            .context("Failed to open a blank page")
    }

    /// Close Chrome, wait for the process to exit and remove the profile
    ///
    /// Failures are logged only; a crashed process cannot be closed.
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close Chrome cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for Chrome to exit: {e}");
        }
        if let Some(dir) = self.profile_dir.take() {
            remove_profile(&dir);
        }
    }
}

impl Drop for RunningBrowser {
    fn drop(&mut self) {
        self.events.abort();
        if let Some(dir) = &self.profile_dir {
            warn!(
                "Chrome dropped without BrowserSession::shutdown(); profile left at {}",
                dir.display()
            );
        }
    }
}

fn remove_profile(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!("Removed Chrome profile {}", dir.display()),
        Err(e) => warn!("Failed to remove Chrome profile {}: {e}", dir.display()),
    }
}
