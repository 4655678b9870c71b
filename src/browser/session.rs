//! One Chrome per session, launched on first use
//!
//! The slot sits behind a `tokio::sync::Mutex` because it stays locked
//! across CDP round trips. Every page request health-checks the running
//! browser and relaunches it after a crash.

use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::running::RunningBrowser;
use super::{BrowserError, BrowserResult};
use crate::BrowserConfig;
use crate::utils::{validate_navigation_timeout, wait_for_element};

pub struct BrowserSession {
    config: BrowserConfig,
    running: Mutex<Option<RunningBrowser>>,
}

impl BrowserSession {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            running: Mutex::new(None),
        }
    }

    async fn ensure_running<'s>(
        &self,
        slot: &'s mut Option<RunningBrowser>,
    ) -> BrowserResult<&'s RunningBrowser> {
        if let Some(running) = slot.take() {
            if running.is_responsive().await {
                return Ok(&*slot.insert(running));
            }
            warn!("Chrome stopped responding, relaunching");
            running.close().await;
        }

        info!("Launching Chrome");
        let running = RunningBrowser::launch(&self.config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(format!("{e:#}")))?;
        Ok(&*slot.insert(running))
    }

    /// Load `url` as the session's only page
    ///
    /// `timeout_ms` bounds navigation and the optional selector wait; it
    /// defaults to `browser.navigation_timeout_ms`. Client-rendered pages
    /// usually write their head after the load event, which is what
    /// `wait_for_selector` is for.
    pub async fn open_page(
        &self,
        url: &str,
        timeout_ms: Option<u64>,
        wait_for_selector: Option<&str>,
    ) -> BrowserResult<Page> {
        let parsed = url::Url::parse(url)
            .map_err(|e| BrowserError::InvalidArgument(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BrowserError::InvalidArgument(format!(
                "Only http(s) pages can be opened, got {url}"
            )));
        }
        let timeout = validate_navigation_timeout(timeout_ms, self.config.navigation_timeout_ms)?;

        let mut slot = self.running.lock().await;
        let running = self.ensure_running(&mut slot).await?;
        let page = running
            .fresh_page()
            .await
            .map_err(|e| BrowserError::PageCreationFailed(format!("{e:#}")))?;

        let load = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        };
        match tokio::time::timeout(timeout, load).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(BrowserError::NavigationFailed(format!("{url}: {e}"))),
            Err(_) => {
                return Err(BrowserError::Timeout(format!(
                    "{url} did not load within {}ms",
                    timeout.as_millis()
                )));
            }
        }
        drop(slot);

        if let Some(selector) = wait_for_selector {
            wait_for_element(&page, selector, timeout).await?;
        }

        info!("Opened {url}");
        Ok(page)
    }

    /// Close Chrome and remove its profile; later calls do nothing
    ///
    /// Must be awaited before exit: dropping the session only aborts the
    /// event task and leaves the Chrome process behind.
    pub async fn shutdown(&self) {
        let running = self.running.lock().await.take();
        if let Some(running) = running {
            info!("Shutting down Chrome");
            running.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_http_urls_without_launching() {
        let session = BrowserSession::new(BrowserConfig::default());

        for url in ["file:///etc/hosts", "about:blank", "not a url"] {
            let err = session.open_page(url, None, None).await.unwrap_err();
            assert!(matches!(err, BrowserError::InvalidArgument(_)), "{url}: {err}");
        }
        assert!(session.running.lock().await.is_none());
    }

    #[tokio::test]
    async fn rejects_zero_timeout_without_launching() {
        let session = BrowserSession::new(BrowserConfig::default());
        let err = session
            .open_page("https://fitflix.in/", Some(0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::InvalidArgument(_)));
        assert!(session.running.lock().await.is_none());
    }
}
