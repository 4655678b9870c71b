//! Element polling for client-rendered pages
//!
//! SPAs write their head tags after the load event fires, so a snapshot
//! taken right after navigation can miss them.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::element::Element;

use crate::browser::{BrowserError, BrowserResult};

/// Poll for `selector` with exponential backoff until `timeout`
///
/// Starts at 100ms, doubles per retry, capped at 1s between polls.
pub async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> BrowserResult<Element> {
    let start = std::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }

        if start.elapsed() >= timeout {
            return Err(BrowserError::Timeout(format!(
                "Element '{}' did not appear within {}ms",
                selector,
                timeout.as_millis()
            )));
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(max_interval);
    }
}
