//! Timeout validation for page navigation

use std::time::Duration;

use crate::browser::{BrowserError, BrowserResult};

/// Slow sites and heavy SPAs included
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Validate a navigation timeout, falling back to `default_ms`
///
/// # Errors
/// `BrowserError::InvalidArgument` when the timeout exceeds
/// `MAX_NAVIGATION_TIMEOUT_MS` or is zero.
pub fn validate_navigation_timeout(timeout_ms: Option<u64>, default_ms: u64) -> BrowserResult<Duration> {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms == 0 {
        return Err(BrowserError::InvalidArgument(
            "Timeout must be greater than 0ms".to_string(),
        ));
    }

    if ms > MAX_NAVIGATION_TIMEOUT_MS {
        return Err(BrowserError::InvalidArgument(format!(
            "Timeout cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            ms,
            ms as f64 / 60_000.0
        )));
    }

    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default() {
        assert_eq!(
            validate_navigation_timeout(None, 30_000).unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            validate_navigation_timeout(Some(45_000), 30_000).unwrap(),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            validate_navigation_timeout(Some(MAX_NAVIGATION_TIMEOUT_MS + 1), 30_000),
            Err(BrowserError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_navigation_timeout(Some(0), 30_000),
            Err(BrowserError::InvalidArgument(_))
        ));
        assert!(validate_navigation_timeout(Some(MAX_NAVIGATION_TIMEOUT_MS), 30_000).is_ok());
    }
}
