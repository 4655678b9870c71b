//! Browser infrastructure for applying and reading head metadata on live pages
//!
//! Launches a Chrome instance on demand and hands out loaded pages that
//! `PageHead` and the head snapshot extractor work against.

mod running;
mod session;

pub use session::BrowserSession;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;
