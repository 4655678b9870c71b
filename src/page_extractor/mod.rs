//! Head metadata extraction from live pages
//!
//! Reads back what crawlers and link unfurlers see, using JavaScript
//! evaluation against the loaded document.

pub mod page_info;

pub use page_info::{HeadSnapshot, SnapshotIssue, SnapshotTag, extract_head_snapshot};
