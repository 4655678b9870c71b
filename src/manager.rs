//! Head metadata manager for page views
//!
//! Keeps a `HeadState` in line with the metadata of whichever view is
//! current.
//!
//! # Lifecycle
//!
//! - `activate(record)` once when a view becomes current, and again whenever
//!   its record changes. Every key of the resolved tag table is overwritten.
//! - `deactivate()` exactly once when the view goes away. Only the title is
//!   reset; every other tag keeps its last written value.
//!
//! `enter()` wraps both in an `ActiveView` that holds the manager's unique
//! borrow, so the next view cannot be entered before the previous one has
//! been torn down.
//!
//! # Redundant activations
//!
//! A record equal to the one already applied is skipped without touching
//! the head. The skip is an optimization only; writing again would leave
//! the same state.

use tracing::{debug, info, warn};

use crate::SiteConfig;
use crate::head::{HeadState, TagKey};
use crate::metadata::{MetadataRecord, ROBOTS_ALLOW, ROBOTS_BLOCK, RobotsDirective};

pub struct SeoMetadataManager<H: HeadState> {
    head: H,
    site: SiteConfig,
    applied: Option<MetadataRecord>,
}

impl<H: HeadState> SeoMetadataManager<H> {
    pub fn new(head: H, site: SiteConfig) -> Self {
        Self {
            head,
            site,
            applied: None,
        }
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    /// Mutable access to the head, e.g. to simulate navigation between views
    pub fn head_mut(&mut self) -> &mut H {
        &mut self.head
    }

    pub fn into_head(self) -> H {
        self.head
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Record currently applied, if a view is active
    pub fn applied(&self) -> Option<&MetadataRecord> {
        self.applied.as_ref()
    }

    /// Title written on teardown: `"<app_name> - <tagline>"`
    pub fn default_title(&self) -> String {
        self.site.default_title()
    }

    /// Write `record` into the head
    ///
    /// og:url is taken from the head's current page URL at this call.
    /// Canonical is only written when the record carries one, and an
    /// `index, follow` robots value is only written over an existing tag.
    pub async fn activate(&mut self, record: &MetadataRecord) -> Result<(), H::Error> {
        if self.applied.as_ref() == Some(record) {
            debug!("Metadata for '{}' already applied, skipping", record.title);
            return Ok(());
        }

        // Cleared until every write lands; a partial write is not an applied record
        self.applied = None;

        let page_url = self.head.page_url().await?;
        let resolved = record.resolve(&page_url, &self.site);

        self.head.set_title(&resolved.title).await?;
        for (key, value) in &resolved.tags {
            self.head.upsert(key, value).await?;
        }

        if let Some(canonical) = &resolved.canonical {
            self.head.upsert(&TagKey::canonical(), canonical).await?;
        }

        let robots = TagKey::robots();
        match resolved.robots {
            RobotsDirective::Block => {
                self.head.upsert(&robots, ROBOTS_BLOCK).await?;
            }
            RobotsDirective::AllowIfPresent => {
                if self.head.content(&robots).await?.is_some() {
                    self.head.upsert(&robots, ROBOTS_ALLOW).await?;
                }
            }
        }

        debug!(
            "Applied metadata for '{}' ({} tags, url {})",
            resolved.title,
            resolved.tags.len(),
            page_url
        );
        self.applied = Some(record.clone());
        Ok(())
    }

    /// Reset the title to the site default
    ///
    /// Description, social and canonical tags are left as last written.
    pub async fn deactivate(&mut self) -> Result<(), H::Error> {
        let title = self.default_title();
        self.head.set_title(&title).await?;
        self.applied = None;
        debug!("Head title reset to '{}'", title);
        Ok(())
    }

    /// Activate `record` and hand back a guard for the view's lifetime
    pub async fn enter(
        &mut self,
        record: &MetadataRecord,
    ) -> Result<ActiveView<'_, H>, H::Error> {
        self.activate(record).await?;
        info!("View entered: {}", record.title);
        Ok(ActiveView {
            manager: self,
            left: false,
        })
    }
}

/// A view that currently owns the head metadata
///
/// Call `leave()` when the view stops being current. Teardown is async, so
/// it cannot run from `Drop`; a view dropped without `leave()` keeps its
/// title in the head and logs a warning.
pub struct ActiveView<'m, H: HeadState> {
    manager: &'m mut SeoMetadataManager<H>,
    left: bool,
}

impl<H: HeadState> ActiveView<'_, H> {
    /// Re-apply after the view's record changed
    pub async fn update(&mut self, record: &MetadataRecord) -> Result<(), H::Error> {
        self.manager.activate(record).await
    }

    pub fn head(&self) -> &H {
        self.manager.head()
    }

    pub fn record(&self) -> Option<&MetadataRecord> {
        self.manager.applied()
    }

    /// Stop tracking the view and leave the head exactly as written
    ///
    /// For one-shot runs (prerendering, inspection) where no next view
    /// follows.
    pub fn detach(mut self) {
        self.left = true;
    }

    /// Tear the view down, resetting the title
    pub async fn leave(mut self) -> Result<(), H::Error> {
        self.left = true;
        self.manager.deactivate().await
    }
}

impl<H: HeadState> Drop for ActiveView<'_, H> {
    fn drop(&mut self) {
        if !self.left {
            warn!(
                "View dropped without leave(); head title stays at '{}'. \
                 Call ActiveView::leave() when the view stops being current.",
                self.manager
                    .applied()
                    .map(|r| r.title.as_str())
                    .unwrap_or_default()
            );
        }
    }
}
