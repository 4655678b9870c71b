//! Page metadata records and their resolution into head tags
//!
//! A `MetadataRecord` is what a page view hands to the manager. Optional
//! social fields fall back to the required ones (or to site-wide defaults),
//! and `resolve()` turns the record into the exact tag table that gets
//! written on every activation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SiteConfig;
use crate::head::TagKey;

/// og:type written when the record does not name one
pub const DEFAULT_OG_TYPE: &str = "website";

/// twitter:card written when the record does not name one
pub const DEFAULT_TWITTER_CARD: &str = "summary_large_image";

/// robots content for pages that must stay out of search indexes
pub const ROBOTS_BLOCK: &str = "noindex, nofollow";

/// robots content written over an existing tag when indexing is allowed
pub const ROBOTS_ALLOW: &str = "index, follow";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Metadata field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("No metadata registered for route: {0}")]
    UnknownRoute(String),
}

/// Descriptive metadata a page view wants published in the document head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,

    /// Canonical URL. When absent, an existing canonical link is left alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,

    #[serde(default)]
    pub noindex: bool,
}

impl MetadataRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            keywords: None,
            og_title: None,
            og_description: None,
            og_image: None,
            og_type: None,
            twitter_card: None,
            canonical: None,
            noindex: false,
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_og_title(mut self, og_title: impl Into<String>) -> Self {
        self.og_title = Some(og_title.into());
        self
    }

    pub fn with_og_description(mut self, og_description: impl Into<String>) -> Self {
        self.og_description = Some(og_description.into());
        self
    }

    pub fn with_og_image(mut self, og_image: impl Into<String>) -> Self {
        self.og_image = Some(og_image.into());
        self
    }

    pub fn with_og_type(mut self, og_type: impl Into<String>) -> Self {
        self.og_type = Some(og_type.into());
        self
    }

    pub fn with_twitter_card(mut self, twitter_card: impl Into<String>) -> Self {
        self.twitter_card = Some(twitter_card.into());
        self
    }

    pub fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical = Some(canonical.into());
        self
    }

    pub fn with_noindex(mut self, noindex: bool) -> Self {
        self.noindex = noindex;
        self
    }

    /// Check the fields every record must carry
    ///
    /// The manager does not call this; records coming from the config
    /// catalog are checked once at load time.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.title.trim().is_empty() {
            return Err(MetadataError::EmptyField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(MetadataError::EmptyField("description"));
        }
        Ok(())
    }

    /// Resolve defaults and produce the full set of head writes
    ///
    /// `page_url` is the absolute URL of the page at activation time and
    /// becomes og:url verbatim.
    pub fn resolve(&self, page_url: &str, site: &SiteConfig) -> ResolvedHead {
        let og_title = self.og_title.as_deref().unwrap_or(&self.title);
        let og_description = self
            .og_description
            .as_deref()
            .unwrap_or(&self.description);
        let og_image = self
            .og_image
            .as_deref()
            .unwrap_or(&site.fallback_og_image);

        let tags = vec![
            (TagKey::name("description"), self.description.clone()),
            (
                TagKey::name("keywords"),
                self.keywords.clone().unwrap_or_default(),
            ),
            (TagKey::property("og:title"), og_title.to_string()),
            (TagKey::property("og:description"), og_description.to_string()),
            (
                TagKey::property("og:type"),
                self.og_type.as_deref().unwrap_or(DEFAULT_OG_TYPE).to_string(),
            ),
            (TagKey::property("og:image"), og_image.to_string()),
            (TagKey::property("og:url"), page_url.to_string()),
            (
                TagKey::name("twitter:card"),
                self.twitter_card
                    .as_deref()
                    .unwrap_or(DEFAULT_TWITTER_CARD)
                    .to_string(),
            ),
            (TagKey::name("twitter:title"), og_title.to_string()),
            (TagKey::name("twitter:description"), og_description.to_string()),
            (TagKey::name("twitter:image"), og_image.to_string()),
        ];

        let robots = if self.noindex {
            RobotsDirective::Block
        } else {
            RobotsDirective::AllowIfPresent
        };

        ResolvedHead {
            title: self.title.clone(),
            tags,
            canonical: self.canonical.clone(),
            robots,
        }
    }
}

/// What to do with `meta[name=robots]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsDirective {
    /// Create or overwrite with `noindex, nofollow`
    Block,
    /// Overwrite with `index, follow` only when the tag already exists
    AllowIfPresent,
}

/// A record with every default filled in, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHead {
    pub title: String,
    /// Tags overwritten on every activation, in write order
    pub tags: Vec<(TagKey, String)>,
    pub canonical: Option<String>,
    pub robots: RobotsDirective,
}

impl ResolvedHead {
    /// Expected content for a key, as far as this resolution decides it
    ///
    /// Returns `None` for keys the activation would leave untouched
    /// (absent canonical, robots when indexing is allowed).
    pub fn expected(&self, key: &TagKey) -> Option<&str> {
        if let Some((_, value)) = self.tags.iter().find(|(k, _)| k == key) {
            return Some(value);
        }
        if *key == TagKey::canonical() {
            return self.canonical.as_deref();
        }
        if *key == TagKey::robots() && self.robots == RobotsDirective::Block {
            return Some(ROBOTS_BLOCK);
        }
        None
    }
}
