//! Document head state: tag identities and the upsert contract
//!
//! `HeadState` is the single-writer table the manager mutates. Two
//! implementations ship with the crate:
//! - `MemoryHead`: in-process table, used for prerendering and tests
//! - `PageHead`: a live browser document driven over CDP

pub(crate) mod js_scripts;
mod memory;
mod page;

pub use memory::MemoryHead;
pub use page::PageHead;

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;

/// Element kind of a head tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKind {
    Meta,
    Link,
}

impl TagKind {
    pub fn element(self) -> &'static str {
        match self {
            TagKind::Meta => "meta",
            TagKind::Link => "link",
        }
    }

    /// Attribute holding the tag's value
    pub fn value_attr(self) -> &'static str {
        match self {
            TagKind::Meta => "content",
            TagKind::Link => "href",
        }
    }
}

/// Attribute that tells tags of the same kind apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyAttr {
    Name,
    Property,
    Rel,
}

impl KeyAttr {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyAttr::Name => "name",
            KeyAttr::Property => "property",
            KeyAttr::Rel => "rel",
        }
    }
}

/// Discriminating key of a head tag, e.g. `meta[name="description"]`
///
/// At most one tag per key may exist in a head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
    kind: TagKind,
    attr: KeyAttr,
    value: Cow<'static, str>,
}

impl TagKey {
    pub fn new(kind: TagKind, attr: KeyAttr, value: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            attr,
            value: value.into(),
        }
    }

    /// `meta[name=...]`
    pub fn name(value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TagKind::Meta, KeyAttr::Name, value)
    }

    /// `meta[property=...]`
    pub fn property(value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TagKind::Meta, KeyAttr::Property, value)
    }

    /// `link[rel=...]`
    pub fn rel(value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TagKind::Link, KeyAttr::Rel, value)
    }

    pub fn canonical() -> Self {
        Self::rel("canonical")
    }

    pub fn robots() -> Self {
        Self::name("robots")
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn attr(&self) -> KeyAttr {
        self.attr
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for TagKey {
    /// Formats as a CSS attribute selector
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}=\"{}\"]",
            self.kind.element(),
            self.attr.as_str(),
            self.value.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

/// Shared head metadata table
///
/// Implementations must look a key up before creating it: `upsert` never
/// produces a second tag for a key that already exists. Tags are never
/// removed through this trait.
#[async_trait]
pub trait HeadState: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn title(&self) -> Result<String, Self::Error>;

    async fn set_title(&mut self, title: &str) -> Result<(), Self::Error>;

    /// Absolute URL of the page this head belongs to
    async fn page_url(&self) -> Result<String, Self::Error>;

    /// Current value of the tag for `key`, if such a tag exists
    ///
    /// A tag with no value attribute yields `Some("")`.
    async fn content(&self, key: &TagKey) -> Result<Option<String>, Self::Error>;

    /// Update the tag for `key`, creating it on first use
    async fn upsert(&mut self, key: &TagKey, value: &str) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_as_selectors() {
        assert_eq!(
            TagKey::name("description").to_string(),
            r#"meta[name="description"]"#
        );
        assert_eq!(
            TagKey::property("og:title").to_string(),
            r#"meta[property="og:title"]"#
        );
        assert_eq!(TagKey::canonical().to_string(), r#"link[rel="canonical"]"#);
    }

    #[test]
    fn selector_escapes_quotes() {
        assert_eq!(
            TagKey::name(String::from("a\"b")).to_string(),
            r#"meta[name="a\"b"]"#
        );
    }

    #[test]
    fn kind_and_attr_both_discriminate() {
        assert_ne!(TagKey::name("og:title"), TagKey::property("og:title"));
        assert_ne!(TagKey::rel("canonical"), TagKey::name("canonical"));
        assert_eq!(TagKey::robots(), TagKey::name(String::from("robots")));
    }

    #[test]
    fn value_attr_follows_kind() {
        assert_eq!(TagKey::canonical().kind().value_attr(), "href");
        assert_eq!(TagKey::robots().kind().value_attr(), "content");
    }
}
