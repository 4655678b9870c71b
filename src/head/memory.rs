//! In-memory head table
//!
//! Holds the same tag-upsert contract as a browser document without one.
//! Used to prerender a route's head fragment and as the test double for
//! the manager.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::convert::Infallible;
use std::fmt::Write;

use super::{HeadState, TagKey};

#[derive(Debug, Clone, Default)]
pub struct MemoryHead {
    title: String,
    url: String,
    tags: IndexMap<TagKey, String>,
    writes: usize,
}

impl MemoryHead {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Simulate client-side navigation to another URL
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn current_title(&self) -> &str {
        &self.title
    }

    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Tags in creation order
    pub fn tags(&self) -> impl Iterator<Item = (&TagKey, &str)> {
        self.tags.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Number of title and tag writes since creation
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Render the head as an HTML fragment, one element per line
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<title>{}</title>", escape_html(&self.title));
        for (key, value) in &self.tags {
            let _ = writeln!(
                out,
                "<{} {}=\"{}\" {}=\"{}\">",
                key.kind().element(),
                key.attr().as_str(),
                escape_html(key.value()),
                key.kind().value_attr(),
                escape_html(value)
            );
        }
        out
    }
}

#[async_trait]
impl HeadState for MemoryHead {
    type Error = Infallible;

    async fn title(&self) -> Result<String, Infallible> {
        Ok(self.title.clone())
    }

    async fn set_title(&mut self, title: &str) -> Result<(), Infallible> {
        self.title = title.to_string();
        self.writes += 1;
        Ok(())
    }

    async fn page_url(&self) -> Result<String, Infallible> {
        Ok(self.url.clone())
    }

    async fn content(&self, key: &TagKey) -> Result<Option<String>, Infallible> {
        Ok(self.tags.get(key).cloned())
    }

    async fn upsert(&mut self, key: &TagKey, value: &str) -> Result<(), Infallible> {
        match self.tags.get_mut(key) {
            Some(existing) => {
                existing.clear();
                existing.push_str(value);
            }
            None => {
                self.tags.insert(key.clone(), value.to_string());
            }
        }
        self.writes += 1;
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
