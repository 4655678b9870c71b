//! Head state backed by a live browser page
//!
//! Every operation is a single `Page::evaluate` round trip. The page must be
//! loaded (it needs a `document.head`) before the manager touches it.

use async_trait::async_trait;
use chromiumoxide::Page;
use serde_json::Value;
use tracing::trace;

use super::{HeadState, TagKey, js_scripts};
use crate::browser::{BrowserError, BrowserResult};

#[derive(Clone)]
pub struct PageHead {
    page: Page,
}

impl PageHead {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn eval(&self, script: &str) -> BrowserResult<Option<Value>> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?;
        Ok(result.value().cloned())
    }
}

#[async_trait]
impl HeadState for PageHead {
    type Error = BrowserError;

    async fn title(&self) -> BrowserResult<String> {
        match self.eval(js_scripts::READ_TITLE).await? {
            Some(Value::String(title)) => Ok(title),
            _ => Ok(String::new()),
        }
    }

    async fn set_title(&mut self, title: &str) -> BrowserResult<()> {
        self.eval(&js_scripts::set_title(title)).await?;
        trace!("document.title <- {title}");
        Ok(())
    }

    async fn page_url(&self) -> BrowserResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("Failed to get URL: {e}")))?;
        Ok(url.unwrap_or_default())
    }

    async fn content(&self, key: &TagKey) -> BrowserResult<Option<String>> {
        match self.eval(&js_scripts::read_tag(key)).await? {
            Some(Value::String(content)) => Ok(Some(content)),
            _ => Ok(None),
        }
    }

    async fn upsert(&mut self, key: &TagKey, value: &str) -> BrowserResult<()> {
        self.eval(&js_scripts::upsert_tag(key, value)).await?;
        trace!("{key} <- {value}");
        Ok(())
    }
}
