//! Head snapshots: what a crawler sees in a page's head
//!
//! A snapshot lists every keyed head tag in document order, duplicates
//! included, so it can expose a head that broke the one-tag-per-key rule.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SiteConfig;
use crate::head::{KeyAttr, MemoryHead, TagKey, TagKind, js_scripts};
use crate::metadata::{MetadataRecord, ROBOTS_ALLOW, RobotsDirective};

/// One keyed tag as found in the head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTag {
    /// `meta` or `link`
    pub kind: String,
    /// `name`, `property` or `rel`
    pub attr: String,
    pub key: String,
    pub content: String,
}

impl SnapshotTag {
    fn from_key(key: &TagKey, content: &str) -> Self {
        Self {
            kind: key.kind().element().to_string(),
            attr: key.attr().as_str().to_string(),
            key: key.value().to_string(),
            content: content.to_string(),
        }
    }

    /// `None` for element/attribute pairs this crate never writes
    pub fn tag_key(&self) -> Option<TagKey> {
        let kind = match self.kind.as_str() {
            "meta" => TagKind::Meta,
            "link" => TagKind::Link,
            _ => return None,
        };
        let attr = match (kind, self.attr.as_str()) {
            (TagKind::Meta, "name") => KeyAttr::Name,
            (TagKind::Meta, "property") => KeyAttr::Property,
            (TagKind::Link, "rel") => KeyAttr::Rel,
            _ => return None,
        };
        Some(TagKey::new(kind, attr, self.key.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSnapshot {
    pub url: String,
    pub title: String,
    pub tags: Vec<SnapshotTag>,
}

/// Difference between a snapshot and what an activation would have written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum SnapshotIssue {
    TitleMismatch { expected: String, found: String },
    Missing { key: String, expected: String },
    Mismatch { key: String, expected: String, found: String },
    Duplicate { key: String, count: usize },
}

impl fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotIssue::TitleMismatch { expected, found } => {
                write!(f, "title: expected {expected:?}, found {found:?}")
            }
            SnapshotIssue::Missing { key, expected } => {
                write!(f, "{key}: missing, expected {expected:?}")
            }
            SnapshotIssue::Mismatch { key, expected, found } => {
                write!(f, "{key}: expected {expected:?}, found {found:?}")
            }
            SnapshotIssue::Duplicate { key, count } => {
                write!(f, "{key}: {count} tags for one key")
            }
        }
    }
}

impl HeadSnapshot {
    pub fn from_memory(head: &MemoryHead) -> Self {
        Self {
            url: head.url().to_string(),
            title: head.current_title().to_string(),
            tags: head
                .tags()
                .map(|(key, content)| SnapshotTag::from_key(key, content))
                .collect(),
        }
    }

    /// Every value present for `key`, in document order
    pub fn values(&self, key: &TagKey) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.tag_key().as_ref() == Some(key))
            .map(|t| t.content.as_str())
            .collect()
    }

    /// First value for `key`, which is the one crawlers pick
    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.values(key).into_iter().next()
    }

    /// Keys carried by more than one tag, with their counts
    pub fn duplicates(&self) -> Vec<(TagKey, usize)> {
        let mut counts: indexmap::IndexMap<TagKey, usize> = indexmap::IndexMap::new();
        for key in self.tags.iter().filter_map(SnapshotTag::tag_key) {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts.into_iter().filter(|(_, n)| *n > 1).collect()
    }

    /// Compare against the head `record` should have produced on this page
    ///
    /// og:url is expected to equal the snapshot URL.
    pub fn verify(&self, record: &MetadataRecord, site: &SiteConfig) -> Vec<SnapshotIssue> {
        let resolved = record.resolve(&self.url, site);
        let mut issues = Vec::new();

        if self.title != resolved.title {
            issues.push(SnapshotIssue::TitleMismatch {
                expected: resolved.title.clone(),
                found: self.title.clone(),
            });
        }

        let mut expected: Vec<(TagKey, &str)> = resolved
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str()))
            .collect();
        for key in [TagKey::canonical(), TagKey::robots()] {
            if let Some(value) = resolved.expected(&key) {
                expected.push((key, value));
            }
        }
        if resolved.robots == RobotsDirective::AllowIfPresent && self.get(&TagKey::robots()).is_some() {
            expected.push((TagKey::robots(), ROBOTS_ALLOW));
        }

        for (key, want) in expected {
            match self.get(&key) {
                None => issues.push(SnapshotIssue::Missing {
                    key: key.to_string(),
                    expected: want.to_string(),
                }),
                Some(found) if found != want => issues.push(SnapshotIssue::Mismatch {
                    key: key.to_string(),
                    expected: want.to_string(),
                    found: found.to_string(),
                }),
                Some(_) => {}
            }
        }

        for (key, count) in self.duplicates() {
            issues.push(SnapshotIssue::Duplicate {
                key: key.to_string(),
                count,
            });
        }

        issues
    }
}

/// Read the title and every keyed head tag of a loaded page
pub async fn extract_head_snapshot(page: &Page) -> Result<HeadSnapshot> {
    let snapshot = page
        .evaluate(js_scripts::HEAD_SNAPSHOT)
        .await
        .context("Failed to evaluate head snapshot script")?
        .into_value::<HeadSnapshot>()
        .map_err(|e| anyhow::anyhow!("Failed to parse head snapshot: {e}"))?;

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::HeadState;
    use crate::manager::SeoMetadataManager;
    use pretty_assertions::assert_eq;

    fn tag(kind: &str, attr: &str, key: &str, content: &str) -> SnapshotTag {
        SnapshotTag {
            kind: kind.into(),
            attr: attr.into(),
            key: key.into(),
            content: content.into(),
        }
    }

    async fn activated(record: &MetadataRecord) -> HeadSnapshot {
        let mut manager =
            SeoMetadataManager::new(MemoryHead::new("https://fitflix.in/gyms"), SiteConfig::default());
        manager.activate(record).await.unwrap();
        HeadSnapshot::from_memory(manager.head())
    }

    #[tokio::test]
    async fn activated_head_verifies_clean() {
        let record = MetadataRecord::new("Gyms | Fitflix", "Find a gym")
            .with_canonical("https://fitflix.in/gyms")
            .with_noindex(true);
        let snapshot = activated(&record).await;

        let issues = snapshot.verify(&record, &SiteConfig::default());
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[tokio::test]
    async fn altered_tag_is_reported() {
        let record = MetadataRecord::new("Gyms | Fitflix", "Find a gym");
        let mut manager =
            SeoMetadataManager::new(MemoryHead::new("https://fitflix.in/gyms"), SiteConfig::default());
        manager.activate(&record).await.unwrap();
        let mut head = manager.into_head();
        head.upsert(&TagKey::property("og:title"), "Stale").await.unwrap();

        let issues = HeadSnapshot::from_memory(&head).verify(&record, &SiteConfig::default());
        assert_eq!(
            issues,
            vec![SnapshotIssue::Mismatch {
                key: r#"meta[property="og:title"]"#.into(),
                expected: "Gyms | Fitflix".into(),
                found: "Stale".into(),
            }]
        );
    }

    #[test]
    fn duplicates_and_missing_tags_are_reported() {
        let snapshot = HeadSnapshot {
            url: "https://fitflix.in/".into(),
            title: "Home".into(),
            tags: vec![
                tag("meta", "name", "description", "one"),
                tag("meta", "name", "description", "two"),
                tag("meta", "name", "robots", "noindex, nofollow"),
                tag("meta", "charset", "utf-8", ""),
            ],
        };
        let record = MetadataRecord::new("Home", "one");
        let issues = snapshot.verify(&record, &SiteConfig::default());

        assert!(issues.contains(&SnapshotIssue::Duplicate {
            key: r#"meta[name="description"]"#.into(),
            count: 2,
        }));
        assert!(issues.contains(&SnapshotIssue::Mismatch {
            key: r#"meta[name="robots"]"#.into(),
            expected: ROBOTS_ALLOW.into(),
            found: "noindex, nofollow".into(),
        }));
        assert!(issues.contains(&SnapshotIssue::Missing {
            key: r#"meta[property="og:title"]"#.into(),
            expected: "Home".into(),
        }));
        assert_eq!(snapshot.get(&TagKey::name("description")), Some("one"));
    }

    #[test]
    fn parses_script_output() {
        let json = serde_json::json!({
            "url": "https://fitflix.in/events",
            "title": "Events",
            "tags": [
                {"kind": "link", "attr": "rel", "key": "canonical", "content": "https://fitflix.in/events"}
            ]
        });
        let snapshot: HeadSnapshot = serde_json::from_value(json).unwrap();

        assert_eq!(
            snapshot.get(&TagKey::canonical()),
            Some("https://fitflix.in/events")
        );
        assert_eq!(
            SnapshotIssue::Duplicate { key: "k".into(), count: 3 }.to_string(),
            "k: 3 tags for one key"
        );
    }
}
