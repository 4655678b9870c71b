//! JavaScript snippets evaluated against a live document head
//!
//! Arguments are embedded as JSON literals, which are valid JS string
//! expressions, so no value can break out of its argument position.

use super::TagKey;

/// Look up the tag for a key and return its value
///
/// `null` only when no tag carries the key; a tag without a value attribute
/// reads as `''`.
const READ_TAG: &str = r#"(function(tag, attr, key, valueAttr) {
    var found = null;
    document.head.querySelectorAll(tag + '[' + attr + ']').forEach(function(el) {
        if (found === null && el.getAttribute(attr) === key) {
            found = el.getAttribute(valueAttr) || '';
        }
    });
    return found;
})"#;

/// Update the first tag matching a key, creating it only when none exists
const UPSERT_TAG: &str = r#"(function(tag, attr, key, valueAttr, value) {
    var target = null;
    document.head.querySelectorAll(tag + '[' + attr + ']').forEach(function(el) {
        if (target === null && el.getAttribute(attr) === key) {
            target = el;
        }
    });
    if (target === null) {
        target = document.createElement(tag);
        target.setAttribute(attr, key);
        document.head.appendChild(target);
    }
    target.setAttribute(valueAttr, value);
    return true;
})"#;

/// Every keyed head tag plus the title, as the page currently exposes them
pub(crate) const HEAD_SNAPSHOT: &str = r#"(function() {
    var tags = [];
    document.head.querySelectorAll('meta[name], meta[property], link[rel]').forEach(function(el) {
        var tag = el.tagName.toLowerCase();
        var attr = tag === 'link' ? 'rel' : (el.hasAttribute('name') ? 'name' : 'property');
        if (tag === 'link' && el.getAttribute('rel') !== 'canonical') {
            return;
        }
        tags.push({
            kind: tag,
            attr: attr,
            key: el.getAttribute(attr),
            content: el.getAttribute(tag === 'link' ? 'href' : 'content') || ''
        });
    });
    return { title: document.title, url: window.location.href, tags: tags };
})()"#;

fn js_str(value: &str) -> String {
    // serde_json string escaping cannot fail for &str
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn read_tag(key: &TagKey) -> String {
    format!(
        "{}({}, {}, {}, {})",
        READ_TAG,
        js_str(key.kind().element()),
        js_str(key.attr().as_str()),
        js_str(key.value()),
        js_str(key.kind().value_attr()),
    )
}

pub(crate) fn upsert_tag(key: &TagKey, value: &str) -> String {
    format!(
        "{}({}, {}, {}, {}, {})",
        UPSERT_TAG,
        js_str(key.kind().element()),
        js_str(key.attr().as_str()),
        js_str(key.value()),
        js_str(key.kind().value_attr()),
        js_str(value),
    )
}

pub(crate) fn set_title(title: &str) -> String {
    format!("(function(t) {{ document.title = t; return true; }})({})", js_str(title))
}

pub(crate) const READ_TITLE: &str = "document.title";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_embeds_arguments_as_json() {
        let script = upsert_tag(&TagKey::property("og:title"), "Run \"fast\" </script>");
        assert!(script.starts_with(UPSERT_TAG));
        assert!(script.ends_with(
            r#"("meta", "property", "og:title", "content", "Run \"fast\" </script>")"#
        ));
    }

    #[test]
    fn link_tags_write_href() {
        let script = read_tag(&TagKey::canonical());
        assert!(script.ends_with(r#"("link", "rel", "canonical", "href")"#));
    }

    #[test]
    fn tag_without_value_reads_as_empty() {
        let script = read_tag(&TagKey::robots());
        assert!(script.contains("found = el.getAttribute(valueAttr) || '';"));
        assert!(script.ends_with(r#"("meta", "name", "robots", "content")"#));
    }

    #[test]
    fn title_script_escapes_newlines() {
        assert_eq!(
            set_title("a\nb"),
            r#"(function(t) { document.title = t; return true; })("a\nb")"#
        );
    }
}
