//! Title, `<meta>` tags and URL query parameters.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use url::Url;

use super::dom::{collapse_whitespace, visible_text};

/// Trimmed `<title>` text, `None` when missing or blank.
pub(crate) fn extract_title(document: &Html) -> Option<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "title")
        .map(visible_text)
        .filter(|t| !t.is_empty())
}

/// `<meta>` tags carrying `name` or `property` plus `content`.
///
/// When a key repeats, the tag appearing last in the document wins.
pub(crate) fn extract_metadata(document: &Html) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for meta in document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "meta")
    {
        let element = meta.value();
        let key = element.attr("name").or_else(|| element.attr("property"));
        if let (Some(key), Some(content)) = (key, element.attr("content")) {
            let key = key.trim();
            if !key.is_empty() {
                metadata.insert(key.to_string(), collapse_whitespace(content));
            }
        }
    }
    metadata
}

/// Query parameters of `source_url`; repeated keys keep the last value.
///
/// An unparsable URL yields an empty map.
pub(crate) fn extract_url_parameters(source_url: &str) -> BTreeMap<String, String> {
    Url::parse(source_url)
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default()
}
