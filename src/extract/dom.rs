//! Small DOM helpers shared by the extractors.

use scraper::node::Node;
use scraper::ElementRef;

/// Elements whose text never counts as page content.
const NON_CONTENT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Collapses every whitespace run (including NBSP and U+3000) to one space and trims.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn is_non_content(element: ElementRef<'_>) -> bool {
    NON_CONTENT_ELEMENTS.contains(&element.value().name())
}

/// Direct element children of `element`.
pub(crate) fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Visible descendant text of `element`, whitespace collapsed.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    push_visible_text(element, &mut fragments);
    collapse_whitespace(&fragments.concat())
}

pub(crate) fn push_visible_text<'a>(element: ElementRef<'a>, fragments: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => fragments.push(&**text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child)
                    && !is_non_content(child)
                {
                    push_visible_text(child, fragments);
                }
            }
            _ => {}
        }
    }
}

/// Heading level for `h1`..`h6`.
pub(crate) fn heading_level(element: ElementRef<'_>) -> Option<u8> {
    match element.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn test_collapse_whitespace_handles_unicode_spaces() {
        assert_eq!(collapse_whitespace("  1.0235\u{a0}\u{3000} 元\n"), "1.0235 元");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let html = Html::parse_fragment("<div>Net <script>var x = 1;</script><b>value</b> 1.<i>02</i></div>");
        let div = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "div")
            .unwrap();
        assert_eq!(visible_text(div), "Net value 1.02");
    }
}
