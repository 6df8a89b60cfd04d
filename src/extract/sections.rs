//! Content sections grouped by heading.

use scraper::node::Node;
use scraper::{ElementRef, Html};

use super::dom::{collapse_whitespace, heading_level, is_non_content, push_visible_text};
use super::snapshot::Section;

enum Block {
    Text(String),
    Heading { level: u8, text: String },
}

/// Groups body text under headings.
///
/// A heading's section runs until the next heading of the same or a higher
/// level, so an `h2` section also contains the `h3` blocks nested under it.
pub(crate) fn extract_sections(document: &Html) -> Vec<Section> {
    let root = body_or_root(document);
    let mut blocks = Vec::new();
    flatten(root, &mut blocks);

    let mut sections = Vec::new();
    let first_heading = blocks
        .iter()
        .position(|b| matches!(b, Block::Heading { .. }))
        .unwrap_or(blocks.len());

    let preamble = join_text(&blocks[..first_heading]);
    if !preamble.is_empty() || first_heading == blocks.len() {
        sections.push(Section {
            heading: String::new(),
            text: preamble,
        });
    }

    for (position, block) in blocks.iter().enumerate().skip(first_heading) {
        let Block::Heading { level, text } = block else {
            continue;
        };
        let end = blocks[position + 1..]
            .iter()
            .position(|b| matches!(b, Block::Heading { level: next, .. } if next <= level))
            .map_or(blocks.len(), |offset| position + 1 + offset);
        sections.push(Section {
            heading: text.clone(),
            text: join_text(&blocks[position + 1..end]),
        });
    }

    sections
}

fn body_or_root(document: &Html) -> ElementRef<'_> {
    let root = document.root_element();
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body")
        .unwrap_or(root)
}

fn flatten(element: ElementRef<'_>, blocks: &mut Vec<Block>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    blocks.push(Block::Text(text));
                }
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_non_content(child) {
                    continue;
                }
                if let Some(level) = heading_level(child) {
                    let mut fragments = Vec::new();
                    push_visible_text(child, &mut fragments);
                    blocks.push(Block::Heading {
                        level,
                        text: collapse_whitespace(&fragments.concat()),
                    });
                } else {
                    flatten(child, blocks);
                }
            }
            _ => {}
        }
    }
}

fn join_text(blocks: &[Block]) -> String {
    let parts: Vec<&str> = blocks
        .iter()
        .map(|b| match b {
            Block::Text(text) | Block::Heading { text, .. } => text.as_str(),
        })
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(html: &str) -> Vec<Section> {
        extract_sections(&Html::parse_document(html))
    }

    fn section(heading: &str, text: &str) -> Section {
        Section {
            heading: heading.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_no_headings_yields_single_body_section() {
        let s = sections("<body><p>产品说明</p><div>风险提示</div></body>");
        assert_eq!(s, vec![section("", "产品说明 风险提示")]);
    }

    #[test]
    fn test_empty_body_yields_single_empty_section() {
        assert_eq!(sections("<body></body>"), vec![section("", "")]);
    }

    #[test]
    fn test_preamble_section_before_first_heading() {
        let s = sections("<body><p>intro</p><h2>净值</h2><p>table</p></body>");
        assert_eq!(s, vec![section("", "intro"), section("净值", "table")]);
    }

    #[test]
    fn test_equal_level_heading_ends_section() {
        let s = sections("<h2>A</h2><p>a</p><h2>B</h2><p>b</p>");
        assert_eq!(s, vec![section("A", "a"), section("B", "b")]);
    }

    #[test]
    fn test_lower_level_heading_stays_inside_parent_section() {
        let s = sections("<h1>Top</h1><p>t</p><h3>Sub</h3><p>s</p><h1>Next</h1>");
        assert_eq!(
            s,
            vec![
                section("Top", "t Sub s"),
                section("Sub", "s"),
                section("Next", ""),
            ]
        );
    }

    #[test]
    fn test_heading_without_text_is_kept() {
        let s = sections("<h2>Empty</h2><h2>Full</h2><p>x</p>");
        assert_eq!(s[0], section("Empty", ""));
    }

    #[test]
    fn test_script_and_style_text_ignored() {
        let s = sections(
            "<head><style>td{}</style></head><body><script>load()</script>\
             <p>visible</p><noscript>enable js</noscript></body>",
        );
        assert_eq!(s, vec![section("", "visible")]);
    }
}
