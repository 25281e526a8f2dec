use scraper::{Html, Node};

use super::Extraction;
use crate::normalize::collapse_whitespace;

/// Elements whose text never renders on the page.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text extraction for tag-structured engine output (HTML and friends).
///
/// The payload is parsed as an HTML document; text nodes are kept in document
/// order and joined without a separator. Comments and text under hidden
/// elements are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupAdapter;

impl MarkupAdapter {
    pub fn extract_text(&self, markup: &str) -> String {
        let document = Html::parse_document(markup);
        let mut text = String::new();

        for node in document.tree.root().descendants() {
            let Node::Text(fragment) = node.value() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
                _ => false,
            });
            if !hidden {
                text.push_str(fragment);
            }
        }

        collapse_whitespace(&text)
    }

    pub(super) fn extract(&self, payload: &str) -> Extraction {
        Extraction {
            text: self.extract_text(payload),
            ..Extraction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_text(html: &str) -> String {
        MarkupAdapter.extract_text(html)
    }

    #[test]
    fn strips_script_style_and_comments() {
        let html = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><style>td { color: red; }</style>
<script type="text/javascript">var x = "<p>hidden</p>";</script></head>
<body><!-- engine note --><p>愛知県</p>
<p>名古屋市</p></body></html>"#;

        assert_eq!(extract_text(html), "愛知県 名古屋市");
    }

    #[test]
    fn concatenates_adjacent_text_nodes_without_separator() {
        let html = "<table><tr><td>A</td><td>B</td></tr></table><span>C</span>";
        assert_eq!(extract_text(html), "ABC");
    }

    #[test]
    fn decodes_character_references() {
        let html = "<p>a &amp; b &lt;c&gt; &#x41;&#66; &unknown; &nbsp;end</p>";
        assert_eq!(extract_text(html), "a & b <c> AB &unknown; end");
    }

    #[test]
    fn decodes_the_full_named_entity_table() {
        assert_eq!(extract_text("<p>&yen;100 &copy; &hellip;</p>"), "¥100 © …");
    }

    #[test]
    fn quoted_attribute_values_stay_inside_the_tag() {
        let html = r#"<p><img alt="a > b" src="x.png">本文</p>"#;
        assert_eq!(extract_text(html), "本文");
    }

    #[test]
    fn unclosed_script_swallows_the_rest_of_the_document() {
        assert_eq!(extract_text("<p>本文</p><script>var leak = 1;"), "本文");
    }

    #[test]
    fn keeps_bare_angle_brackets_that_are_not_tags() {
        assert_eq!(extract_text("<p>1 < 2</p>"), "1 < 2");
    }

    #[test]
    fn hidden_elements_match_case_insensitively() {
        let html = "<SCRIPT>alert(1)</SCRIPT><Style>p{}</Style>text";
        assert_eq!(extract_text(html), "text");
    }

    #[test]
    fn template_and_noscript_content_is_hidden() {
        let html = "<body><template><p>tpl</p></template><noscript>js off</noscript>見える</body>";
        assert_eq!(extract_text(html), "見える");
    }
}
