//! HTML serializer for output nodes.
//!
//! Follows the usual HTML5 serialization rules:
//!
//! - Void elements never get end tags
//! - Text content is escaped
//! - Attribute values are escaped and double-quoted
//!
//! Line feeds are written as `&#10;`, so rendered output never trips the
//! newline to `<br/>` conversion when it is sanitized again.
//!
//! Props are written back under their attribute names (`className` becomes
//! `class`), `true` flags as bare attributes, `false` ones not at all. Custom
//! nodes have no markup of their own and are written as their children.

use std::fmt::Write;

use crate::attributes::attribute_name;
use crate::output::{AttrValue, ElementNode, OutputNode};

/// Serialize output nodes back to an HTML string.
pub fn render_html(nodes: &[OutputNode]) -> String {
    let mut out = String::new();
    let mut ser = Serializer { out: &mut out };
    ser.write_nodes(nodes);
    out
}

struct Serializer<'a, W: Write> {
    out: &'a mut W,
}

impl<W: Write> Serializer<'_, W> {
    fn write_nodes(&mut self, nodes: &[OutputNode]) {
        for node in nodes {
            match node {
                OutputNode::Text(text) => self.write_text_escaped(text),
                OutputNode::Element(elem) => self.write_element(elem),
                OutputNode::Custom(custom) => self.write_nodes(&custom.children),
            }
        }
    }

    fn write_element(&mut self, elem: &ElementNode) {
        let _ = write!(self.out, "<{}", elem.tag);

        for (name, value) in elem.attributes.iter().flatten() {
            let name = attribute_name(name);
            match value {
                AttrValue::Bool(false) => {}
                AttrValue::Bool(true) => {
                    let _ = write!(self.out, " {name}");
                }
                other => {
                    let _ = write!(self.out, " {name}=\"");
                    self.write_attr_escaped(&other.to_string());
                    let _ = write!(self.out, "\"");
                }
            }
        }

        let _ = write!(self.out, ">");

        if elem.self_closing {
            return;
        }

        // The parser drops one line feed right after these start tags
        if matches!(elem.tag.as_str(), "pre" | "textarea" | "listing")
            && matches!(elem.children.first(), Some(OutputNode::Text(t)) if t.starts_with('\n'))
        {
            let _ = self.out.write_str("&#10;");
        }

        self.write_nodes(&elem.children);
        let _ = write!(self.out, "</{}>", elem.tag);
    }

    /// Escape text content.
    fn write_text_escaped(&mut self, text: &str) {
        for c in text.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '<' => self.out.write_str("&lt;"),
                '>' => self.out.write_str("&gt;"),
                '\u{a0}' => self.out.write_str("&nbsp;"),
                '\n' => self.out.write_str("&#10;"),
                _ => self.out.write_char(c),
            };
        }
    }

    /// Escape attribute values (for double-quoted attributes).
    fn write_attr_escaped(&mut self, value: &str) {
        for c in value.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '"' => self.out.write_str("&quot;"),
                '\u{a0}' => self.out.write_str("&nbsp;"),
                '\n' => self.out.write_str("&#10;"),
                _ => self.out.write_char(c),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CustomNode;

    #[test]
    fn test_escapes_text() {
        let html = render_html(&[OutputNode::text("a < b && c > d")]);
        assert_eq!(html, "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_void_has_no_end_tag() {
        let nodes = vec![
            OutputNode::text("a"),
            ElementNode::new("br").self_closing().into(),
            OutputNode::text("b"),
        ];
        assert_eq!(render_html(&nodes), "a<br>b");
    }

    #[test]
    fn test_line_feeds_are_references() {
        let nodes = vec![
            OutputNode::text("a\n"),
            ElementNode::new("br").self_closing().into(),
            ElementNode::new("abbr")
                .with_attr("title", "x\ny")
                .with_text("b\n\nc")
                .into(),
        ];
        let html = render_html(&nodes);
        assert!(!html.contains('\n'));
        assert_eq!(
            html,
            r#"a&#10;<br><abbr title="x&#10;y">b&#10;&#10;c</abbr>"#
        );
    }

    #[test]
    fn test_pre_leading_line_feed_survives() {
        let nodes = vec![ElementNode::new("pre").with_text("\nx").into()];
        assert_eq!(render_html(&nodes), "<pre>&#10;&#10;x</pre>");

        let nodes = vec![ElementNode::new("pre").with_text("x\n").into()];
        assert_eq!(render_html(&nodes), "<pre>x&#10;</pre>");
    }

    #[test]
    fn test_attributes_are_renamed_back() {
        let nodes = vec![
            ElementNode::new("td")
                .with_attr("className", "x\"y")
                .with_attr("colSpan", 2.0)
                .with_attr("data-n", "1 & 2")
                .with_text("cell")
                .into(),
        ];
        assert_eq!(
            render_html(&nodes),
            r#"<td class="x&quot;y" colspan="2" data-n="1 &amp; 2">cell</td>"#
        );
    }

    #[test]
    fn test_bool_attributes() {
        let nodes = vec![
            ElementNode::new("details")
                .with_attr("open", true)
                .with_attr("hidden", false)
                .into(),
        ];
        assert_eq!(render_html(&nodes), "<details open></details>");
    }

    #[test]
    fn test_custom_nodes_render_children() {
        let nodes = vec![
            CustomNode::new("Emoji")
                .with_prop("shortcode", ":smile:")
                .with_child(OutputNode::text("🙂"))
                .into(),
        ];
        assert_eq!(render_html(&nodes), "🙂");
    }
}
