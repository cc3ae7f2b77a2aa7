//! The renderable node sequence handed to presentation layers.
//!
//! Output is plain owned data: no back-references into the parse tree, so a
//! renderer can take it by value or ship it across a boundary (every type
//! here derives `Facet`).

use facet::Facet;
use indexmap::IndexMap;
use std::fmt;

/// A typed attribute (or prop) value.
#[derive(Debug, Clone, PartialEq, Facet)]
#[repr(u8)]
pub enum AttrValue {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// One renderable node.
#[derive(Debug, Clone, PartialEq, Facet)]
#[repr(u8)]
pub enum OutputNode {
    /// A plain text run, never containing markup
    Text(String),
    /// A whitelisted element
    Element(ElementNode),
    /// A node manufactured by a matcher or transform, opaque to the sanitizer
    Custom(CustomNode),
}

/// A whitelisted element with its sanitized attributes.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct ElementNode {
    pub tag: String,
    /// `None` when no attribute survived, never an empty map
    pub attributes: Option<IndexMap<String, AttrValue>>,
    pub children: Vec<OutputNode>,
    pub self_closing: bool,
    /// Unique within one sanitize call, ascending in document order
    pub key: u32,
}

/// A node the sanitizer carries but does not interpret.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct CustomNode {
    /// Name the renderer dispatches on (e.g. `Emoji`)
    pub component: String,
    pub props: IndexMap<String, AttrValue>,
    pub children: Vec<OutputNode>,
    pub key: u32,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: None,
            children: Vec::new(),
            self_closing: false,
            key: 0,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: OutputNode) -> Self {
        push_merged(&mut self.children, child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(OutputNode::Text(text.into()))
    }

    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.as_ref()?.get(name)
    }
}

impl CustomNode {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: IndexMap::new(),
            children: Vec::new(),
            key: 0,
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: OutputNode) -> Self {
        push_merged(&mut self.children, child);
        self
    }

    pub fn prop(&self, name: &str) -> Option<&AttrValue> {
        self.props.get(name)
    }
}

impl From<ElementNode> for OutputNode {
    fn from(elem: ElementNode) -> Self {
        OutputNode::Element(elem)
    }
}

impl From<CustomNode> for OutputNode {
    fn from(custom: CustomNode) -> Self {
        OutputNode::Custom(custom)
    }
}

impl OutputNode {
    pub fn text(text: impl Into<String>) -> Self {
        OutputNode::Text(text.into())
    }

    /// An empty element with no attributes.
    pub fn element(tag: impl Into<String>) -> Self {
        OutputNode::Element(ElementNode::new(tag))
    }

    pub fn custom(component: impl Into<String>) -> Self {
        OutputNode::Custom(CustomNode::new(component))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputNode::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputNode::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            OutputNode::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomNode> {
        match self {
            OutputNode::Custom(c) => Some(c),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<u32> {
        match self {
            OutputNode::Text(_) => None,
            OutputNode::Element(e) => Some(e.key),
            OutputNode::Custom(c) => Some(c.key),
        }
    }

    /// Stamp an identity on the node. Text runs carry none.
    pub fn with_key(mut self, key: u32) -> Self {
        match &mut self {
            OutputNode::Text(_) => {}
            OutputNode::Element(e) => e.key = key,
            OutputNode::Custom(c) => c.key = key,
        }
        self
    }

    pub fn children(&self) -> &[OutputNode] {
        match self {
            OutputNode::Text(_) => &[],
            OutputNode::Element(e) => &e.children,
            OutputNode::Custom(c) => &c.children,
        }
    }

    /// Text of this node and its descendants, in order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(std::slice::from_ref(self), &mut out);
        out
    }
}

/// Concatenated text of a node sequence.
pub fn text_content(nodes: &[OutputNode]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[OutputNode], out: &mut String) {
    for node in nodes {
        match node {
            OutputNode::Text(t) => out.push_str(t),
            other => collect_text(other.children(), out),
        }
    }
}

/// Append a node, merging it into a preceding text run when both are text.
pub(crate) fn push_merged(out: &mut Vec<OutputNode>, node: OutputNode) {
    match node {
        OutputNode::Text(text) => {
            if text.is_empty() {
                return;
            }
            if let Some(OutputNode::Text(last)) = out.last_mut() {
                last.push_str(&text);
            } else {
                out.push(OutputNode::Text(text));
            }
        }
        other => out.push(other),
    }
}

pub(crate) fn extend_merged(out: &mut Vec<OutputNode>, nodes: impl IntoIterator<Item = OutputNode>) {
    for node in nodes {
        push_merged(out, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merged_joins_text() {
        let mut out = Vec::new();
        push_merged(&mut out, OutputNode::text("Hello "));
        push_merged(&mut out, OutputNode::text("world"));
        push_merged(&mut out, ElementNode::new("br").self_closing().into());
        push_merged(&mut out, OutputNode::text(""));
        push_merged(&mut out, OutputNode::text("!"));

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_text(), Some("Hello world"));
        assert_eq!(out[2].as_text(), Some("!"));
    }

    #[test]
    fn test_with_key_ignores_text() {
        assert_eq!(OutputNode::text("x").with_key(4).key(), None);
        let elem: OutputNode = ElementNode::new("b").into();
        assert_eq!(elem.with_key(4).key(), Some(4));
        let custom = OutputNode::custom("Emoji");
        assert_eq!(custom.with_key(9).key(), Some(9));
        assert_eq!(OutputNode::element("b").as_element().map(|e| e.tag.as_str()), Some("b"));
    }

    #[test]
    fn test_text_content_flattens() {
        let nodes = vec![
            OutputNode::text("a "),
            ElementNode::new("b")
                .with_child(ElementNode::new("i").with_text("b").into())
                .with_text(" c")
                .into(),
            CustomNode::new("Link").with_child(OutputNode::text("d")).into(),
        ];
        assert_eq!(text_content(&nodes), "a b cd");
    }

    #[test]
    fn test_with_attr_creates_map() {
        let elem = ElementNode::new("a").with_attr("href", "https://example.com");
        assert_eq!(
            elem.attr("href"),
            Some(&AttrValue::Str("https://example.com".to_string()))
        );
        assert!(ElementNode::new("a").attributes.is_none());
    }
}
