//! Arena-based parse tree built by html5ever.
//!
//! This is the inert tree the walker reads from:
//! - **indextree Arena**: all nodes in contiguous memory, so traversal is an
//!   explicit worklist over `NodeId`s instead of native recursion
//! - **Tendrils**: text and attribute values share buffers with the source
//! - **Nothing runs**: html5ever only builds a tree, scripts are never
//!   executed and nothing is fetched

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, Namespace, QualName, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

use crate::trace;

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// A parsed fragment: the arena plus the node whose children are the content.
#[derive(Debug, Clone)]
pub struct Document {
    pub arena: Arena<NodeData>,

    /// Container whose children are the parsed markup (the `<body>` element).
    pub root: NodeId,
}

impl Document {
    #[cfg(test)]
    pub(crate) fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    #[cfg(test)]
    pub(crate) fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible)
    Document,
    Element(ElementData),
    Text(StrTendril),
    /// Comments and processing instructions; never rendered
    Comment(StrTendril),
}

/// Tag name and attributes of a raw parsed element.
///
/// This is the value node filters receive and may rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name for HTML, case-preserved for foreign content
    pub tag: StrTendril,

    /// Attributes in source order. Duplicates are resolved first-wins by the tokenizer.
    pub attrs: IndexMap<String, StrTendril>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: StrTendril::from(tag),
            attrs: IndexMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_owned(), StrTendril::from(value));
        self
    }

    pub fn tag(&self) -> &str {
        self.tag.as_ref()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|v| v.as_ref())
    }
}

/// Parse markup into an arena fragment.
pub fn parse(html: &str) -> Document {
    // An explicit <body> puts the tree builder in body mode right away, so
    // whitespace (literal or as a character reference) before the first tag
    // is content instead of being dropped.
    let mut tendril = StrTendril::from("<body>");
    tendril.push_slice(html);
    parse_document(ArenaSink::new(), Default::default()).one(tendril)
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
pub struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation for building the arena
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    /// Namespace per element node, needed to answer `elem_name`
    namespaces: RefCell<IndexMap<NodeId, Namespace>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            namespaces: RefCell::new(IndexMap::new()),
        }
    }

    fn new_node(&self, kind: NodeKind) -> NodeId {
        self.arena.borrow_mut().new_node(NodeData { kind })
    }
}

/// Find the first child element of `parent` with the given tag.
fn child_element(arena: &Arena<NodeData>, parent: NodeId, tag: &str) -> Option<NodeId> {
    parent.children(arena).find(|&id| {
        matches!(&arena[id].get().kind, NodeKind::Element(elem) if elem.tag.as_ref() == tag)
    })
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let mut arena = self.arena.into_inner();

        let html = child_element(&arena, self.document, "html");
        let body = html.and_then(|html| child_element(&arena, html, "body"));

        let root = match body {
            Some(body) => body,
            None => {
                // html5ever always synthesizes a body, this is only reachable
                // if the tree builder changes underneath us
                let body = arena.new_node(NodeData {
                    kind: NodeKind::Element(ElementData::new("body")),
                });
                self.document.append(body, &mut arena);
                body
            }
        };

        trace!("parsed fragment into {} arena nodes", arena.count());
        Document { arena, root }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own, and untrusted input is expected to be broken
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let ns = self
            .namespaces
            .borrow()
            .get(target)
            .cloned()
            .unwrap_or_else(|| Namespace::from(HTML_NS));

        let local = match &arena[*target].get().kind {
            NodeKind::Element(elem) => LocalName::from(elem.tag.as_ref()),
            _ => LocalName::from(""),
        };

        OwnedElemName(QualName {
            prefix: None,
            ns,
            local,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let tag = StrTendril::from(name.local.as_ref());

        let mut attr_map: IndexMap<String, StrTendril> = IndexMap::with_capacity(attrs.len());
        for attr in attrs {
            let key = match &attr.name.prefix {
                Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                None => attr.name.local.to_string(),
            };
            attr_map.entry(key).or_insert(attr.value);
        }

        let id = self.new_node(NodeKind::Element(ElementData {
            tag,
            attrs: attr_map,
        }));
        self.namespaces.borrow_mut().insert(id, name.ns);
        id
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.new_node(NodeKind::Comment(text))
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        self.new_node(NodeKind::Comment(data))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut *arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a previous text sibling, like a browser would
                let last_child = parent.children(&arena).next_back();
                if let Some(last_child) = last_child
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text),
                });
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut *arena);
            }
            NodeOrText::AppendText(text) => {
                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text),
                });
                sibling.insert_before(text_node, &mut *arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.arena.borrow()[*element].parent().is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents live under the template element itself
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                let key = attr.name.local.to_string();
                elem.attrs.entry(key).or_insert(attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&*arena).collect();
        for child in children {
            child.detach(&mut *arena);
            new_parent.append(child, &mut *arena);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_content(doc: &Document, id: NodeId) -> String {
        id.descendants(&doc.arena)
            .filter_map(|desc| match &doc.get(desc).kind {
                NodeKind::Text(t) => Some(t.as_ref()),
                _ => None,
            })
            .collect()
    }

    fn tags(doc: &Document, id: NodeId) -> Vec<String> {
        doc.children(id)
            .filter_map(|c| match &doc.get(c).kind {
                NodeKind::Element(e) => Some(e.tag.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_root_is_body() {
        let doc = parse("<p>Hello</p>");
        if let NodeKind::Element(elem) = &doc.get(doc.root).kind {
            assert_eq!(elem.tag(), "body");
        } else {
            panic!("root should be an element");
        }
        assert_eq!(tags(&doc, doc.root), vec!["p"]);
    }

    #[test]
    fn test_attributes_preserve_order() {
        let doc = parse(r#"<div id="a" class="b" data-x="c"></div>"#);
        let div = doc.children(doc.root).next().expect("div");
        if let NodeKind::Element(elem) = &doc.get(div).kind {
            let names: Vec<&str> = elem.attrs.keys().map(|k| k.as_str()).collect();
            assert_eq!(names, vec!["id", "class", "data-x"]);
            assert_eq!(elem.attr("class"), Some("b"));
        } else {
            panic!("expected element");
        }
    }

    #[test]
    fn test_duplicate_attributes_first_wins() {
        let doc = parse(r#"<span title="one" title="two">x</span>"#);
        let span = doc.children(doc.root).next().expect("span");
        if let NodeKind::Element(elem) = &doc.get(span).kind {
            assert_eq!(elem.attr("title"), Some("one"));
            assert_eq!(elem.attrs.len(), 1);
        } else {
            panic!("expected element");
        }
    }

    #[test]
    fn test_head_content_stays_in_place() {
        let doc = parse("<title>Heading</title><p>Body</p>");
        assert_eq!(tags(&doc, doc.root), vec!["title", "p"]);
        assert_eq!(text_content(&doc, doc.root), "HeadingBody");
    }

    #[test]
    fn test_adjacent_text_is_merged() {
        let doc = parse("a &amp; b");
        let children: Vec<NodeId> = doc.children(doc.root).collect();
        assert_eq!(children.len(), 1);
        assert!(matches!(&doc.get(children[0]).kind, NodeKind::Text(t) if t.as_ref() == "a & b"));
    }

    #[test]
    fn test_leading_whitespace_is_kept() {
        let doc = parse("\n  a<b>b</b>");
        assert_eq!(text_content(&doc, doc.root), "\n  ab");
        assert_eq!(doc.children(doc.root).count(), 2);

        let doc = parse(" <p>x</p>");
        assert_eq!(tags(&doc, doc.root), vec!["p"]);
        assert_eq!(doc.children(doc.root).count(), 2);

        let doc = parse("&#10;<p>x</p>");
        assert_eq!(text_content(&doc, doc.root), "\nx");
        assert_eq!(doc.children(doc.root).count(), 2);
    }

    #[test]
    fn test_script_is_inert_text() {
        let doc = parse("<div><script>alert(1)</script></div>");
        let div = doc.children(doc.root).next().expect("div");
        let script = doc.children(div).next().expect("script");
        assert_eq!(text_content(&doc, script), "alert(1)");
    }

    #[test]
    fn test_comments_are_kept_but_separate() {
        let doc = parse("a<!-- note -->b");
        let kinds: Vec<&'static str> = doc
            .children(doc.root)
            .map(|c| match &doc.get(c).kind {
                NodeKind::Text(_) => "text",
                NodeKind::Comment(_) => "comment",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["text", "comment", "text"]);
    }
}
