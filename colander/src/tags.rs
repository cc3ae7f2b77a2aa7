//! Tag policy table and nesting rules.
//!
//! Every tag the sanitizer knows how to render has a [`TagPolicy`]: what kind
//! of content it is, what it may contain and where it may appear. Tags without
//! a policy are *unclassified*; their wrapper is never rendered in whitelist
//! mode, only their children.

use facet::Facet;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// How an element participates in layout, for nesting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum ContentType {
    Inline,
    Block,
    /// Accepted wherever either inline or block content is
    InlineBlock,
}

/// Whitelist entry for a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    pub tag: &'static str,
    pub content_type: ContentType,
    pub allows_inline_children: bool,
    pub allows_block_children: bool,
    pub allows_self_nesting: bool,
    pub is_void: bool,
    /// Empty means any child tag
    pub allowed_child_tags: &'static [&'static str],
    /// Empty means any parent tag
    pub allowed_parent_tags: &'static [&'static str],
    pub denied_child_tags: &'static [&'static str],
}

impl TagPolicy {
    const fn base(tag: &'static str, content_type: ContentType) -> Self {
        Self {
            tag,
            content_type,
            allows_inline_children: true,
            allows_block_children: true,
            allows_self_nesting: true,
            is_void: false,
            allowed_child_tags: &[],
            allowed_parent_tags: &[],
            denied_child_tags: &[],
        }
    }

    /// Phrasing element holding only inline content, not nestable in itself.
    const fn phrasing(tag: &'static str) -> Self {
        Self::base(tag, ContentType::Inline)
            .inline_only()
            .no_self_nesting()
    }

    /// Sectioning/grouping element holding anything.
    const fn flow(tag: &'static str) -> Self {
        Self::base(tag, ContentType::Block)
    }

    /// Block element holding only inline content (paragraphs, headings).
    const fn text_block(tag: &'static str) -> Self {
        Self::base(tag, ContentType::Block)
            .inline_only()
            .no_self_nesting()
    }

    const fn void(tag: &'static str, content_type: ContentType) -> Self {
        let mut policy = Self::base(tag, content_type);
        policy.allows_inline_children = false;
        policy.allows_block_children = false;
        policy.is_void = true;
        policy
    }

    const fn inline_only(mut self) -> Self {
        self.allows_block_children = false;
        self
    }

    const fn no_self_nesting(mut self) -> Self {
        self.allows_self_nesting = false;
        self
    }

    const fn children(mut self, tags: &'static [&'static str]) -> Self {
        self.allowed_child_tags = tags;
        self
    }

    const fn parents(mut self, tags: &'static [&'static str]) -> Self {
        self.allowed_parent_tags = tags;
        self
    }

    const fn denies(mut self, tags: &'static [&'static str]) -> Self {
        self.denied_child_tags = tags;
        self
    }

    fn accepts(&self, child: ContentType) -> bool {
        match child {
            ContentType::Inline => self.allows_inline_children,
            ContentType::Block => self.allows_block_children,
            ContentType::InlineBlock => self.allows_inline_children || self.allows_block_children,
        }
    }
}

use ContentType::*;

const TABLE_SECTIONS: &[&str] = &["table", "thead", "tbody", "tfoot"];
const MEDIA: &[&str] = &["audio", "video"];
const RUBY: &[&str] = &["ruby", "rtc"];

const POLICIES: &[TagPolicy] = &[
    // Phrasing content
    TagPolicy::base("a", Inline).no_self_nesting(),
    TagPolicy::phrasing("abbr"),
    TagPolicy::phrasing("b"),
    TagPolicy::phrasing("bdi"),
    TagPolicy::phrasing("bdo"),
    TagPolicy::phrasing("cite"),
    TagPolicy::phrasing("code"),
    TagPolicy::phrasing("data"),
    TagPolicy::phrasing("dfn"),
    TagPolicy::phrasing("em"),
    TagPolicy::phrasing("i"),
    TagPolicy::phrasing("kbd"),
    TagPolicy::phrasing("mark"),
    TagPolicy::phrasing("q"),
    TagPolicy::phrasing("s"),
    TagPolicy::phrasing("samp"),
    TagPolicy::phrasing("small"),
    TagPolicy::base("span", Inline).inline_only(),
    TagPolicy::phrasing("strong"),
    TagPolicy::phrasing("sub"),
    TagPolicy::phrasing("sup"),
    TagPolicy::phrasing("time"),
    TagPolicy::phrasing("u"),
    TagPolicy::phrasing("var"),
    TagPolicy::base("del", Inline).no_self_nesting(),
    TagPolicy::base("ins", Inline).no_self_nesting(),
    // Void
    TagPolicy::void("br", Inline),
    TagPolicy::void("wbr", Inline),
    TagPolicy::void("img", InlineBlock),
    TagPolicy::void("hr", Block),
    // Sectioning and grouping
    TagPolicy::flow("div"),
    TagPolicy::flow("article"),
    TagPolicy::flow("aside"),
    TagPolicy::flow("nav"),
    TagPolicy::flow("section"),
    TagPolicy::flow("blockquote"),
    TagPolicy::flow("figure"),
    TagPolicy::flow("details"),
    TagPolicy::flow("main").no_self_nesting(),
    TagPolicy::flow("header").denies(&["header", "footer"]),
    TagPolicy::flow("footer").denies(&["header", "footer"]),
    TagPolicy::flow("address").no_self_nesting().denies(&[
        "article", "aside", "header", "footer", "nav", "section", "h1", "h2", "h3", "h4", "h5",
        "h6",
    ]),
    TagPolicy::text_block("p"),
    TagPolicy::text_block("pre"),
    TagPolicy::text_block("h1"),
    TagPolicy::text_block("h2"),
    TagPolicy::text_block("h3"),
    TagPolicy::text_block("h4"),
    TagPolicy::text_block("h5"),
    TagPolicy::text_block("h6"),
    TagPolicy::text_block("figcaption").parents(&["figure"]),
    TagPolicy::text_block("summary").parents(&["details"]),
    // Lists
    TagPolicy::flow("ul").children(&["li"]),
    TagPolicy::flow("ol").children(&["li"]),
    TagPolicy::flow("li").parents(&["ul", "ol"]),
    TagPolicy::flow("dl").children(&["dt", "dd"]),
    TagPolicy::text_block("dt").parents(&["dl"]),
    TagPolicy::flow("dd").parents(&["dl"]),
    // Tables
    TagPolicy::flow("table")
        .no_self_nesting()
        .children(&["caption", "colgroup", "thead", "tbody", "tfoot", "tr"]),
    TagPolicy::text_block("caption").parents(&["table"]),
    TagPolicy::flow("colgroup")
        .children(&["col"])
        .parents(&["table"]),
    TagPolicy::void("col", Block).parents(&["colgroup"]),
    TagPolicy::flow("thead").children(&["tr"]).parents(&["table"]),
    TagPolicy::flow("tbody").children(&["tr"]).parents(&["table"]),
    TagPolicy::flow("tfoot").children(&["tr"]).parents(&["table"]),
    TagPolicy::flow("tr")
        .children(&["th", "td"])
        .parents(TABLE_SECTIONS),
    TagPolicy::flow("th").parents(&["tr"]),
    TagPolicy::flow("td").parents(&["tr"]),
    // Ruby annotations
    TagPolicy::base("ruby", Inline)
        .inline_only()
        .no_self_nesting(),
    TagPolicy::phrasing("rb").parents(RUBY),
    TagPolicy::phrasing("rp").parents(RUBY),
    TagPolicy::phrasing("rt").parents(RUBY),
    TagPolicy::phrasing("rtc").parents(&["ruby"]),
    // Embedded media
    TagPolicy::base("audio", InlineBlock)
        .no_self_nesting()
        .children(&["source", "track"]),
    TagPolicy::base("video", InlineBlock)
        .no_self_nesting()
        .children(&["source", "track"]),
    TagPolicy::base("picture", InlineBlock)
        .no_self_nesting()
        .children(&["source", "img"]),
    TagPolicy::void("source", Inline).parents(&["audio", "video", "picture"]),
    TagPolicy::void("track", Inline).parents(MEDIA),
    TagPolicy::base("canvas", InlineBlock).no_self_nesting(),
    TagPolicy::base("iframe", InlineBlock).no_self_nesting(),
];

/// Tags that are never rendered, whatever the whitelist says.
///
/// Only a transform hook may still replace them.
pub const BLACKLISTED_TAGS: &[&str] = &[
    "applet", "base", "body", "command", "embed", "frame", "frameset", "head", "html", "link",
    "meta", "noscript", "object", "script", "style", "template", "title",
];

/// Classified tags that still need an explicit allow list entry.
const NOT_ALLOWED_BY_DEFAULT: &[&str] = &["canvas", "iframe"];

static TAGS: LazyLock<HashMap<&'static str, TagPolicy>> = LazyLock::new(|| {
    POLICIES
        .iter()
        .map(|policy| (policy.tag, policy.clone()))
        .collect()
});

/// Look up the policy of a (lowercase) tag name.
pub fn policy_of(tag: &str) -> Option<&'static TagPolicy> {
    TAGS.get(tag)
}

pub fn is_blacklisted(tag: &str) -> bool {
    BLACKLISTED_TAGS.contains(&tag)
}

/// The allow list used when the caller does not provide one.
pub fn default_allow_list() -> HashSet<String> {
    POLICIES
        .iter()
        .map(|policy| policy.tag)
        .filter(|tag| !NOT_ALLOWED_BY_DEFAULT.contains(tag))
        .map(str::to_owned)
        .collect()
}

/// Whether `child` may be placed directly inside `parent`.
///
/// Used both for parsed elements and for the pseudo-elements matchers produce.
pub fn can_place(parent: Option<&TagPolicy>, child: Option<&TagPolicy>) -> bool {
    let (Some(parent), Some(child)) = (parent, child) else {
        return false;
    };

    if !parent.allowed_child_tags.is_empty() && !parent.allowed_child_tags.contains(&child.tag) {
        return false;
    }

    if parent.denied_child_tags.contains(&child.tag) {
        return false;
    }

    if !child.allowed_parent_tags.is_empty() && !child.allowed_parent_tags.contains(&parent.tag) {
        return false;
    }

    if !parent.allows_self_nesting && parent.tag == child.tag {
        return false;
    }

    parent.accepts(child.content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(parent: &str, child: &str) -> bool {
        can_place(policy_of(parent), policy_of(child))
    }

    #[test]
    fn test_unknown_tags_have_no_policy() {
        assert!(policy_of("marquee").is_none());
        assert!(policy_of("script").is_none());
        assert!(policy_of("div").is_some());
    }

    #[test]
    fn test_related_tags_are_classified() {
        for policy in POLICIES {
            let related = policy
                .allowed_child_tags
                .iter()
                .chain(policy.allowed_parent_tags)
                .chain(policy.denied_child_tags);
            for tag in related {
                assert!(policy_of(tag).is_some(), "<{}> names unclassified <{tag}>", policy.tag);
            }
        }
    }

    #[test]
    fn test_unclassified_side_never_places() {
        assert!(!place("div", "marquee"));
        assert!(!place("marquee", "span"));
        assert!(!can_place(None, None));
    }

    #[test]
    fn test_allowed_children() {
        assert!(place("ul", "li"));
        assert!(!place("ul", "div"));
        assert!(!place("ul", "span"));
        assert!(place("tr", "td"));
        assert!(!place("tr", "li"));
    }

    #[test]
    fn test_allowed_parents() {
        assert!(!place("div", "li"));
        assert!(place("ol", "li"));
        assert!(!place("div", "td"));
        assert!(place("figure", "figcaption"));
        assert!(!place("section", "figcaption"));
    }

    #[test]
    fn test_denied_children() {
        assert!(!place("header", "footer"));
        assert!(place("header", "nav"));
        assert!(!place("address", "h2"));
    }

    #[test]
    fn test_self_nesting() {
        assert!(!place("a", "a"));
        assert!(!place("p", "p"));
        assert!(place("div", "div"));
        assert!(place("span", "span"));
    }

    #[test]
    fn test_inline_and_block_content() {
        assert!(place("p", "span"));
        assert!(!place("p", "div"));
        assert!(!place("span", "div"));
        assert!(place("a", "div"));
        assert!(place("div", "br"));
        assert!(place("p", "img"));
        assert!(!place("br", "span"));
    }

    #[test]
    fn test_void_policies_have_no_children() {
        for tag in ["br", "wbr", "img", "hr", "col", "source", "track"] {
            let policy = policy_of(tag).expect(tag);
            assert!(policy.is_void, "{tag} should be void");
            assert!(!policy.allows_inline_children && !policy.allows_block_children);
        }
    }

    #[test]
    fn test_blacklist_is_disjoint_from_table() {
        for tag in BLACKLISTED_TAGS {
            assert!(policy_of(tag).is_none(), "{tag} is both classified and blacklisted");
        }
    }

    #[test]
    fn test_default_allow_list() {
        let allowed = default_allow_list();
        assert!(allowed.contains("div"));
        assert!(allowed.contains("a"));
        assert!(!allowed.contains("iframe"));
        assert!(!allowed.contains("canvas"));
        assert!(!allowed.contains("script"));
    }
}
