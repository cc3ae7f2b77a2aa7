//! Tree walker: turns the parse tree into sanitized output nodes.
//!
//! The walk is an explicit worklist of frames, one per open element, so
//! hostile nesting depth costs heap, not stack. Elements deeper than
//! `max_depth` are dropped with their subtree.

use indextree::NodeId;
use std::mem;

use crate::arena_dom::{Document, ElementData, NodeKind};
use crate::attributes::extract_attributes;
use crate::context::ParseContext;
use crate::error::SanitizeError;
use crate::filter::{Filter, apply_node_filters};
use crate::matcher::Matcher;
use crate::output::{ElementNode, OutputNode, extend_merged};
use crate::tags::{self, TagPolicy};
use crate::tokens::apply_matchers;
use crate::transform::{Transform, Transformed};
use crate::{debug, trace};

/// Plugins consulted during one walk.
pub(crate) struct Plugins<'p> {
    pub matchers: &'p [Box<dyn Matcher>],
    pub filters: &'p [Box<dyn Filter>],
    pub transform: Option<&'p dyn Transform>,
}

/// An element whose children are being walked.
struct Frame {
    /// Next child to visit
    next: Option<NodeId>,
    /// Parent context for the children
    parent: Option<&'static TagPolicy>,
    out: Vec<OutputNode>,
    finish: Finish,
}

/// What to do with a frame's output once its children are done.
enum Finish {
    Root,
    Element(ElementNode),
    PassThrough,
    Transform(Pending),
}

/// An element waiting for the transform hook.
struct Pending {
    tag: String,
    element: ElementData,
    policy: Option<&'static TagPolicy>,
    /// Parent context of the element itself
    outer: Option<&'static TagPolicy>,
    key: u32,
}

enum Visit {
    Emit(Vec<OutputNode>),
    Descend(Frame),
    Skip,
}

impl Frame {
    fn new(next: Option<NodeId>, parent: Option<&'static TagPolicy>, finish: Finish) -> Self {
        Self {
            next,
            parent,
            out: Vec::new(),
            finish,
        }
    }
}

/// Walk the children of `doc.root` with `root` as their parent context.
///
/// Element data is moved out of the arena as it is visited.
pub(crate) fn walk(
    ctx: &mut ParseContext<'_>,
    doc: &mut Document,
    plugins: &Plugins<'_>,
    root: Option<&'static TagPolicy>,
) -> Result<Vec<OutputNode>, SanitizeError> {
    let first = doc.arena[doc.root].first_child();
    let mut stack = vec![Frame::new(first, root, Finish::Root)];

    while let Some(frame) = stack.last_mut() {
        let Some(id) = frame.next else {
            let Some(done) = stack.pop() else {
                break;
            };
            let produced = finish(ctx, plugins, done);
            match stack.last_mut() {
                Some(parent) => extend_merged(&mut parent.out, produced),
                None => return Ok(produced),
            }
            continue;
        };

        frame.next = doc.arena[id].next_sibling();
        let parent = frame.parent;
        let depth = stack.len();

        match visit(ctx, doc, plugins, id, parent, depth)? {
            Visit::Emit(nodes) => {
                if let Some(top) = stack.last_mut() {
                    extend_merged(&mut top.out, nodes);
                }
            }
            Visit::Descend(frame) => stack.push(frame),
            Visit::Skip => {}
        }
    }

    Ok(Vec::new())
}

fn visit(
    ctx: &mut ParseContext<'_>,
    doc: &mut Document,
    plugins: &Plugins<'_>,
    id: NodeId,
    parent: Option<&'static TagPolicy>,
    depth: usize,
) -> Result<Visit, SanitizeError> {
    let first_child = doc.arena[id].first_child();

    let element = match &mut doc.get_mut(id).kind {
        NodeKind::Text(text) => {
            let nodes = if ctx.options.runs_matchers() {
                apply_matchers(ctx, plugins.matchers, text, parent)?
            } else {
                vec![OutputNode::text(text.to_string())]
            };
            return Ok(Visit::Emit(nodes));
        }
        NodeKind::Element(element) => mem::take(element),
        NodeKind::Comment(_) | NodeKind::Document => return Ok(Visit::Skip),
    };

    let tag = element.tag().to_ascii_lowercase();

    if depth > ctx.options.max_depth {
        debug!("<{}> nested deeper than {}, dropping subtree", tag, ctx.options.max_depth);
        return Ok(Visit::Skip);
    }

    let Some(element) = apply_node_filters(plugins.filters, &tag, element) else {
        return Ok(Visit::Skip);
    };

    let policy = tags::policy_of(&tag);

    if plugins.transform.is_some()
        && (!ctx.options.transform_only_allow_list || ctx.is_tag_allowed(&tag))
    {
        let key = ctx.allocate_key();
        let pending = Pending {
            tag,
            element,
            policy,
            outer: parent,
            key,
        };
        return Ok(Visit::Descend(Frame::new(
            first_child,
            policy.or(parent),
            Finish::Transform(pending),
        )));
    }

    if tags::is_blacklisted(&tag) {
        debug!("<{}> is blacklisted, dropping subtree", tag);
        return Ok(Visit::Skip);
    }

    if !renders(ctx, &tag, policy, parent) {
        trace!("<{}> passed through", tag);
        return Ok(Visit::Descend(Frame::new(
            first_child,
            policy.or(parent),
            Finish::PassThrough,
        )));
    }

    let node = element_node(ctx.allocate_key(), tag, &element, policy, plugins.filters);
    if node.self_closing {
        return Ok(Visit::Emit(vec![node.into()]));
    }

    Ok(Visit::Descend(Frame::new(
        first_child,
        policy.or(parent),
        Finish::Element(node),
    )))
}

fn renders(
    ctx: &ParseContext<'_>,
    tag: &str,
    policy: Option<&TagPolicy>,
    parent: Option<&TagPolicy>,
) -> bool {
    ctx.options.renders_html()
        && ctx.is_tag_allowed(tag)
        && (ctx.options.disable_whitelist || tags::can_place(parent, policy))
}

fn element_node(
    key: u32,
    tag: String,
    element: &ElementData,
    policy: Option<&TagPolicy>,
    filters: &[Box<dyn Filter>],
) -> ElementNode {
    let mut node = ElementNode::new(tag);
    node.key = key;
    node.attributes = extract_attributes(element, filters);
    node.self_closing = policy.is_some_and(|p| p.is_void);
    node
}

fn finish(ctx: &mut ParseContext<'_>, plugins: &Plugins<'_>, frame: Frame) -> Vec<OutputNode> {
    match frame.finish {
        Finish::Root | Finish::PassThrough => frame.out,
        Finish::Element(mut node) => {
            node.children = frame.out;
            vec![node.into()]
        }
        Finish::Transform(pending) => {
            let decision = match plugins.transform {
                Some(transform) => transform.transform(
                    &pending.tag,
                    &pending.element,
                    &frame.out,
                    pending.policy,
                ),
                None => Transformed::Default,
            };

            match decision {
                Transformed::Drop => {
                    trace!("<{}> dropped by transform", pending.tag);
                    Vec::new()
                }
                Transformed::Replace(node) => vec![node.with_key(pending.key)],
                Transformed::Default => fall_through(ctx, plugins, pending, frame.out),
            }
        }
    }
}

/// Default rules for an element the transform declined, reusing the children
/// already walked for the hook.
///
/// The identity allocated for the hook is kept when the element renders and
/// released otherwise, so identities stay dense.
fn fall_through(
    ctx: &mut ParseContext<'_>,
    plugins: &Plugins<'_>,
    pending: Pending,
    children: Vec<OutputNode>,
) -> Vec<OutputNode> {
    let Pending {
        tag,
        element,
        policy,
        outer,
        key,
    } = pending;

    if tags::is_blacklisted(&tag) {
        debug!("<{}> is blacklisted, dropping subtree", tag);
        ctx.rollback(key);
        return Vec::new();
    }

    if renders(ctx, &tag, policy, outer) {
        let mut node = element_node(key, tag, &element, policy, plugins.filters);
        if node.self_closing {
            ctx.rollback(key + 1);
        } else {
            node.children = children;
        }
        return vec![node.into()];
    }

    let mut children = children;
    release_key(&mut children, key);
    ctx.rollback(ctx.checkpoint() - 1);
    children
}

/// Shift every identity allocated after `key` down by one.
fn release_key(nodes: &mut [OutputNode], key: u32) {
    for node in nodes {
        match node {
            OutputNode::Text(_) => {}
            OutputNode::Element(elem) => {
                if elem.key > key {
                    elem.key -= 1;
                }
                release_key(&mut elem.children, key);
            }
            OutputNode::Custom(custom) => {
                if custom.key > key {
                    custom.key -= 1;
                }
                release_key(&mut custom.children, key);
            }
        }
    }
}
