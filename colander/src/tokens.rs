//! Token substitution: splices matcher-produced nodes into a text run.
//!
//! Each match is replaced in a working copy of the text by a placeholder
//! `#{{N}}#`, where `N` indexes the nodes produced so far for the run. Once
//! every matcher is exhausted, a single left-to-right pass over the
//! placeholders interleaves the literal slices with the produced nodes.
//!
//! Literal `{{` in the input would let text forge a placeholder, so the run is
//! escaped first: a private-use marker goes between consecutive braces (and is
//! doubled where it already occurs). Matchers see the escaped text; slices and
//! matched substrings are unescaped before they leave the engine.

use regex::Regex;
use smallvec::SmallVec;
use std::ops::Range;
use std::sync::LazyLock;

use crate::context::ParseContext;
use crate::error::{SanitizeError, Unimplemented};
use crate::matcher::{MatchResult, Matcher};
use crate::output::{OutputNode, push_merged};
use crate::tags::{self, TagPolicy};
use crate::{debug, trace};

const ESC: char = '\u{E000}';

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\{\{(\d+)\}\}#").expect("valid regex"));

type Spans = SmallVec<[Range<usize>; 8]>;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_brace = false;
    for c in text.chars() {
        if c == ESC {
            out.push(ESC);
        } else if c == '{' && prev_brace {
            out.push(ESC);
        }
        out.push(c);
        prev_brace = c == '{';
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != ESC {
            out.push(c);
        } else if chars.peek() == Some(&ESC) {
            chars.next();
            out.push(ESC);
        }
    }
    out
}

fn placeholder_spans(working: &str) -> Spans {
    PLACEHOLDER.find_iter(working).map(|m| m.range()).collect()
}

fn is_free(spans: &Spans, at: usize, end: usize) -> bool {
    !spans.iter().any(|span| at < span.end && span.start < end)
}

/// Byte offset of the first occurrence of `needle` that does not overlap a
/// placeholder.
fn first_free_occurrence(working: &str, needle: &str, spans: &Spans) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = working[from..].find(needle) {
        let at = from + pos;
        if is_free(spans, at, at + needle.len()) {
            return Some(at);
        }
        let step = working[at..].chars().next().map_or(1, char::len_utf8);
        from = at + step;
    }
    None
}

/// Where to splice a match: the reported offset when the matched substring is
/// really there, otherwise its first free occurrence.
fn replacement_site(working: &str, result: &MatchResult, spans: &Spans) -> Option<usize> {
    let at = result.index;
    let end = at.saturating_add(result.matched.len());
    if working.get(at..end) == Some(result.matched.as_str()) && is_free(spans, at, end) {
        return Some(at);
    }
    trace!("match {:?} is not at offset {}", result.matched, at);
    first_free_occurrence(working, &result.matched, spans)
}

/// Whether a matcher may run under `parent`.
fn is_matcher_active(
    ctx: &ParseContext<'_>,
    matcher: &dyn Matcher,
    parent: Option<&TagPolicy>,
) -> bool {
    if ctx.is_matcher_disabled(&matcher.inverse_flag()) {
        return false;
    }

    let tag = matcher.produced_tag().to_ascii_lowercase();
    if !ctx.is_tag_allowed(&tag) {
        trace!("matcher {} skipped: <{}> is not allowed", matcher.name(), tag);
        return false;
    }

    let policy = tags::policy_of(&tag);
    // Without a whitelist, unclassified tags only skip the nesting rules
    let placeable = if ctx.options.disable_whitelist && (policy.is_none() || parent.is_none()) {
        true
    } else {
        tags::can_place(parent, policy)
    };
    if !placeable {
        trace!("matcher {} skipped: <{}> not placeable here", matcher.name(), tag);
        return false;
    }

    true
}

/// Run every active matcher over `text` and return the resulting node
/// sequence, in source order.
///
/// A text without matches comes back as a single text node (or nothing, if
/// empty). Produced nodes get ascending identities from `ctx`.
pub(crate) fn apply_matchers(
    ctx: &mut ParseContext<'_>,
    matchers: &[Box<dyn Matcher>],
    text: &str,
    parent: Option<&TagPolicy>,
) -> Result<Vec<OutputNode>, SanitizeError> {
    let mut working = escape(text);
    let mut elements: Vec<Option<OutputNode>> = Vec::new();

    for matcher in matchers {
        if !is_matcher_active(ctx, matcher.as_ref(), parent) {
            continue;
        }

        while let Some(result) = matcher.find(&working) {
            if result.matched.is_empty() {
                debug!("matcher {} returned an empty match, ignoring it", matcher.name());
                break;
            }

            let spans = placeholder_spans(&working);
            let Some(at) = replacement_site(&working, &result, &spans) else {
                debug!(
                    "matcher {} matched {:?}, which is not free text",
                    matcher.name(),
                    result.matched
                );
                break;
            };

            let matched = unescape(&result.matched);
            let node = match matcher.create_node(&matched, &result.params) {
                Ok(node) => node.with_key(ctx.allocate_key()),
                Err(Unimplemented) if ctx.options.is_strict() => {
                    return Err(SanitizeError::NotImplemented {
                        matcher: matcher.name().to_string(),
                        method: "create_node".to_string(),
                    });
                }
                Err(Unimplemented) => {
                    ctx.allocate_key();
                    OutputNode::Text(matched)
                }
            };

            let token = format!("#{{{{{}}}}}#", elements.len());
            working.replace_range(at..at + result.matched.len(), &token);
            elements.push(Some(node));
        }
    }

    if elements.is_empty() {
        let mut out = Vec::new();
        push_merged(&mut out, OutputNode::text(text));
        return Ok(out);
    }

    let mut out = Vec::with_capacity(elements.len() * 2 + 1);
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(&working) {
        let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let node = index
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|i| elements.get_mut(i))
            .and_then(Option::take);
        let Some(node) = node else {
            continue;
        };

        push_merged(&mut out, OutputNode::Text(unescape(&working[last..whole.start()])));
        push_merged(&mut out, node);
        last = whole.end();
    }

    push_merged(&mut out, OutputNode::Text(unescape(&working[last..])));

    Ok(out)
}
