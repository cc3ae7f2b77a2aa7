//! Text pattern recognizers that turn substrings into nodes.

use indexmap::IndexMap;
use regex::{Captures, Regex};

use crate::error::{HookError, SanitizeError, Unimplemented};
use crate::output::OutputNode;

/// Named values captured by a match, handed to [`Matcher::create_node`].
pub type MatchParams = IndexMap<String, String>;

/// One match found in a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The substring that will be replaced by the produced node
    pub matched: String,
    /// Byte offset of `matched` in the searched text
    pub index: usize,
    pub length: usize,
    pub params: MatchParams,
}

impl MatchResult {
    pub fn new(matched: impl Into<String>, index: usize) -> Self {
        let matched = matched.into();
        Self {
            length: matched.len(),
            matched,
            index,
            params: MatchParams::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A pluggable recognizer that finds a pattern in text and manufactures a
/// node for it.
///
/// `find` is called repeatedly on the working text of a run, in which earlier
/// matches have already been replaced by opaque placeholders, until it returns
/// `None`. It must not report a match it already reported: the engine replaces
/// the matched substring at `index`, or, when `index` does not point at it,
/// the first occurrence that is not part of a placeholder.
pub trait Matcher: Send + Sync {
    /// Short identifier, e.g. `url`. Must not be empty or `html`.
    fn name(&self) -> &str;

    /// Tag the produced node stands for, checked against the tag policies
    /// like a parsed element would be.
    fn produced_tag(&self) -> &str;

    /// Option flag that disables this matcher, `noUrl` for `url`.
    fn inverse_flag(&self) -> String {
        default_inverse_flag(self.name())
    }

    fn find(&self, text: &str) -> Option<MatchResult>;

    fn create_node(&self, matched: &str, params: &MatchParams) -> Result<OutputNode, Unimplemented> {
        let _ = (matched, params);
        Err(Unimplemented)
    }

    /// Rewrite the raw markup before it is parsed.
    fn on_before_parse(&self, content: String) -> Result<String, HookError> {
        Ok(content)
    }

    /// Rewrite the finished output.
    fn on_after_parse(&self, nodes: Vec<OutputNode>) -> Result<Vec<OutputNode>, HookError> {
        Ok(nodes)
    }
}

/// `"no"` followed by the capitalized name.
pub fn default_inverse_flag(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("no{}{}", first.to_uppercase(), chars.as_str()),
        None => "no".to_string(),
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), SanitizeError> {
    if name.is_empty() || name.eq_ignore_ascii_case("html") {
        return Err(SanitizeError::InvalidMatcherName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Run `pattern` over `text` and turn the first match into a [`MatchResult`].
///
/// Named capture groups that participated in the match become params.
pub fn match_regex(pattern: &Regex, text: &str) -> Option<MatchResult> {
    let caps = pattern.captures(text)?;
    Some(match_captures(pattern, &caps))
}

/// Turn one set of captures of `pattern` into a [`MatchResult`].
///
/// For matchers that walk `captures_iter` and skip candidates they reject.
pub fn match_captures(pattern: &Regex, caps: &Captures<'_>) -> MatchResult {
    let whole = caps.get_match();
    let mut result = MatchResult::new(whole.as_str(), whole.start());

    for name in pattern.capture_names().flatten() {
        if let Some(group) = caps.name(name) {
            result.params.insert(name.to_string(), group.as_str().to_string());
        }
    }

    result
}

/// A matcher built from a regex and a node factory.
pub struct RegexMatcher<F> {
    name: String,
    tag: String,
    pattern: Regex,
    factory: F,
}

impl<F> RegexMatcher<F>
where
    F: Fn(&str, &MatchParams) -> OutputNode + Send + Sync,
{
    pub fn new(name: impl Into<String>, tag: impl Into<String>, pattern: Regex, factory: F) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            pattern,
            factory,
        }
    }
}

impl<F> Matcher for RegexMatcher<F>
where
    F: Fn(&str, &MatchParams) -> OutputNode + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn produced_tag(&self) -> &str {
        &self.tag
    }

    fn find(&self, text: &str) -> Option<MatchResult> {
        match_regex(&self.pattern, text)
    }

    fn create_node(&self, matched: &str, params: &MatchParams) -> Result<OutputNode, Unimplemented> {
        Ok((self.factory)(matched, params))
    }
}

impl<F> std::fmt::Debug for RegexMatcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegexMatcher")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}
