//! The sanitizer facade: options plus plugins, and the full pipeline.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::arena_dom::{self, ElementData};
use crate::context::ParseContext;
use crate::error::{HookError, SanitizeError};
use crate::filter::Filter;
use crate::matcher::{Matcher, validate_name};
use crate::options::SanitizeOptions;
use crate::output::OutputNode;
use crate::tags::{self, TagPolicy};
use crate::tokens;
use crate::transform::{FnTransform, Transform, Transformed};
use crate::walker::{self, Plugins};
use crate::{debug, trace};

static ROOT_DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(!doctype|(html|head|body)(\s|>))").expect("valid regex")
});

/// Closing tags (`</p>`) or self-closed tags (`<br/>`): markup that manages
/// its own line breaks.
static EXPLICIT_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<((?:/[ a-z]+)|(?:[ a-z]+/))>").expect("valid regex"));

static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Sanitizes markup into [`OutputNode`]s.
///
/// One instance can serve any number of calls, from several threads at once:
/// all per-call state is created inside [`Sanitizer::sanitize`].
///
/// ```
/// use colander::{OutputNode, Sanitizer};
///
/// let nodes = Sanitizer::new()
///     .sanitize(r#"Foo <a href="javascript:alert(1)">Bar</a>"#)
///     .unwrap();
/// assert_eq!(nodes[0], OutputNode::text("Foo "));
/// assert!(nodes[1].as_element().unwrap().attributes.is_none());
/// ```
#[derive(Default)]
pub struct Sanitizer {
    options: SanitizeOptions,
    matchers: Vec<Box<dyn Matcher>>,
    filters: Vec<Box<dyn Filter>>,
    transform: Option<Box<dyn Transform>>,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SanitizeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &SanitizeOptions {
        &self.options
    }

    /// Register a matcher. Matchers run in registration order.
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Result<Self, SanitizeError> {
        validate_name(matcher.name())?;
        self.matchers.push(Box::new(matcher));
        Ok(self)
    }

    /// Register a filter. Filters run in registration order.
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Set the transform hook, replacing any previous one.
    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn with_transform_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str, &ElementData, &[OutputNode], Option<&TagPolicy>) -> Transformed
            + Send
            + Sync
            + 'static,
    {
        self.with_transform(FnTransform(f))
    }

    fn active_matchers(&self) -> impl Iterator<Item = &dyn Matcher> {
        self.matchers
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !self.options.disabled_matchers.contains(&m.inverse_flag()))
    }

    /// Sanitize markup.
    ///
    /// Errors only signal caller or plugin bugs; hostile content is elided.
    pub fn sanitize(&self, markup: &str) -> Result<Vec<OutputNode>, SanitizeError> {
        let mut content = markup.to_string();
        for matcher in self.active_matchers() {
            content = matcher
                .on_before_parse(content)
                .map_err(|e| hook_error(matcher, "on_before_parse", e))?;
        }

        if ROOT_DOCUMENT.is_match(&content) {
            if self.options.is_strict() {
                return Err(SanitizeError::UnsupportedRootDocument);
            }
            debug!("root document markup, producing nothing");
            return Ok(Vec::new());
        }

        if self.options.escape_html {
            content = escape_markup(&content).into_owned();
        }

        let content = convert_line_breaks(&content, &self.options);
        let mut doc = arena_dom::parse(&content);

        let mut ctx = ParseContext::new(&self.options);
        let plugins = Plugins {
            matchers: &self.matchers,
            filters: &self.filters,
            transform: self.transform.as_deref(),
        };
        let root = tags::policy_of(&self.options.container_tag.to_ascii_lowercase());
        let mut nodes = walker::walk(&mut ctx, &mut doc, &plugins, root)?;

        for matcher in self.active_matchers() {
            nodes = matcher
                .on_after_parse(nodes)
                .map_err(|e| hook_error(matcher, "on_after_parse", e))?;
        }

        Ok(nodes)
    }

    /// Sanitize markup given as bytes, which must be UTF-8.
    pub fn sanitize_bytes(&self, markup: &[u8]) -> Result<Vec<OutputNode>, SanitizeError> {
        let markup = std::str::from_utf8(markup).map_err(|e| SanitizeError::InvalidInputType {
            valid_up_to: e.valid_up_to(),
        })?;
        self.sanitize(markup)
    }

    /// Run the registered matchers over a single text run, as if it were
    /// the content of a `parent_tag` element.
    pub fn apply_matchers(
        &self,
        text: &str,
        parent_tag: &str,
    ) -> Result<Vec<OutputNode>, SanitizeError> {
        let mut ctx = ParseContext::new(&self.options);
        let parent = tags::policy_of(&parent_tag.to_ascii_lowercase());
        tokens::apply_matchers(&mut ctx, &self.matchers, text, parent)
    }
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.matchers.iter().map(|m| m.name()).collect();
        f.debug_struct("Sanitizer")
            .field("options", &self.options)
            .field("matchers", &names)
            .field("filters", &self.filters.len())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Sanitize markup with default options and no plugins.
pub fn sanitize(markup: &str) -> Result<Vec<OutputNode>, SanitizeError> {
    Sanitizer::new().sanitize(markup)
}

fn hook_error(matcher: &dyn Matcher, hook: &str, error: HookError) -> SanitizeError {
    SanitizeError::InvalidCallbackContract {
        matcher: matcher.name().to_string(),
        hook: hook.to_string(),
        reason: error.0,
    }
}

/// Escape `&`, `<` and `>` so the parser sees only text.
pub fn escape_markup(markup: &str) -> Cow<'_, str> {
    if !markup.contains(['&', '<', '>']) {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len() + 16);
    for c in markup.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Turn newlines into `<br/>` unless disabled or the markup already contains
/// closing or self-closed tags.
pub fn convert_line_breaks<'a>(markup: &'a str, options: &SanitizeOptions) -> Cow<'a, str> {
    if options.suppress_html
        || options.suppress_html_except_matchers
        || options.disable_line_breaks
        || EXPLICIT_MARKUP.is_match(markup)
    {
        return Cow::Borrowed(markup);
    }

    if !markup.contains(['\n', '\r']) {
        return Cow::Borrowed(markup);
    }

    trace!("converting line breaks");
    let normalized = markup.replace("\r\n", "\n").replace('\r', "\n");
    let clamped = NEWLINE_RUN.replace_all(&normalized, "\n\n");
    Cow::Owned(clamped.replace('\n', "<br/>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchParams, MatchResult, RegexMatcher};
    use crate::output::ElementNode;

    #[test]
    fn test_line_breaks() {
        let options = SanitizeOptions::default();
        assert_eq!(convert_line_breaks("a\nb", &options), "a<br/>b");
        assert_eq!(convert_line_breaks("a\r\nb\rc", &options), "a<br/>b<br/>c");
        assert_eq!(convert_line_breaks("a\n\n\n\n\nb", &options), "a<br/><br/>b");
        assert_eq!(convert_line_breaks("<p>a\nb</p>", &options), "<p>a\nb</p>");
        assert_eq!(convert_line_breaks("a<br/>\nb", &options), "a<br/>\nb");
        assert_eq!(convert_line_breaks("<b>a\nb", &options), "<b>a<br/>b");

        let disabled = SanitizeOptions::default().disable_line_breaks();
        assert_eq!(convert_line_breaks("a\nb", &disabled), "a\nb");
        let suppressed = SanitizeOptions::default().suppress_html();
        assert_eq!(convert_line_breaks("a\nb", &suppressed), "a\nb");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("plain"), "plain");
        assert_eq!(escape_markup("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn test_matcher_name_is_validated() {
        let matcher = RegexMatcher::new("html", "span", Regex::new("x").unwrap(), |m, _| {
            OutputNode::text(m)
        });
        let err = Sanitizer::new().with_matcher(matcher).unwrap_err();
        assert_eq!(err, SanitizeError::InvalidMatcherName { name: "html".into() });
    }

    struct Shouty;

    impl Matcher for Shouty {
        fn name(&self) -> &str {
            "shouty"
        }
        fn produced_tag(&self) -> &str {
            "b"
        }
        fn find(&self, _text: &str) -> Option<MatchResult> {
            None
        }
        fn create_node(&self, m: &str, _: &MatchParams) -> Result<OutputNode, crate::Unimplemented> {
            Ok(ElementNode::new("b").with_text(m).into())
        }
        fn on_before_parse(&self, content: String) -> Result<String, HookError> {
            Ok(content.to_uppercase())
        }
        fn on_after_parse(&self, nodes: Vec<OutputNode>) -> Result<Vec<OutputNode>, HookError> {
            if nodes.is_empty() {
                Err(HookError::new("nothing to shout"))
            } else {
                Ok(nodes)
            }
        }
    }

    #[test]
    fn test_hooks_fold_around_parse() {
        let sanitizer = Sanitizer::new().with_matcher(Shouty).unwrap();
        assert_eq!(sanitizer.sanitize("hi").unwrap(), vec![OutputNode::text("HI")]);

        assert_eq!(
            sanitizer.sanitize("").unwrap_err(),
            SanitizeError::InvalidCallbackContract {
                matcher: "shouty".into(),
                hook: "on_after_parse".into(),
                reason: "nothing to shout".into(),
            }
        );
    }

    #[test]
    fn test_disabled_matcher_hooks_do_not_run() {
        let sanitizer = Sanitizer::with_options(SanitizeOptions::default().disable_matcher("noShouty"))
            .with_matcher(Shouty)
            .unwrap();
        assert_eq!(sanitizer.sanitize("hi").unwrap(), vec![OutputNode::text("hi")]);
    }

    #[test]
    fn test_root_documents() {
        for markup in ["<!DOCTYPE html><p>x</p>", "<html><body>x</body></html>", "<BODY>x"] {
            assert_eq!(sanitize(markup), Err(SanitizeError::UnsupportedRootDocument));
        }
        let lenient = Sanitizer::with_options(SanitizeOptions::default().lenient());
        assert_eq!(lenient.sanitize("<head></head>").unwrap(), vec![]);
        assert!(sanitize("<header>x</header>").is_ok());
    }

    #[test]
    fn test_sanitize_bytes() {
        assert_eq!(
            Sanitizer::new().sanitize_bytes(b"ok").unwrap(),
            vec![OutputNode::text("ok")]
        );
        assert_eq!(
            Sanitizer::new().sanitize_bytes(b"ab\xffcd"),
            Err(SanitizeError::InvalidInputType { valid_up_to: 2 })
        );
    }
}
