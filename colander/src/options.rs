//! Sanitizer configuration.

use std::collections::HashSet;

/// How plugin bugs are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Plugin contract violations and root documents are hard errors
    #[default]
    Strict,
    /// Root documents sanitize to nothing, unimplemented matcher methods
    /// degrade to plain text
    Lenient,
}

/// Options for a sanitize call.
#[derive(Clone, Debug)]
pub struct SanitizeOptions {
    /// Render no elements at all; text is emitted raw, without matchers (default: false)
    pub suppress_html: bool,
    /// Render no elements, but still run matchers over text (default: false)
    pub suppress_html_except_matchers: bool,
    /// Keep newlines as text instead of converting them to `<br/>` (default: false)
    pub disable_line_breaks: bool,
    /// Render every non-blacklisted tag and skip nesting validation (default: false)
    pub disable_whitelist: bool,
    /// Escape `&`, `<` and `>` before parsing so markup shows up as text (default: false)
    pub escape_html: bool,
    /// Tags that may be rendered. `None` means every classified tag except
    /// `canvas` and `iframe`.
    pub allow_list: Option<HashSet<String>>,
    /// Tags whose wrapper is never rendered (children still are)
    pub block_list: HashSet<String>,
    /// Inverse flag names (`noUrl`, `noEmoji`, ...) of matchers to skip
    pub disabled_matchers: HashSet<String>,
    /// Only hand allowed tags to the transform hook (default: false)
    pub transform_only_allow_list: bool,
    /// Tag whose policy is the parent context of top-level content (default: "div")
    pub container_tag: String,
    /// Elements nested deeper than this are dropped with their subtree (default: 256)
    pub max_depth: usize,
    pub mode: Mode,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            suppress_html: false,
            suppress_html_except_matchers: false,
            disable_line_breaks: false,
            disable_whitelist: false,
            escape_html: false,
            allow_list: None,
            block_list: HashSet::new(),
            disabled_matchers: HashSet::new(),
            transform_only_allow_list: false,
            container_tag: "div".to_string(),
            max_depth: 256,
            mode: Mode::Strict,
        }
    }
}

impl SanitizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress_html(mut self) -> Self {
        self.suppress_html = true;
        self
    }

    pub fn suppress_html_except_matchers(mut self) -> Self {
        self.suppress_html_except_matchers = true;
        self
    }

    pub fn disable_line_breaks(mut self) -> Self {
        self.disable_line_breaks = true;
        self
    }

    pub fn disable_whitelist(mut self) -> Self {
        self.disable_whitelist = true;
        self
    }

    pub fn escape_html(mut self) -> Self {
        self.escape_html = true;
        self
    }

    /// Replace the allow list.
    pub fn allow_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Add tags to the block list.
    pub fn block_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.block_list.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Disable a matcher by its inverse flag name (e.g. `noUrl`).
    pub fn disable_matcher(mut self, inverse_flag: impl Into<String>) -> Self {
        self.disabled_matchers.insert(inverse_flag.into());
        self
    }

    pub fn transform_only_allow_list(mut self) -> Self {
        self.transform_only_allow_list = true;
        self
    }

    pub fn container_tag(mut self, tag: impl Into<String>) -> Self {
        self.container_tag = tag.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn lenient(mut self) -> Self {
        self.mode = Mode::Lenient;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.mode == Mode::Strict
    }

    /// Whether elements may be rendered at all.
    pub(crate) fn renders_html(&self) -> bool {
        !self.suppress_html && !self.suppress_html_except_matchers
    }

    /// Whether text runs go through the matchers.
    pub(crate) fn runs_matchers(&self) -> bool {
        !self.suppress_html || self.suppress_html_except_matchers
    }
}
