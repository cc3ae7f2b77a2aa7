//! Emoji conversion backed by a caller-supplied dataset.
//!
//! The dataset is plain data ([`EmojiEntry`] derives `Facet`, so it loads
//! from JSON or any other facet format) and is shared read-only between
//! matchers through an `Arc<EmojiData>`.

use colander::{
    AttrValue, CustomNode, HookError, MatchParams, MatchResult, Matcher, OutputNode,
    Unimplemented,
};
use facet::Facet;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::trace;

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[\w+\-]+:").expect("valid regex"));

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// One emoji of the dataset.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct EmojiEntry {
    /// Human-readable name, e.g. `grinning face`
    pub annotation: String,
    /// Dash-separated code points, e.g. `1F600`
    pub hexcode: String,
    /// The emoji itself
    pub unicode: String,
    /// Shortcodes without surrounding colons
    #[facet(default)]
    pub shortcodes: Vec<String>,
    #[facet(default)]
    pub emoticons: Vec<String>,
}

/// Lookup tables over a list of [`EmojiEntry`].
#[derive(Debug)]
pub struct EmojiData {
    entries: Vec<EmojiEntry>,
    by_hexcode: HashMap<String, usize>,
    by_shortcode: HashMap<String, usize>,
    by_unicode: HashMap<String, usize>,
    by_emoticon: HashMap<String, usize>,
    unicode_pattern: Option<Regex>,
    emoticon_pattern: Option<Regex>,
}

impl EmojiData {
    pub fn new(entries: Vec<EmojiEntry>) -> Result<Self, regex::Error> {
        let mut by_hexcode = HashMap::new();
        let mut by_shortcode = HashMap::new();
        let mut by_unicode = HashMap::new();
        let mut by_emoticon = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            by_hexcode.entry(entry.hexcode.to_ascii_uppercase()).or_insert(idx);
            for code in &entry.shortcodes {
                by_shortcode.entry(normalize_shortcode(code)).or_insert(idx);
            }
            for emoticon in &entry.emoticons {
                by_emoticon.entry(emoticon.clone()).or_insert(idx);
            }
            if entry.unicode.is_empty() {
                continue;
            }
            by_unicode.entry(entry.unicode.clone()).or_insert(idx);

            // text is often typed without the presentation selector
            let bare: String = entry.unicode.chars().filter(|&c| c != VARIATION_SELECTOR).collect();
            if bare != entry.unicode && !bare.is_ascii() {
                by_unicode.entry(bare).or_insert(idx);
            }
        }

        let unicode_pattern = alternation(by_unicode.keys())?;
        let emoticon_pattern = alternation(by_emoticon.keys())?;

        Ok(Self {
            entries,
            by_hexcode,
            by_shortcode,
            by_unicode,
            by_emoticon,
            unicode_pattern,
            emoticon_pattern,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_hexcode(&self, hexcode: &str) -> Option<&EmojiEntry> {
        self.get(self.by_hexcode.get(&hexcode.to_ascii_uppercase()))
    }

    /// Accepts the shortcode with or without colons.
    pub fn by_shortcode(&self, shortcode: &str) -> Option<&EmojiEntry> {
        self.get(self.by_shortcode.get(&normalize_shortcode(shortcode)))
    }

    pub fn by_unicode(&self, unicode: &str) -> Option<&EmojiEntry> {
        self.get(self.by_unicode.get(unicode))
    }

    pub fn by_emoticon(&self, emoticon: &str) -> Option<&EmojiEntry> {
        self.get(self.by_emoticon.get(emoticon))
    }

    fn get(&self, idx: Option<&usize>) -> Option<&EmojiEntry> {
        idx.and_then(|&idx| self.entries.get(idx))
    }
}

fn normalize_shortcode(code: &str) -> String {
    code.trim_matches(':').to_lowercase()
}

/// A regex matching any of `literals`, longest first so that sequences win
/// over their prefixes.
fn alternation<'a>(literals: impl Iterator<Item = &'a String>) -> Result<Option<Regex>, regex::Error> {
    let mut literals: Vec<&str> = literals.map(String::as_str).collect();
    if literals.is_empty() {
        return Ok(None);
    }
    literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let pattern = literals
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&pattern).size_limit(1 << 26).build().map(Some)
}

/// Converts shortcodes, unicode emoji and (optionally) emoticons into
/// `Emoji` custom nodes.
#[derive(Debug, Clone)]
pub struct EmojiMatcher {
    data: Arc<EmojiData>,
    convert_emoticon: bool,
    convert_shortcode: bool,
    convert_unicode: bool,
    enlarge_threshold: usize,
}

impl EmojiMatcher {
    pub fn new(data: Arc<EmojiData>) -> Self {
        Self {
            data,
            convert_emoticon: false,
            convert_shortcode: true,
            convert_unicode: true,
            enlarge_threshold: 1,
        }
    }

    /// Also convert emoticons such as `:)`, when they stand on their own.
    pub fn convert_emoticons(mut self, on: bool) -> Self {
        self.convert_emoticon = on;
        self
    }

    pub fn convert_shortcodes(mut self, on: bool) -> Self {
        self.convert_shortcode = on;
        self
    }

    pub fn convert_unicode(mut self, on: bool) -> Self {
        self.convert_unicode = on;
        self
    }

    /// Content made of at most this many emoji (and whitespace) is flagged
    /// `large`. Zero turns enlarging off.
    pub fn with_enlarge_threshold(mut self, threshold: usize) -> Self {
        self.enlarge_threshold = threshold;
        self
    }

    fn result(&self, matched: &str, index: usize, kind: &str, entry: &EmojiEntry) -> MatchResult {
        MatchResult::new(matched, index)
            .with_param(kind, matched)
            .with_param("hexcode", entry.hexcode.as_str())
    }

    fn find_emoticon(&self, text: &str) -> Option<MatchResult> {
        let pattern = self.data.emoticon_pattern.as_ref()?;
        pattern
            .find_iter(text)
            .find(|m| {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                before.is_none_or(char::is_whitespace) && after.is_none_or(char::is_whitespace)
            })
            .and_then(|m| {
                let entry = self.data.by_emoticon(m.as_str())?;
                Some(self.result(m.as_str(), m.start(), "emoticon", entry))
            })
    }

    fn find_shortcode(&self, text: &str) -> Option<MatchResult> {
        let mut at = 0;
        while let Some(m) = SHORTCODE.find_at(text, at) {
            if let Some(entry) = self.data.by_shortcode(m.as_str()) {
                return Some(self.result(m.as_str(), m.start(), "shortcode", entry));
            }
            trace!(shortcode = m.as_str(), "unknown shortcode");
            // the closing colon may open the next shortcode
            at = m.end() - 1;
        }
        None
    }

    fn find_unicode(&self, text: &str) -> Option<MatchResult> {
        let pattern = self.data.unicode_pattern.as_ref()?;
        let m = pattern.find(text)?;
        let entry = self.data.by_unicode(m.as_str())?;
        Some(self.result(m.as_str(), m.start(), "unicode", entry))
    }
}

impl Matcher for EmojiMatcher {
    fn name(&self) -> &str {
        "emoji"
    }

    fn produced_tag(&self) -> &str {
        "img"
    }

    fn find(&self, text: &str) -> Option<MatchResult> {
        let candidates = [
            self.convert_emoticon.then(|| self.find_emoticon(text)).flatten(),
            self.convert_shortcode.then(|| self.find_shortcode(text)).flatten(),
            self.convert_unicode.then(|| self.find_unicode(text)).flatten(),
        ];
        candidates.into_iter().flatten().min_by_key(|r| r.index)
    }

    fn create_node(&self, matched: &str, params: &MatchParams) -> Result<OutputNode, Unimplemented> {
        let Some(entry) = params.get("hexcode").and_then(|h| self.data.by_hexcode(h)) else {
            return Ok(OutputNode::text(matched));
        };

        let shortcode = match (params.get("shortcode"), entry.shortcodes.first()) {
            (Some(typed), _) => typed.clone(),
            (None, Some(first)) => format!(":{first}:"),
            (None, None) => String::new(),
        };

        Ok(CustomNode::new("Emoji")
            .with_prop("hexcode", entry.hexcode.as_str())
            .with_prop("unicode", entry.unicode.as_str())
            .with_prop("shortcode", shortcode)
            .with_prop("annotation", entry.annotation.as_str())
            .with_child(OutputNode::text(entry.unicode.as_str()))
            .into())
    }

    fn on_after_parse(&self, mut nodes: Vec<OutputNode>) -> Result<Vec<OutputNode>, HookError> {
        let mut count = 0;
        for node in &nodes {
            match node {
                OutputNode::Custom(custom) if custom.component == "Emoji" => count += 1,
                OutputNode::Text(text) if text.trim().is_empty() => {}
                _ => return Ok(nodes),
            }
        }

        if count == 0 || count > self.enlarge_threshold {
            return Ok(nodes);
        }

        for node in &mut nodes {
            if let OutputNode::Custom(custom) = node {
                custom.props.insert("large".to_string(), AttrValue::Bool(true));
            }
        }
        Ok(nodes)
    }
}
