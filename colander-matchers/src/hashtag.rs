use colander::{MatchParams, MatchResult, Matcher, OutputNode, Unimplemented, match_captures};

use crate::link::{anchor, url_encode};
use crate::patterns::HASHTAG;

/// Links `#hashtag` words.
///
/// With a URL template, every `{{hashtag}}` in it is replaced by the tag
/// (without `#`). Without one, the link is the fragment reference `#tag`.
#[derive(Debug, Clone, Default)]
pub struct HashtagMatcher {
    url_template: Option<String>,
    encode: bool,
    new_window: bool,
}

impl HashtagMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link to `template`, e.g. `https://example.com/tags/{{hashtag}}`.
    pub fn with_url(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    /// Percent-encode the tag before it is placed in the URL template.
    pub fn encode_hashtag(mut self) -> Self {
        self.encode = true;
        self
    }

    pub fn new_window(mut self) -> Self {
        self.new_window = true;
        self
    }

    fn href(&self, tag: &str) -> String {
        match &self.url_template {
            Some(template) => {
                let tag = if self.encode { url_encode(tag) } else { tag.to_string() };
                template.replace("{{hashtag}}", &tag)
            }
            None => format!("#{tag}"),
        }
    }
}

impl Matcher for HashtagMatcher {
    fn name(&self) -> &str {
        "hashtag"
    }

    fn produced_tag(&self) -> &str {
        "a"
    }

    fn find(&self, text: &str) -> Option<MatchResult> {
        // a `#` glued to a word or to a placeholder is not a hashtag
        HASHTAG
            .captures_iter(text)
            .find(|caps| {
                let start = caps.get_match().start();
                text[..start]
                    .chars()
                    .next_back()
                    .is_none_or(|c| !(c.is_alphanumeric() || matches!(c, '_' | '&' | '#' | '}')))
            })
            .map(|caps| match_captures(&HASHTAG, &caps))
    }

    fn create_node(&self, matched: &str, params: &MatchParams) -> Result<OutputNode, Unimplemented> {
        let tag = params
            .get("hashtag")
            .map(String::as_str)
            .unwrap_or_else(|| matched.trim_start_matches('#'));
        Ok(anchor(self.href(tag), matched, self.new_window))
    }
}
