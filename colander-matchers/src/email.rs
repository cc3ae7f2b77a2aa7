use colander::{MatchParams, MatchResult, Matcher, OutputNode, Unimplemented, match_captures};

use crate::link::anchor;
use crate::patterns::{EMAIL, is_valid_tld, tld_of};

/// Links e-mail addresses to `mailto:`.
#[derive(Debug, Clone, Default)]
pub struct EmailMatcher {
    new_window: bool,
}

impl EmailMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_window(mut self) -> Self {
        self.new_window = true;
        self
    }
}

impl Matcher for EmailMatcher {
    fn name(&self) -> &str {
        "email"
    }

    fn produced_tag(&self) -> &str {
        "a"
    }

    fn find(&self, text: &str) -> Option<MatchResult> {
        EMAIL
            .captures_iter(text)
            .find(|caps| is_valid_tld(tld_of(&caps["host"])))
            .map(|caps| match_captures(&EMAIL, &caps))
    }

    fn create_node(&self, matched: &str, _params: &MatchParams) -> Result<OutputNode, Unimplemented> {
        Ok(anchor(format!("mailto:{matched}"), matched, self.new_window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_address() {
        let matcher = EmailMatcher::new();
        let result = matcher.find("ping ops@example.org.").unwrap();
        assert_eq!(result.matched, "ops@example.org");
        assert_eq!(result.index, 5);
        assert_eq!(result.params.get("username").map(String::as_str), Some("ops"));
        assert_eq!(result.params.get("host").map(String::as_str), Some("example.org"));

        let node = matcher.create_node(&result.matched, &result.params).unwrap();
        let elem = node.as_element().unwrap();
        assert_eq!(
            elem.attr("href").and_then(|v| v.as_str()),
            Some("mailto:ops@example.org")
        );
        assert_eq!(node.text_content(), "ops@example.org");
    }

    #[test]
    fn test_rejects_unknown_tld() {
        let matcher = EmailMatcher::new();
        assert!(matcher.find("name@host.local").is_none());
        assert_eq!(matcher.inverse_flag(), "noEmail");
    }
}
