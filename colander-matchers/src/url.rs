use colander::{MatchParams, MatchResult, Matcher, OutputNode, Unimplemented, match_captures};
use std::collections::HashSet;

use crate::link::anchor;
use crate::patterns::{URL, is_valid_tld, tld_of};
use crate::trace;

/// Links web addresses, with or without an `http(s)://` scheme.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    custom_tlds: HashSet<String>,
    validate_tlds: bool,
    new_window: bool,
}

impl Default for UrlMatcher {
    fn default() -> Self {
        Self {
            custom_tlds: HashSet::new(),
            validate_tlds: true,
            new_window: false,
        }
    }
}

impl UrlMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept these top-level domains in addition to the built-in list.
    pub fn with_custom_tlds<I, S>(mut self, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.custom_tlds
            .extend(tlds.into_iter().map(|t| t.as_ref().to_ascii_lowercase()));
        self
    }

    /// Turn off top-level domain checks: anything shaped like a host links.
    pub fn skip_tld_validation(mut self) -> Self {
        self.validate_tlds = false;
        self
    }

    /// Open links in a new window (`target="_blank"`).
    pub fn new_window(mut self) -> Self {
        self.new_window = true;
        self
    }

    fn accepts_host(&self, host: &str) -> bool {
        if !self.validate_tlds {
            return true;
        }
        let tld = tld_of(host);
        is_valid_tld(tld) || self.custom_tlds.contains(&tld.to_lowercase())
    }
}

impl Matcher for UrlMatcher {
    fn name(&self) -> &str {
        "url"
    }

    fn produced_tag(&self) -> &str {
        "a"
    }

    fn find(&self, text: &str) -> Option<MatchResult> {
        URL.captures_iter(text)
            .find(|caps| {
                let ok = self.accepts_host(&caps["host"]);
                if !ok {
                    trace!(host = &caps["host"], "unknown top-level domain");
                }
                ok
            })
            .map(|caps| match_captures(&URL, &caps))
    }

    fn create_node(&self, matched: &str, params: &MatchParams) -> Result<OutputNode, Unimplemented> {
        let href = if params.contains_key("scheme") {
            matched.to_string()
        } else {
            format!("http://{matched}")
        };
        Ok(anchor(href, matched, self.new_window))
    }
}
