use colander::{MatchParams, MatchResult, Matcher, OutputNode, Unimplemented, match_captures};

use crate::link::anchor;
use crate::patterns::IP;

/// Links IPv4 addresses, with optional scheme, port and path.
#[derive(Debug, Clone, Default)]
pub struct IpMatcher {
    new_window: bool,
}

impl IpMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_window(mut self) -> Self {
        self.new_window = true;
        self
    }
}

impl Matcher for IpMatcher {
    fn name(&self) -> &str {
        "ip"
    }

    fn produced_tag(&self) -> &str {
        "a"
    }

    fn find(&self, text: &str) -> Option<MatchResult> {
        // `1.2.3.4.5` is a version number, not an address
        IP.captures_iter(text)
            .find(|caps| {
                let whole = caps.get_match();
                !dotted_digit(text[whole.end()..].chars())
                    && !dotted_digit(text[..whole.start()].chars().rev())
            })
            .map(|caps| match_captures(&IP, &caps))
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

fn dotted_digit(mut chars: impl Iterator<Item = char>) -> bool {
    chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_digit())
}
