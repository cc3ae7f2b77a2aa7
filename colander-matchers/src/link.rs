use colander::{ElementNode, OutputNode};

/// An `a` element with the matched text as its only child.
pub(crate) fn anchor(href: impl Into<String>, text: &str, new_window: bool) -> OutputNode {
    let mut link = ElementNode::new("a").with_attr("href", href.into());
    if new_window {
        link = link
            .with_attr("target", "_blank")
            .with_attr("rel", "noopener noreferrer");
    }
    link.with_text(text).into()
}

/// Percent-encode everything outside the URL unreserved set.
pub(crate) fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(b as char);
            }
            _ => {
                result.push_str(&format!("%{b:02X}"));
            }
        }
    }
    result
}
