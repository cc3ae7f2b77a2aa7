//! The bundled matchers registered on a real sanitizer.

use colander::{AttrValue, ElementNode, OutputNode, SanitizeOptions, Sanitizer, render_html, text_content};
use colander_matchers::{EmailMatcher, EmojiData, EmojiEntry, EmojiMatcher, HashtagMatcher, IpMatcher, UrlMatcher};
use facet_testhelpers::test;
use std::collections::HashSet;
use std::sync::Arc;

fn emoji_data() -> Arc<EmojiData> {
    let entries: Vec<EmojiEntry> =
        facet_json::from_str(include_str!("data/emoji.json")).expect("dataset should deserialize");
    Arc::new(EmojiData::new(entries).expect("dataset should compile"))
}

fn autolinker(options: SanitizeOptions) -> Sanitizer {
    Sanitizer::with_options(options)
        .with_matcher(EmailMatcher::new())
        .and_then(|s| s.with_matcher(UrlMatcher::new()))
        .and_then(|s| s.with_matcher(IpMatcher::new()))
        .and_then(|s| s.with_matcher(HashtagMatcher::new()))
        .expect("matcher names are valid")
}

fn href(node: &OutputNode) -> &str {
    node.as_element()
        .and_then(|e| e.attr("href"))
        .and_then(AttrValue::as_str)
        .unwrap_or_else(|| panic!("expected a link, got {node:?}"))
}

#[test]
fn test_links_in_prose() {
    let out = autolinker(SanitizeOptions::default())
        .sanitize("Contact me@example.com, see https://example.com/docs or #rust at 10.0.0.1")
        .unwrap();

    assert_eq!(out.len(), 8);
    assert_eq!(out[0], OutputNode::text("Contact "));
    assert_eq!(href(&out[1]), "mailto:me@example.com");
    assert_eq!(out[2], OutputNode::text(", see "));
    assert_eq!(href(&out[3]), "https://example.com/docs");
    assert_eq!(out[4], OutputNode::text(" or "));
    assert_eq!(href(&out[5]), "#rust");
    assert_eq!(out[6], OutputNode::text(" at "));
    assert_eq!(href(&out[7]), "http://10.0.0.1");

    assert_eq!(
        text_content(&out),
        "Contact me@example.com, see https://example.com/docs or #rust at 10.0.0.1"
    );

    let keys: HashSet<u32> = out.iter().filter_map(OutputNode::key).collect();
    assert_eq!(keys.len(), 4);
}

#[test]
fn test_links_inside_markup() {
    let out = autolinker(SanitizeOptions::default())
        .sanitize("<p>Read <b>example.org/a.</b></p>")
        .unwrap();

    let p = out[0].as_element().unwrap();
    let b = p.children[1].as_element().unwrap();
    assert_eq!(b.tag, "b");
    assert_eq!(href(&b.children[0]), "http://example.org/a");
    assert_eq!(b.children[1], OutputNode::text("."));
}

#[test]
fn test_no_link_inside_link() {
    let out = autolinker(SanitizeOptions::default())
        .sanitize(r#"<a href="https://x.org">visit example.com</a>"#)
        .unwrap();

    assert_eq!(out.len(), 1);
    let a = out[0].as_element().unwrap();
    assert_eq!(a.children, vec![OutputNode::text("visit example.com")]);
}

#[test]
fn test_rejected_candidates_stay_text() {
    let out = autolinker(SanitizeOptions::default())
        .sanitize("issue#rust and #rust")
        .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], OutputNode::text("issue#rust and "));
    assert_eq!(href(&out[1]), "#rust");

    let out = autolinker(SanitizeOptions::default())
        .sanitize("a.example.comx example.com")
        .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], OutputNode::text("a.example.comx "));
    assert_eq!(href(&out[1]), "http://example.com");

    let sanitizer = Sanitizer::new()
        .with_matcher(EmojiMatcher::new(emoji_data()).convert_emoticons(true))
        .unwrap();
    let out = sanitizer.sanitize("f(x:) :)").unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], OutputNode::text("f(x:) "));
    assert_eq!(out[1].as_custom().unwrap().prop("unicode").and_then(AttrValue::as_str), Some("🙂"));
}

#[test]
fn test_no_link_inside_link_without_whitelist() {
    let out = autolinker(SanitizeOptions::default().disable_whitelist())
        .sanitize(r#"<a href="https://x.org">visit example.com</a>"#)
        .unwrap();

    assert_eq!(out.len(), 1);
    let a = out[0].as_element().unwrap();
    assert_eq!(a.children, vec![OutputNode::text("visit example.com")]);
}

#[test]
fn test_links_need_an_allowed_anchor() {
    let out = autolinker(SanitizeOptions::default().allow_tags(["b"]))
        .sanitize("<b>example.com</b>")
        .unwrap();

    let b = out[0].as_element().unwrap();
    assert_eq!(b.children, vec![OutputNode::text("example.com")]);
}

#[test]
fn test_disabled_matcher() {
    let out = autolinker(SanitizeOptions::default().disable_matcher("noUrl"))
        .sanitize("example.com and #tag")
        .unwrap();

    assert_eq!(out[0], OutputNode::text("example.com and "));
    assert_eq!(href(&out[1]), "#tag");
}

#[test]
fn test_escaped_markup_still_links() {
    let out = autolinker(SanitizeOptions::default().escape_html())
        .sanitize("<b>see</b> example.com")
        .unwrap();

    assert_eq!(out[0], OutputNode::text("<b>see</b> "));
    assert_eq!(href(&out[1]), "http://example.com");
}

#[test]
fn test_hashtag_url_template() {
    let sanitizer = Sanitizer::new()
        .with_matcher(
            HashtagMatcher::new()
                .with_url("https://example.com/tags/{{hashtag}}")
                .new_window(),
        )
        .unwrap();
    let out = sanitizer.sanitize("#rust").unwrap();
    let a = out[0].as_element().unwrap();
    assert_eq!(href(&out[0]), "https://example.com/tags/rust");
    assert_eq!(a.attr("target").and_then(AttrValue::as_str), Some("_blank"));

    assert_eq!(
        render_html(&out),
        r#"<a href="https://example.com/tags/rust" target="_blank" rel="noopener noreferrer">#rust</a>"#
    );
}

#[test]
fn test_single_emoji_is_large() {
    let sanitizer = Sanitizer::new()
        .with_matcher(EmojiMatcher::new(emoji_data()))
        .unwrap();

    let out = sanitizer.sanitize("🦀").unwrap();
    assert_eq!(out.len(), 1);
    let emoji = out[0].as_custom().unwrap();
    assert_eq!(emoji.component, "Emoji");
    assert_eq!(emoji.prop("hexcode").and_then(AttrValue::as_str), Some("1F980"));
    assert_eq!(emoji.prop("large"), Some(&AttrValue::Bool(true)));
}

#[test]
fn test_emoji_in_text() {
    let sanitizer = Sanitizer::new()
        .with_matcher(EmojiMatcher::new(emoji_data()).convert_emoticons(true))
        .unwrap();

    let out = sanitizer.sanitize("I :heart: Rust 🦀 :)").unwrap();
    let components: Vec<&str> = out
        .iter()
        .filter_map(|n| n.as_custom())
        .map(|c| c.component.as_str())
        .collect();
    assert_eq!(components, ["Emoji", "Emoji", "Emoji"]);
    assert_eq!(out[0], OutputNode::text("I "));
    assert!(out.iter().filter_map(|n| n.as_custom()).all(|c| c.prop("large").is_none()));
    assert_eq!(render_html(&out), "I ❤️ Rust 🦀 🙂");
}

#[test]
fn test_emoji_disabled_when_img_blocked() {
    let sanitizer = Sanitizer::with_options(SanitizeOptions::default().block_tags(["img"]))
        .with_matcher(EmojiMatcher::new(emoji_data()))
        .unwrap();

    let out = sanitizer.sanitize("hi :crab:").unwrap();
    assert_eq!(out, vec![OutputNode::text("hi :crab:")]);
}

#[test]
fn test_shared_dataset_across_threads() {
    let data = emoji_data();
    let sanitizer = Arc::new(
        Sanitizer::new()
            .with_matcher(EmojiMatcher::new(Arc::clone(&data)))
            .and_then(|s| s.with_matcher(UrlMatcher::new()))
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sanitizer = Arc::clone(&sanitizer);
            std::thread::spawn(move || sanitizer.sanitize(&format!(":thumbsup: example.com/{i}")).unwrap())
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.join().unwrap();
        assert_eq!(out[0].as_custom().unwrap().prop("unicode").and_then(AttrValue::as_str), Some("👍"));
        assert_eq!(href(&out[2]), format!("http://example.com/{i}"));
    }
    assert_eq!(data.len(), 5);
}

#[test]
fn test_link_nodes_are_plain_elements() {
    let out = autolinker(SanitizeOptions::default()).sanitize("ops@example.org").unwrap();
    let expected = ElementNode::new("a")
        .with_attr("href", "mailto:ops@example.org")
        .with_text("ops@example.org");
    let a = out[0].as_element().unwrap();
    assert_eq!(a.attributes, expected.attributes);
    assert_eq!(a.children, expected.children);
    assert!(!a.self_closing);
}
