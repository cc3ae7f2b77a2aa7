//! Autolink and emoji matchers for [`colander`].
//!
//! Each matcher implements [`colander::Matcher`] and is registered on a
//! [`colander::Sanitizer`]:
//!
//! ```rust
//! use colander::Sanitizer;
//! use colander_matchers::{EmailMatcher, HashtagMatcher, UrlMatcher};
//!
//! let sanitizer = Sanitizer::new()
//!     .with_matcher(EmailMatcher::new())
//!     .and_then(|s| s.with_matcher(UrlMatcher::new()))
//!     .and_then(|s| s.with_matcher(HashtagMatcher::new()))
//!     .unwrap();
//!
//! let nodes = sanitizer.sanitize("mail me@example.com or visit example.com").unwrap();
//! let links: Vec<_> = nodes.iter().filter_map(|n| n.as_element()).collect();
//! assert_eq!(links[0].attr("href").unwrap().as_str(), Some("mailto:me@example.com"));
//! assert_eq!(links[1].attr("href").unwrap().as_str(), Some("http://example.com"));
//! ```
//!
//! Matchers run in registration order, and a later matcher never sees text an
//! earlier one already claimed. Register [`EmailMatcher`] before
//! [`UrlMatcher`] so the domain of an address is not linked on its own, and
//! [`UrlMatcher`] before [`HashtagMatcher`] so URL fragments stay in their
//! link.

mod tracing_macros;
pub(crate) use tracing_macros::trace;

mod email;
mod emoji;
mod hashtag;
mod ip;
mod link;
mod patterns;
mod url;

pub use email::EmailMatcher;
pub use emoji::{EmojiData, EmojiEntry, EmojiMatcher};
pub use hashtag::HashtagMatcher;
pub use ip::IpMatcher;
pub use patterns::is_valid_tld;
pub use url::UrlMatcher;
