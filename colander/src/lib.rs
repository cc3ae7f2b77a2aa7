//! Whitelist-based HTML sanitizer built on html5ever.
//!
//! colander turns untrusted markup into an ordered list of [`OutputNode`]s
//! that any renderer can display safely:
//! - **Tag policies**: only classified, allowed tags render, and only where
//!   their nesting rules permit; anything else passes its children through
//! - **Attribute policies**: an allow table with casts and renames, plus a
//!   node-level URL scheme check
//! - **Filters**: pluggable rewriting of attribute values and elements
//! - **Matchers**: pluggable recognizers that turn text patterns (links,
//!   hashtags, emoji) into nodes, spliced back in document order
//! - **Transforms**: a hook that can replace or drop any element
//!
//! Hostile content is never an error: it is elided. Errors only report caller
//! and plugin bugs.
//!
//! # Example
//!
//! ```rust
//! use colander::{OutputNode, SanitizeOptions, Sanitizer};
//!
//! let nodes = colander::sanitize("Foo\nBar").unwrap();
//! assert_eq!(nodes[0], OutputNode::text("Foo"));
//! assert!(nodes[1].as_element().unwrap().self_closing);
//!
//! let sanitizer = Sanitizer::with_options(SanitizeOptions::default().suppress_html());
//! let nodes = sanitizer.sanitize("<b>bold</b> text").unwrap();
//! assert_eq!(nodes, vec![OutputNode::text("bold text")]);
//! ```

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

pub mod arena_dom;
pub mod attributes;
mod context;
mod error;
mod filter;
mod matcher;
mod options;
mod output;
mod sanitizer;
pub mod serialize;
pub mod tags;
mod tokens;
mod transform;
mod walker;

pub use arena_dom::ElementData;
pub use error::{HookError, SanitizeError, Unimplemented};
pub use filter::Filter;
pub use matcher::{MatchParams, MatchResult, Matcher, RegexMatcher, default_inverse_flag, match_captures, match_regex};
pub use options::{Mode, SanitizeOptions};
pub use output::{AttrValue, CustomNode, ElementNode, OutputNode, text_content};
pub use sanitizer::{Sanitizer, convert_line_breaks, escape_markup, sanitize};
pub use serialize::render_html;
pub use tags::{ContentType, TagPolicy, can_place, policy_of};
pub use transform::{FnTransform, Transform, Transformed};
