//! Errors raised for caller and plugin bugs.
//!
//! Hostile or malformed *content* never produces an error: disallowed tags,
//! attributes and URLs are dropped silently. These variants only cover
//! misuse of the API and broken matcher/filter implementations.

use facet::Facet;

/// Errors that can occur while sanitizing.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum SanitizeError {
    /// markup is not valid UTF-8 text (valid up to byte {valid_up_to})
    InvalidInputType { valid_up_to: usize },

    /// full HTML documents (doctype, html, head or body) are not supported as content
    UnsupportedRootDocument,

    /// matcher {matcher} broke the {hook} contract: {reason}
    InvalidCallbackContract {
        matcher: String,
        hook: String,
        reason: String,
    },

    /// matcher {matcher} does not implement {method}
    NotImplemented { matcher: String, method: String },

    /// matcher name "{name}" is not allowed
    InvalidMatcherName { name: String },
}

/// Returned by a hook that could not honor its contract.
///
/// Carries a human-readable reason, surfaced through
/// [`SanitizeError::InvalidCallbackContract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError(pub String);

impl HookError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for HookError {}

/// Marker returned by trait methods a plugin chose not to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unimplemented;
