//! Caller hook that can replace or drop elements before the default rules run.

use crate::arena_dom::ElementData;
use crate::output::OutputNode;
use crate::tags::TagPolicy;

/// What a [`Transform`] decided for an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    /// Drop the element and its subtree
    Drop,
    /// Emit this node instead; the sanitizer stamps its identity on it.
    /// Wins even over the blacklist.
    Replace(OutputNode),
    /// Apply the default rules
    Default,
}

/// Called for every element (after node filters) with its already sanitized
/// children.
pub trait Transform: Send + Sync {
    fn transform(
        &self,
        tag: &str,
        element: &ElementData,
        children: &[OutputNode],
        policy: Option<&TagPolicy>,
    ) -> Transformed;
}

/// Adapts a closure into a [`Transform`].
pub struct FnTransform<F>(pub F);

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str, &ElementData, &[OutputNode], Option<&TagPolicy>) -> Transformed + Send + Sync,
{
    fn transform(
        &self,
        tag: &str,
        element: &ElementData,
        children: &[OutputNode],
        policy: Option<&TagPolicy>,
    ) -> Transformed {
        (self.0)(tag, element, children, policy)
    }
}
