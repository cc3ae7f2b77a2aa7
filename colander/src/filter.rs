//! Pluggable rewriting of attribute values and elements.

use crate::arena_dom::ElementData;
use crate::trace;

/// Rewrites attribute values and can veto whole elements.
///
/// Both methods default to the identity. Filters run in registration order,
/// each seeing the previous filter's output, and should not touch global state.
pub trait Filter: Send + Sync {
    /// Rewrite the raw value of an attribute that passed the attribute policy.
    fn attribute(&self, name: &str, value: String) -> String {
        let _ = name;
        value
    }

    /// Rewrite an element before it is rendered. `None` drops the element
    /// together with its subtree.
    fn node(&self, name: &str, node: ElementData) -> Option<ElementData> {
        let _ = name;
        Some(node)
    }
}

pub(crate) fn apply_attribute_filters(filters: &[Box<dyn Filter>], name: &str, value: String) -> String {
    filters
        .iter()
        .fold(value, |value, filter| filter.attribute(name, value))
}

pub(crate) fn apply_node_filters(
    filters: &[Box<dyn Filter>],
    name: &str,
    node: ElementData,
) -> Option<ElementData> {
    let mut node = node;
    for filter in filters {
        match filter.node(name, node) {
            Some(next) => node = next,
            None => {
                trace!("<{}> vetoed by node filter", name);
                return None;
            }
        }
    }
    Some(node)
}
