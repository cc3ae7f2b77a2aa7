//! Attribute policy table and attribute extraction.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::arena_dom::ElementData;
use crate::filter::{Filter, apply_attribute_filters};
use crate::output::AttrValue;
use crate::trace;

/// What happens to an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Allow,
    Deny,
    /// Emit as a number (leading float)
    CastNumber,
    /// Emit `true` whenever present
    CastBool,
}

const ACTIONS: &[(&str, Action)] = &[
    ("alt", Action::Allow),
    ("cite", Action::Allow),
    ("class", Action::Allow),
    ("colspan", Action::CastNumber),
    ("controls", Action::CastBool),
    ("datetime", Action::Allow),
    ("default", Action::CastBool),
    ("dir", Action::Allow),
    ("disabled", Action::CastBool),
    ("height", Action::Allow),
    ("href", Action::Allow),
    ("id", Action::Allow),
    ("kind", Action::Allow),
    ("label", Action::Allow),
    ("lang", Action::Allow),
    ("loading", Action::Allow),
    ("loop", Action::CastBool),
    ("media", Action::Allow),
    ("muted", Action::CastBool),
    ("open", Action::CastBool),
    ("poster", Action::Allow),
    ("rel", Action::Allow),
    ("reversed", Action::CastBool),
    ("role", Action::Allow),
    ("rowspan", Action::CastNumber),
    ("scope", Action::Allow),
    ("sizes", Action::Allow),
    ("span", Action::CastNumber),
    ("src", Action::Allow),
    ("srclang", Action::Allow),
    ("srcset", Action::Allow),
    ("start", Action::CastNumber),
    ("style", Action::Deny),
    ("target", Action::Allow),
    ("title", Action::Allow),
    ("type", Action::Allow),
    ("width", Action::Allow),
];

/// Output names that differ from the attribute name.
const RENAMES: &[(&str, &str)] = &[
    ("class", "className"),
    ("colspan", "colSpan"),
    ("datetime", "dateTime"),
    ("rowspan", "rowSpan"),
    ("srclang", "srcLang"),
    ("srcset", "srcSet"),
];

/// Attributes whose value is a URL checked by [`is_safe_url`].
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

static ACTION_TABLE: LazyLock<HashMap<&'static str, Action>> =
    LazyLock::new(|| ACTIONS.iter().copied().collect());

/// Whitespace, control characters, and the numeric escapes of tab and
/// newlines, all of which browsers ignore inside a scheme.
static EVASION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\x00-\x20\x7f]|&#(x0*(9|a|d)|0*(9|10|13));?").expect("valid regex")
});

static SCRIPT_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(javascript|vbscript|livescript|xss):").expect("valid regex")
});

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*):").expect("valid regex"));

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid regex")
});

/// Look up the action of an attribute. Names are case-insensitive.
pub fn action_of(name: &str) -> Option<Action> {
    ACTION_TABLE
        .get(name.to_ascii_lowercase().as_str())
        .copied()
}

/// The name an attribute is emitted under.
pub fn output_name(name: &str) -> &str {
    RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map_or(name, |(_, to)| to)
}

/// The attribute name an output name came from (reverse of [`output_name`]).
pub fn attribute_name(output: &str) -> &str {
    RENAMES
        .iter()
        .find(|(_, to)| *to == output)
        .map_or(output, |(from, _)| from)
}

fn is_aria_or_data(name: &str) -> bool {
    name.starts_with("aria-") || name.starts_with("data-")
}

fn strip_evasion(value: &str) -> std::borrow::Cow<'_, str> {
    EVASION.replace_all(value, "")
}

/// Whether a URL may be emitted: a fragment reference, a relative URL, or an
/// `http`, `https` or `mailto` URL.
pub fn is_safe_url(value: &str) -> bool {
    let cleaned = strip_evasion(value);
    if cleaned.starts_with('#') {
        return true;
    }
    match SCHEME.captures(&cleaned) {
        Some(caps) => {
            let scheme = caps[1].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        None => true,
    }
}

/// Node-level check: every URL-valued attribute must be safe.
fn is_safe_node(element: &ElementData) -> bool {
    element.attrs.iter().all(|(name, value)| {
        !URL_ATTRIBUTES.contains(&name.to_ascii_lowercase().as_str()) || is_safe_url(value)
    })
}

/// Parse the leading float of a value, like `"3px"` → 3.
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let m = LEADING_FLOAT.find(trimmed)?;
    m.as_str().parse().ok()
}

/// Extract the sanitized attributes of an element.
///
/// Returns `None` when nothing survives, including when the element carries
/// an unsafe URL: one bad URL drops every attribute of the node.
pub fn extract_attributes(
    element: &ElementData,
    filters: &[Box<dyn Filter>],
) -> Option<IndexMap<String, AttrValue>> {
    if !is_safe_node(element) {
        trace!("<{}> carries an unsafe URL, dropping its attributes", element.tag());
        return None;
    }

    let mut attributes = IndexMap::new();

    for (raw_name, value) in &element.attrs {
        let name = raw_name.to_ascii_lowercase();

        let action = if is_aria_or_data(&name) {
            Action::Allow
        } else {
            match action_of(&name) {
                Some(Action::Deny) | None => continue,
                Some(action) => action,
            }
        };

        if name.starts_with("on") || SCRIPT_SCHEME.is_match(&strip_evasion(value)) {
            continue;
        }

        let value = apply_attribute_filters(filters, &name, value.to_string());

        let value = match action {
            Action::CastBool => AttrValue::Bool(true),
            Action::CastNumber => match parse_leading_float(&value) {
                Some(n) => AttrValue::Number(n),
                None => continue,
            },
            Action::Allow | Action::Deny => AttrValue::Str(value),
        };

        attributes.insert(output_name(&name).to_owned(), value);
    }

    if attributes.is_empty() {
        None
    } else {
        Some(attributes)
    }
}
