//! Bidirectional conversion between property names and storage column names.
//!
//! External callers address fields as lower-camel-case properties
//! (`runStopTime`); storage columns are snake_case (`run_stop_time`). The
//! conversion is lossy for ambiguous acronym runs: `parseHTMLPage` maps to
//! `parse_html_page`, which maps back to `parseHtmlPage`. Names matching
//! `[a-z][a-zA-Z0-9]*` with no run of two or more uppercase letters round-trip
//! exactly.

use std::sync::LazyLock;

use regex::Regex;

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z0-9]+)([A-Z][a-z])").expect("valid pattern"));

static LOWER_UPPER_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid pattern"));

/// Convert a property-style name to its storage column name.
///
/// Splits on case-boundary transitions and lowercases with `_` separators;
/// hyphens normalize to `_` as well.
///
/// ```
/// use rowmodel_core::naming::to_storage_name;
///
/// assert_eq!(to_storage_name("runStopTime"), "run_stop_time");
/// assert_eq!(to_storage_name("DoNotWantCamelCase"), "do_not_want_camel_case");
/// assert_eq!(to_storage_name("some-name"), "some_name");
/// ```
#[must_use]
pub fn to_storage_name(name: &str) -> String {
    let step = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    let step = LOWER_UPPER_BOUNDARY.replace_all(&step, "${1}_${2}");
    step.to_lowercase().replace('-', "_")
}

/// Convert a storage column name to its property name.
///
/// Removes `_x` runs and uppercases the following letter. The first letter is
/// left as-is, producing a lower-camel-case name; use [`to_type_name`] where
/// a class-style name is needed.
///
/// ```
/// use rowmodel_core::naming::to_property_name;
///
/// assert_eq!(to_property_name("run_stop_time"), "runStopTime");
/// ```
#[must_use]
pub fn to_property_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_lowercase() {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Convert a storage column name to a class-style name: the property name
/// with the first letter uppercased. Used for accessor-override keys.
#[must_use]
pub fn to_type_name(name: &str) -> String {
    let prop = to_property_name(name);
    let mut chars = prop.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => prop,
    }
}
