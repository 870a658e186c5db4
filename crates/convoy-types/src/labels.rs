//! Label maps and selector matching.

use std::collections::BTreeMap;

/// Key/value pairs attached to an instance, and the selector form used to
/// pick deployment populations.
pub type Labels = BTreeMap<String, String>;

/// Returns true when `labels` is a superset of `selector`.
///
/// An empty selector matches every instance.
pub fn selector_matches(labels: &Labels, selector: &Labels) -> bool {
    selector
        .iter()
        .all(|(key, value)| labels.get(key) == Some(value))
}
