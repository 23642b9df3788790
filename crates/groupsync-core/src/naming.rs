//! Final name resolution.
//!
//! A group's final name is its alias when one is set. Otherwise it is
//! `prefix + [ancestors joined by separator + separator] + name + suffix`,
//! where the ancestor part only appears when concatenation is enabled and at
//! least one non-skipped ancestor exists.

use crate::types::Group;

/// Separator used when a group's ancestor separator is blank.
pub const DEFAULT_ANCESTOR_SEPARATOR: &str = ".";

/// Returns the separator to use, substituting the default for blank values.
pub fn effective_separator(separator: &str) -> &str {
    if separator.trim().is_empty() {
        DEFAULT_ANCESTOR_SEPARATOR
    } else {
        separator
    }
}

/// Computes the final name of a group. Never mutates the group.
pub fn resolve_final_name(group: &Group) -> String {
    if let Some(alias) = group.alias.as_deref().filter(|a| !a.is_empty()) {
        return alias.to_string();
    }

    let mut name = String::with_capacity(
        group.prefix.len() + group.name.len() + group.suffix.len() + 16,
    );
    name.push_str(&group.prefix);

    if group.concatenate_ancestors && !group.ancestors.is_empty() {
        let separator = effective_separator(&group.ancestor_separator);
        name.push_str(&group.ancestors.join(separator));
        name.push_str(separator);
    }

    name.push_str(&group.name);
    name.push_str(&group.suffix);
    name
}
