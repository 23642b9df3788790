//! Projection of reconciled groups into output records.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::group_list::GroupList;

/// Creator tag written to every output record.
pub const CREATOR: &str = "groupsync";

/// Annotation keys carried on output records.
pub mod annotations {
    pub const CREATED_BY: &str = "groupsync.io/created-by";
    pub const SOURCE: &str = "groupsync.io/source";
    pub const REALMS: &str = "groupsync.io/realms";
}

/// Output filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Drop prune candidates before emitting.
    pub prune: bool,
    /// Only emit groups that changed.
    pub only_changed: bool,
}

/// A resolved group ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputGroup {
    pub name: String,
    /// Usernames in lexicographic order.
    pub users: Vec<String>,
    pub annotations: BTreeMap<String, String>,
}

/// Projects `groups` into output records, in final name order.
///
/// Pruning works on per-group copies; `groups` is left untouched.
pub fn project(groups: &GroupList, options: ProjectionOptions) -> Vec<OutputGroup> {
    let mut output = Vec::with_capacity(groups.len());

    for (final_name, group) in groups {
        if group.skipped {
            continue;
        }

        let mut group = group.clone();
        if options.prune {
            let removed = group.trim_pruned_users();
            if removed > 0 {
                debug!(group = %final_name, removed, "Pruned users");
            }
        }

        if options.only_changed && !group.changed {
            debug!(group = %final_name, "Omitting unchanged group");
            continue;
        }

        let mut notes = BTreeMap::new();
        notes.insert(annotations::CREATED_BY.to_string(), CREATOR.to_string());
        notes.insert(annotations::SOURCE.to_string(), group.source.clone());
        notes.insert(annotations::REALMS.to_string(), group.realms.join(","));

        output.push(OutputGroup {
            name: final_name.clone(),
            users: group.usernames(),
            annotations: notes,
        });
    }

    output
}
