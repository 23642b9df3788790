//! Merge engine.

use tracing::{debug, warn};

use crate::group_list::GroupList;

/// Merges `source` onto a copy of `target` and returns the result.
///
/// Neither input is modified. For every group in `source`:
///
/// - a final name not yet present is inserted as-is;
/// - otherwise the source realms are appended to the existing group, members
///   already present are reaffirmed (their prune candidate flag is cleared),
///   and new members are added, marking the existing group changed.
///
/// The order groups are visited in only affects the order warnings are
/// logged. The order *lists* are merged in matters: the first list to
/// contribute a final name fixes that group's identity.
pub fn merge(target: &GroupList, source: &GroupList) -> GroupList {
    let mut merged = target.clone();

    for (final_name, group) in source {
        let Some(existing) = merged.get_mut(final_name) else {
            merged.insert(group.clone());
            continue;
        };

        existing.realms.extend(group.realms.iter().cloned());

        for (username, user) in &group.users {
            match existing.users.get_mut(username) {
                Some(current) => {
                    current.prune_candidate = false;
                    if existing.source == group.source || existing.is_baseline() {
                        debug!(group = %final_name, user = %username, "Membership reaffirmed");
                    } else {
                        warn!(
                            group = %final_name,
                            user = %username,
                            existing_source = %existing.source,
                            source = %group.source,
                            "Duplicate membership found across sources"
                        );
                    }
                }
                None => {
                    existing.users.insert(username.clone(), user.clone());
                    existing.changed = true;
                }
            }
        }
    }

    merged
}
