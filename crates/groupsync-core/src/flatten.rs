//! Realm flattening.
//!
//! Turns a realm's group forest into a flat [`GroupList`] using an explicit
//! worklist, so subgroup depth never grows the call stack. Parent links are
//! [`GroupHandle`]s into the pass-local arena held by [`RealmTree`]; they are
//! only walked read-only to build ancestor chains and to promote membership.

use std::collections::{BTreeMap, HashSet, VecDeque};

use tracing::{debug, instrument};

use crate::config::RealmConfig;
use crate::group_list::GroupList;
use crate::provider::{ProviderGroup, ProviderUser};
use crate::types::{Group, User};

/// Index of a group inside a [`RealmTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(usize);

#[derive(Debug)]
struct Node {
    group: Group,
    parent: Option<GroupHandle>,
}

/// Collects every node in `forest` (at any depth) whose name equals `name`.
///
/// Providers answer a name search with the root groups that contain a match,
/// so the whole forest is walked regardless of the realm's subgroup setting.
pub fn select_by_name(forest: &[ProviderGroup], name: &str) -> Vec<ProviderGroup> {
    let mut found = Vec::new();
    let mut queue: VecDeque<&ProviderGroup> = forest.iter().collect();

    while let Some(group) = queue.pop_front() {
        if group.name.as_deref() == Some(name) {
            found.push(group.clone());
        }
        queue.extend(group.sub_groups.iter());
    }

    found
}

/// Working set of one realm's flattening pass.
#[derive(Debug)]
pub struct RealmTree {
    nodes: Vec<Node>,
    retained: BTreeMap<String, GroupHandle>,
    promote_users: bool,
    preferred_username: Vec<String>,
}

impl RealmTree {
    /// Flattens `roots` according to the realm's filtering and naming rules.
    ///
    /// - Roots not on a non-empty allow list are discarded with their subtree.
    /// - Groups on the block list are skipped: they are traversed and keep
    ///   their place in the hierarchy but are neither retained nor part of any
    ///   ancestor chain.
    /// - Groups whose final name is blocked are not retained.
    /// - When two groups resolve to the same final name the later one wins.
    #[instrument(skip(roots, realm), fields(realm = %realm.name, roots = roots.len()))]
    pub fn flatten(roots: &[ProviderGroup], realm: &RealmConfig) -> Self {
        let allowed: HashSet<&str> = realm.groups.iter().map(String::as_str).collect();
        let blocked_groups: HashSet<&str> =
            realm.blocked_groups.iter().map(String::as_str).collect();
        let blocked_names: HashSet<&str> = realm.blocked_names.iter().map(String::as_str).collect();
        let source = realm.source_tag();

        let mut tree = RealmTree {
            nodes: Vec::new(),
            retained: BTreeMap::new(),
            promote_users: realm.subgroup_promote_users,
            preferred_username: realm.preferred_username.clone(),
        };

        let mut worklist: VecDeque<(&ProviderGroup, Option<GroupHandle>)> =
            roots.iter().map(|g| (g, None)).collect();

        while let Some((raw, parent)) = worklist.pop_front() {
            let Some(name) = raw.name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };

            if parent.is_none() && !allowed.is_empty() && !allowed.contains(name) {
                debug!(group = %name, "Discarding root group not on allow list");
                continue;
            }

            let skipped = blocked_groups.contains(name);

            let group = Group {
                id: raw.id.clone(),
                name: name.to_string(),
                alias: realm.aliases.get(name).cloned(),
                prefix: realm.group_prefix.clone(),
                suffix: realm.group_suffix.clone(),
                path: raw.path.clone(),
                concatenate_ancestors: realm.subgroup_concat_names,
                ancestor_separator: realm.subgroup_separator.clone(),
                ancestors: tree.ancestor_names(parent),
                users: BTreeMap::new(),
                source: source.clone(),
                realms: vec![realm.name.clone()],
                // Provider groups always count as changed; only baseline
                // groups start out unchanged.
                changed: true,
                skipped,
            };

            let final_name = group.final_name();
            let handle = tree.push(group, parent);

            if realm.subgroups {
                worklist.extend(raw.sub_groups.iter().map(|child| (child, Some(handle))));
            }

            if skipped {
                debug!(group = %name, "Skipping blocked group");
                continue;
            }
            if blocked_names.contains(final_name.as_str()) {
                debug!(group = %final_name, "Skipping blocked final name");
                continue;
            }
            if tree.retained.insert(final_name.clone(), handle).is_some() {
                debug!(group = %final_name, "Group replaces earlier group with same final name");
            }
        }

        debug!(
            nodes = tree.nodes.len(),
            retained = tree.retained.len(),
            "Realm flattening complete"
        );
        tree
    }

    fn push(&mut self, group: Group, parent: Option<GroupHandle>) -> GroupHandle {
        let handle = GroupHandle(self.nodes.len());
        self.nodes.push(Node { group, parent });
        handle
    }

    /// Number of groups visited, retained or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Group behind a handle.
    pub fn group(&self, handle: GroupHandle) -> Option<&Group> {
        self.nodes.get(handle.0).map(|n| &n.group)
    }

    /// Parent of a group, if any.
    pub fn parent(&self, handle: GroupHandle) -> Option<GroupHandle> {
        self.nodes.get(handle.0).and_then(|n| n.parent)
    }

    /// Names of the non-skipped ancestors of a group starting at `parent`,
    /// root first. Skipped ancestors are left out but walked past.
    pub fn ancestor_names(&self, parent: Option<GroupHandle>) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = parent;
        while let Some(handle) = current {
            let Some(node) = self.nodes.get(handle.0) else {
                break;
            };
            if !node.group.skipped {
                names.push(node.group.name.clone());
            }
            current = node.parent;
        }
        names.reverse();
        names
    }

    /// Retained groups as `(handle, group)` in final name order.
    pub fn retained(&self) -> impl Iterator<Item = (GroupHandle, &Group)> {
        self.retained
            .values()
            .filter_map(|&handle| self.group(handle).map(|g| (handle, g)))
    }

    /// Number of retained groups.
    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    /// Records a group's members.
    ///
    /// Each member replaces any same-named member of the group. With user
    /// promotion enabled the member is also added to every ancestor that does
    /// not already have a member with that username.
    pub fn add_members(&mut self, handle: GroupHandle, members: &[ProviderUser]) {
        if handle.0 >= self.nodes.len() {
            return;
        }

        for member in members {
            let Some(username) = member.resolved_username(&self.preferred_username) else {
                continue;
            };
            let user = User::new(member.id.clone(), username);

            if self.promote_users {
                let mut current = self.nodes[handle.0].parent;
                while let Some(ancestor) = current {
                    let node = &mut self.nodes[ancestor.0];
                    node.group
                        .users
                        .entry(user.name.clone())
                        .or_insert_with(|| user.clone());
                    current = node.parent;
                }
            }

            self.nodes[handle.0]
                .group
                .users
                .insert(user.name.clone(), user);
        }
    }

    /// Consumes the working set, yielding the retained groups.
    pub fn into_group_list(mut self) -> GroupList {
        let mut list = GroupList::new();
        for handle in self.retained.values() {
            list.insert(std::mem::take(&mut self.nodes[handle.0].group));
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm() -> RealmConfig {
        RealmConfig::new("sso", "https://sso.example.com").with_client("c", "s")
    }

    fn tree() -> Vec<ProviderGroup> {
        vec![
            ProviderGroup::new("1", "parent").with_sub_group(
                ProviderGroup::new("2", "child").with_sub_group(ProviderGroup::new("3", "leaf")),
            ),
            ProviderGroup::new("4", "other"),
        ]
    }

    fn retained_names(tree: &RealmTree) -> Vec<String> {
        tree.retained().map(|(_, g)| g.final_name()).collect()
    }

    #[test]
    fn test_flatten_roots_only_without_subgroups() {
        let tree = RealmTree::flatten(&tree(), &realm());

        assert_eq!(retained_names(&tree), vec!["other", "parent"]);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_flatten_with_subgroups() {
        let mut config = realm();
        config.subgroups = true;
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(
            retained_names(&tree),
            vec!["child", "leaf", "other", "parent"]
        );
    }

    #[test]
    fn test_provider_groups_are_changed_and_tagged() {
        let list = RealmTree::flatten(&tree(), &realm()).into_group_list();
        let group = list.get("parent").unwrap();

        assert!(group.changed);
        assert!(!group.skipped);
        assert_eq!(group.source, "realm:sso");
        assert_eq!(group.realms, vec!["sso".to_string()]);
        assert_eq!(group.path, "/parent");
        assert_eq!(group.id, "1");
    }

    #[test]
    fn test_ancestor_concatenation() {
        let mut config = realm();
        config.subgroups = true;
        config.subgroup_concat_names = true;
        config.subgroup_separator = ".".to_string();
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(
            retained_names(&tree),
            vec!["other", "parent", "parent.child", "parent.child.leaf"]
        );
    }

    #[test]
    fn test_skipped_ancestor_does_not_truncate_chain() {
        let mut config = realm();
        config.subgroups = true;
        config.subgroup_concat_names = true;
        config.blocked_groups = vec!["child".to_string()];
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(
            retained_names(&tree),
            vec!["other", "parent", "parent.leaf"]
        );
    }

    #[test]
    fn test_blocked_group_children_still_processed() {
        let mut config = realm();
        config.subgroups = true;
        config.blocked_groups = vec!["parent".to_string()];
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(retained_names(&tree), vec!["child", "leaf", "other"]);
    }

    #[test]
    fn test_blocked_final_names() {
        let mut config = realm();
        config.group_prefix = "sso-".to_string();
        config.blocked_names = vec!["sso-other".to_string()];
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(retained_names(&tree), vec!["sso-parent"]);
    }

    #[test]
    fn test_allow_list_discards_roots_and_subtrees() {
        let mut config = realm();
        config.subgroups = true;
        config.groups = vec!["other".to_string()];
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(retained_names(&tree), vec!["other"]);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_alias_and_affixes() {
        let mut config = realm();
        config.group_prefix = "team-".to_string();
        config.aliases.insert("parent".to_string(), "engineering".to_string());
        let tree = RealmTree::flatten(&tree(), &config);

        assert_eq!(retained_names(&tree), vec!["engineering", "team-other"]);
    }

    #[test]
    fn test_same_final_name_last_wins() {
        let roots = vec![ProviderGroup::new("1", "a"), ProviderGroup::new("2", "b")];
        let mut config = realm();
        config.aliases.insert("a".to_string(), "shared".to_string());
        config.aliases.insert("b".to_string(), "shared".to_string());

        let list = RealmTree::flatten(&roots, &config).into_group_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("shared").map(|g| g.id.as_str()), Some("2"));
    }

    #[test]
    fn test_unnamed_nodes_ignored() {
        let roots = vec![
            ProviderGroup {
                id: "x".to_string(),
                name: None,
                path: String::new(),
                sub_groups: vec![ProviderGroup::new("y", "hidden")],
            },
            ProviderGroup::new("1", ""),
        ];
        let mut config = realm();
        config.subgroups = true;

        let tree = RealmTree::flatten(&roots, &config);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_members_and_promotion() {
        let mut config = realm();
        config.subgroups = true;
        config.subgroup_promote_users = true;
        let mut tree = RealmTree::flatten(&tree(), &config);

        let handles: BTreeMap<String, GroupHandle> = tree
            .retained()
            .map(|(h, g)| (g.final_name(), h))
            .collect();

        tree.add_members(handles["parent"], &[ProviderUser::new("p1", "alice")]);
        tree.add_members(
            handles["leaf"],
            &[ProviderUser::new("l1", "bob"), ProviderUser::new("l2", "alice")],
        );

        let list = tree.into_group_list();
        assert_eq!(list.get("leaf").unwrap().usernames(), vec!["alice", "bob"]);
        assert_eq!(list.get("child").unwrap().usernames(), vec!["alice", "bob"]);
        let parent = list.get("parent").unwrap();
        assert_eq!(parent.usernames(), vec!["alice", "bob"]);
        // an ancestor's existing member is not overwritten by promotion
        assert_eq!(parent.users["alice"].id, "p1");
        assert!(list.get("other").unwrap().users.is_empty());
    }

    #[test]
    fn test_members_without_promotion() {
        let mut config = realm();
        config.subgroups = true;
        let mut tree = RealmTree::flatten(&tree(), &config);
        let leaf = tree
            .retained()
            .find(|(_, g)| g.name == "leaf")
            .map(|(h, _)| h)
            .unwrap();

        tree.add_members(leaf, &[ProviderUser::new("l1", "bob")]);

        let list = tree.into_group_list();
        assert_eq!(list.get("leaf").unwrap().usernames(), vec!["bob"]);
        assert!(list.get("parent").unwrap().users.is_empty());
    }

    #[test]
    fn test_promotion_through_skipped_ancestor() {
        let mut config = realm();
        config.subgroups = true;
        config.subgroup_promote_users = true;
        config.blocked_groups = vec!["child".to_string()];
        let mut tree = RealmTree::flatten(&tree(), &config);
        let leaf = tree
            .retained()
            .find(|(_, g)| g.name == "leaf")
            .map(|(h, _)| h)
            .unwrap();

        tree.add_members(leaf, &[ProviderUser::new("l1", "bob")]);

        let list = tree.into_group_list();
        assert!(list.get("child").is_none());
        assert_eq!(list.get("parent").unwrap().usernames(), vec!["bob"]);
    }

    #[test]
    fn test_preferred_username() {
        let mut config = realm();
        config.preferred_username = vec!["email".to_string()];
        let mut tree = RealmTree::flatten(&tree(), &config);
        let other = tree
            .retained()
            .find(|(_, g)| g.name == "other")
            .map(|(h, _)| h)
            .unwrap();

        tree.add_members(
            other,
            &[
                ProviderUser::new("1", "jdoe").with_attribute("email", "jdoe@example.com"),
                ProviderUser::new("2", "rroe"),
            ],
        );

        let list = tree.into_group_list();
        assert_eq!(
            list.get("other").unwrap().usernames(),
            vec!["jdoe@example.com", "rroe"]
        );
    }

    #[test]
    fn test_ancestor_names_walk() {
        let mut config = realm();
        config.subgroups = true;
        config.blocked_groups = vec!["child".to_string()];
        let tree = RealmTree::flatten(&tree(), &config);
        let leaf = tree
            .retained()
            .find(|(_, g)| g.name == "leaf")
            .map(|(h, _)| h)
            .unwrap();

        assert_eq!(tree.ancestor_names(tree.parent(leaf)), vec!["parent"]);
        assert!(tree.ancestor_names(None).is_empty());
    }

    #[test]
    fn test_select_by_name_finds_nested_matches() {
        let forest = vec![
            ProviderGroup::new("1", "org")
                .with_sub_group(ProviderGroup::new("2", "eng"))
                .with_sub_group(
                    ProviderGroup::new("3", "ops").with_sub_group(ProviderGroup::new("4", "eng")),
                ),
            ProviderGroup::new("5", "engineering"),
        ];

        let found = select_by_name(&forest, "eng");
        let ids: Vec<_> = found.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
        assert!(select_by_name(&forest, "missing").is_empty());
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut node = ProviderGroup::new("leaf", "g0");
        for depth in 1..2000 {
            node = ProviderGroup {
                id: depth.to_string(),
                name: Some(format!("g{depth}")),
                path: String::new(),
                sub_groups: vec![node],
            };
        }
        let mut config = realm();
        config.subgroups = true;

        let tree = RealmTree::flatten(&[node], &config);
        assert_eq!(tree.retained_len(), 2000);
    }
}
