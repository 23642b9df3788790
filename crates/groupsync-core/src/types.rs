//! Entity model for reconciled groups and their members.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::naming;

/// Identifier and source tag given to groups and users decoded from the baseline.
pub const BASELINE_ORIGIN: &str = "openshift";

/// Source tag prefix for groups produced by a realm.
pub const REALM_SOURCE_PREFIX: &str = "realm:";

/// A member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Provider-assigned identifier.
    pub id: String,
    /// Login name, unique within a group's membership.
    pub name: String,
    /// Set when the membership came only from the baseline and has not been
    /// reaffirmed by any merged realm.
    pub prune_candidate: bool,
}

impl User {
    /// Creates a user that is not a prune candidate.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prune_candidate: false,
        }
    }

    /// Sets the prune candidate flag.
    #[must_use]
    pub fn with_prune_candidate(mut self, prune_candidate: bool) -> Self {
        self.prune_candidate = prune_candidate;
        self
    }
}

/// A group as seen by the reconciliation engine.
///
/// The hierarchy a group came from is not kept: by the time a `Group` leaves
/// the flattener its non-skipped ancestor names are captured in
/// [`Group::ancestors`], which is all [`Group::final_name`] needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Provider identifier, or [`BASELINE_ORIGIN`] for baseline groups.
    pub id: String,
    /// Raw name as seen at the source.
    pub name: String,
    /// When set and non-empty, the final name verbatim.
    pub alias: Option<String>,
    pub prefix: String,
    pub suffix: String,
    /// Provider-reported hierarchical path.
    pub path: String,
    /// Whether the final name includes the ancestor chain.
    pub concatenate_ancestors: bool,
    /// Separator for the ancestor chain; blank means `.`.
    pub ancestor_separator: String,
    /// Names of non-skipped ancestors, root first.
    pub ancestors: Vec<String>,
    /// Members keyed by username.
    pub users: BTreeMap<String, User>,
    /// Origin tag, e.g. `realm:sso` or [`BASELINE_ORIGIN`].
    pub source: String,
    /// Realms that contributed to this group, in merge order.
    pub realms: Vec<String>,
    /// Set once any meaningful change to the group happened.
    pub changed: bool,
    /// Set when a block rule filtered the group out of the output.
    pub skipped: bool,
}

impl Group {
    /// Creates a group with the given identity and source.
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Creates an unchanged group originating from the baseline.
    pub fn baseline(name: impl Into<String>) -> Self {
        Self::new(BASELINE_ORIGIN, name, BASELINE_ORIGIN)
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the prefix and suffix.
    #[must_use]
    pub fn with_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    /// Enables ancestor concatenation with the given ancestor names.
    #[must_use]
    pub fn with_ancestors(mut self, ancestors: Vec<String>, separator: impl Into<String>) -> Self {
        self.concatenate_ancestors = true;
        self.ancestors = ancestors;
        self.ancestor_separator = separator.into();
        self
    }

    /// Appends a contributing realm.
    #[must_use]
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realms.push(realm.into());
        self
    }

    /// Adds a member, replacing any member with the same username.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.name.clone(), user);
        self
    }

    /// Sets the changed flag.
    #[must_use]
    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    /// The externally visible name of this group.
    pub fn final_name(&self) -> String {
        naming::resolve_final_name(self)
    }

    /// Whether the group came from the baseline rather than a realm.
    pub fn is_baseline(&self) -> bool {
        self.source == BASELINE_ORIGIN
    }

    /// Removes every prune candidate from the membership and marks the group
    /// changed if anything was removed. Returns the number of removed users.
    pub fn trim_pruned_users(&mut self) -> usize {
        let before = self.users.len();
        self.users.retain(|_, user| !user.prune_candidate);
        let removed = before - self.users.len();
        if removed > 0 {
            self.changed = true;
        }
        removed
    }

    /// Usernames in lexicographic order.
    pub fn usernames(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }
}
