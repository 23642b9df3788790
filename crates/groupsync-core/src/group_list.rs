//! A flat collection of groups keyed by final name.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::types::Group;

/// Groups keyed by their computed final name.
///
/// Every key equals `final_name()` of its value: the only way in is
/// [`GroupList::insert`], which computes the key from the group itself.
/// Iteration is ordered by final name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupList {
    groups: BTreeMap<String, Group>,
}

impl GroupList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a group under its final name, returning the group it replaced.
    pub fn insert(&mut self, group: Group) -> Option<Group> {
        self.groups.insert(group.final_name(), group)
    }

    /// Looks up a group by final name.
    pub fn get(&self, final_name: &str) -> Option<&Group> {
        self.groups.get(final_name)
    }

    /// Mutable lookup. Callers must not change fields that feed the final name.
    pub(crate) fn get_mut(&mut self, final_name: &str) -> Option<&mut Group> {
        self.groups.get_mut(final_name)
    }

    pub fn contains(&self, final_name: &str) -> bool {
        self.groups.contains_key(final_name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates `(final_name, group)` pairs in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Group> {
        self.groups.iter()
    }

    /// Final names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Iterates groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }
}

impl FromIterator<Group> for GroupList {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        let mut list = GroupList::new();
        for group in iter {
            list.insert(group);
        }
        list
    }
}

impl Extend<Group> for GroupList {
    fn extend<I: IntoIterator<Item = Group>>(&mut self, iter: I) {
        for group in iter {
            self.insert(group);
        }
    }
}

impl IntoIterator for GroupList {
    type Item = (String, Group);
    type IntoIter = btree_map::IntoIter<String, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a> IntoIterator for &'a GroupList {
    type Item = (&'a String, &'a Group);
    type IntoIter = btree_map::Iter<'a, String, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
