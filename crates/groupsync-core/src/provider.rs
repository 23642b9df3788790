//! Identity provider boundary.
//!
//! The reconciliation engine only needs the shape of a realm's group tree and
//! of a group's members. Concrete REST clients implement [`IdentityProvider`].

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::RealmConfig;
use crate::error::SyncResult;

/// A node of a realm's group tree as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderGroup {
    pub id: String,
    /// Nodes without a name are ignored by the flattener.
    pub name: Option<String>,
    pub path: String,
    pub sub_groups: Vec<ProviderGroup>,
}

impl ProviderGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            path: format!("/{name}"),
            name: Some(name),
            sub_groups: Vec::new(),
        }
    }

    /// Adds a subgroup, deriving its path from this node's path.
    #[must_use]
    pub fn with_sub_group(mut self, mut child: ProviderGroup) -> Self {
        child.rebase_path(&self.path);
        self.sub_groups.push(child);
        self
    }

    fn rebase_path(&mut self, parent_path: &str) {
        if let Some(name) = &self.name {
            self.path = format!("{parent_path}/{name}");
        }
        let path = self.path.clone();
        for child in &mut self.sub_groups {
            child.rebase_path(&path);
        }
    }
}

/// A group member as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: String,
    /// Members without a username are ignored.
    pub username: Option<String>,
    pub attributes: HashMap<String, Vec<String>>,
}

impl ProviderUser {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: Some(username.into()),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// The username to reconcile with: the first value of the first preferred
    /// attribute present, falling back to the provider username.
    pub fn resolved_username(&self, preferred: &[String]) -> Option<&str> {
        preferred
            .iter()
            .filter_map(|attr| self.attributes.get(attr))
            .filter_map(|values| values.iter().find(|v| !v.is_empty()))
            .map(String::as_str)
            .next()
            .or(self.username.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Operations the reconciliation engine needs from an identity provider.
///
/// A session is acquired per realm and must be handed back to
/// [`IdentityProvider::end_session`] on every exit path.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticated, realm-scoped session.
    type Session: Send + Sync;

    /// Log in to a realm.
    ///
    /// Implementations that obtain a partial session before failing must tear
    /// it down themselves before returning the error.
    async fn authenticate(&self, realm: &RealmConfig) -> SyncResult<Self::Session>;

    /// Tear down a session.
    async fn end_session(&self, realm: &RealmConfig, session: Self::Session) -> SyncResult<()>;

    /// Fetch the realm's group forest, optionally filtered by a name search.
    async fn fetch_group_tree(
        &self,
        session: &Self::Session,
        realm: &RealmConfig,
        search: Option<&str>,
    ) -> SyncResult<Vec<ProviderGroup>>;

    /// Fetch the direct members of a group.
    async fn fetch_members(
        &self,
        session: &Self::Session,
        realm: &RealmConfig,
        group_id: &str,
    ) -> SyncResult<Vec<ProviderUser>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_username_prefers_attributes() {
        let user = ProviderUser::new("1", "jdoe")
            .with_attribute("email", "jdoe@example.com")
            .with_attribute("upn", "JDOE@EXAMPLE");

        assert_eq!(user.resolved_username(&[]), Some("jdoe"));
        assert_eq!(
            user.resolved_username(&["missing".to_string(), "upn".to_string()]),
            Some("JDOE@EXAMPLE")
        );
        assert_eq!(
            user.resolved_username(&["email".to_string(), "upn".to_string()]),
            Some("jdoe@example.com")
        );
    }

    #[test]
    fn test_resolved_username_skips_empty_values() {
        let user = ProviderUser::new("1", "jdoe").with_attribute("email", "");
        assert_eq!(user.resolved_username(&["email".to_string()]), Some("jdoe"));

        let anonymous = ProviderUser {
            id: "2".to_string(),
            username: None,
            attributes: HashMap::new(),
        };
        assert_eq!(anonymous.resolved_username(&[]), None);
    }

    #[test]
    fn test_sub_group_paths() {
        let tree = ProviderGroup::new("1", "parent").with_sub_group(
            ProviderGroup::new("2", "child").with_sub_group(ProviderGroup::new("3", "leaf")),
        );
        assert_eq!(tree.sub_groups[0].path, "/parent/child");
        assert_eq!(tree.sub_groups[0].sub_groups[0].path, "/parent/child/leaf");
    }
}
