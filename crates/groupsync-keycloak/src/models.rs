//! Keycloak REST representations.

use std::collections::HashMap;

use groupsync_core::{ProviderGroup, ProviderUser};
use serde::Deserialize;

/// A group as returned by `GET /admin/realms/{realm}/groups`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRepresentation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sub_groups: Option<Vec<GroupRepresentation>>,
}

impl From<GroupRepresentation> for ProviderGroup {
    /// Converts a whole subtree without recursing, so tree depth is bounded
    /// only by memory.
    fn from(root: GroupRepresentation) -> Self {
        // Pre-order: every node is stored after its parent.
        let mut nodes: Vec<(Option<usize>, ProviderGroup)> = Vec::new();
        let mut pending = vec![(None, root)];

        while let Some((parent, mut group)) = pending.pop() {
            let children = group.sub_groups.take().unwrap_or_default();
            let index = nodes.len();
            nodes.push((
                parent,
                ProviderGroup {
                    id: group.id.unwrap_or_default(),
                    name: group.name,
                    path: group.path.unwrap_or_default(),
                    sub_groups: Vec::new(),
                },
            ));
            pending.extend(children.into_iter().rev().map(|child| (Some(index), child)));
        }

        // Popping from the back completes every subtree before its parent.
        while let Some((parent, mut group)) = nodes.pop() {
            group.sub_groups.reverse();
            match parent {
                Some(parent) => nodes[parent].1.sub_groups.push(group),
                None => return group,
            }
        }
        ProviderGroup::default()
    }
}

/// A user as returned by `GET /admin/realms/{realm}/groups/{id}/members`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub attributes: Option<HashMap<String, Vec<String>>>,
}

impl From<UserRepresentation> for ProviderUser {
    fn from(user: UserRepresentation) -> Self {
        let mut attributes = user.attributes.unwrap_or_default();
        if let Some(email) = user.email {
            attributes.entry("email".to_string()).or_insert_with(|| vec![email]);
        }
        ProviderUser {
            id: user.id.unwrap_or_default(),
            username: user.username,
            attributes,
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub session_state: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Token introspection response.
#[derive(Debug, Deserialize)]
pub(crate) struct IntrospectionResponse {
    #[serde(default)]
    pub active: Option<bool>,
}

/// Error body returned by both OIDC and admin endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

impl ErrorBody {
    /// Most descriptive message in the body, falling back to the raw text.
    pub fn message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error_description.or(b.error_message).or(b.error))
            .unwrap_or_else(|| body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_tree_parsing() {
        let json = r#"[{
            "id": "g1",
            "name": "parent",
            "path": "/parent",
            "subGroups": [{"id": "g2", "name": "child", "path": "/parent/child", "subGroups": []}]
        }]"#;

        let groups: Vec<GroupRepresentation> = serde_json::from_str(json).unwrap();
        let forest: Vec<ProviderGroup> = groups.into_iter().map(ProviderGroup::from).collect();

        assert_eq!(forest[0].name.as_deref(), Some("parent"));
        assert_eq!(forest[0].sub_groups[0].path, "/parent/child");
    }

    #[test]
    fn test_sibling_order_is_preserved() {
        let json = r#"{"id": "r", "name": "root", "subGroups": [
            {"id": "a", "name": "a", "subGroups": [{"id": "a1", "name": "a1"}, {"id": "a2", "name": "a2"}]},
            {"id": "b", "name": "b"},
            {"id": "c", "name": "c"}
        ]}"#;

        let root = ProviderGroup::from(serde_json::from_str::<GroupRepresentation>(json).unwrap());

        let ids: Vec<_> = root.sub_groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let nested: Vec<_> = root.sub_groups[0].sub_groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(nested, vec!["a1", "a2"]);
        assert!(root.sub_groups[1].sub_groups.is_empty());
    }

    #[test]
    fn test_user_parsing_exposes_email_attribute() {
        let json = r#"{"id": "u1", "username": "jdoe", "email": "jdoe@example.com",
            "attributes": {"upn": ["JDOE"]}}"#;

        let user: ProviderUser = serde_json::from_str::<UserRepresentation>(json)
            .unwrap()
            .into();

        assert_eq!(user.username.as_deref(), Some("jdoe"));
        assert_eq!(
            user.resolved_username(&["email".to_string()]),
            Some("jdoe@example.com")
        );
        assert_eq!(user.resolved_username(&["upn".to_string()]), Some("JDOE"));
    }

    #[test]
    fn test_error_body_message() {
        let oidc = r#"{"error": "invalid_client", "error_description": "Invalid client credentials"}"#;
        assert_eq!(ErrorBody::message(oidc), "Invalid client credentials");

        let admin = r#"{"errorMessage": "Could not find group by id"}"#;
        assert_eq!(ErrorBody::message(admin), "Could not find group by id");

        assert_eq!(ErrorBody::message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_missing_fields_tolerated() {
        let user: UserRepresentation = serde_json::from_str("{}").unwrap();
        let user = ProviderUser::from(user);
        assert!(user.username.is_none());
        assert!(user.id.is_empty());
    }
}
