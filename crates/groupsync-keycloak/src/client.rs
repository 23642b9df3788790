//! HTTP client for the Keycloak admin REST API.

use std::time::Duration;

use groupsync_core::RealmConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, trace, warn};
use url::Url;

use crate::models::{ErrorBody, GroupRepresentation, UserRepresentation};
use crate::{KeycloakError, KeycloakResult};

/// Realm-scoped Keycloak client.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    pub(crate) http: reqwest::Client,
    base_url: Url,
    realm: String,
    page_size: u32,
}

impl KeycloakClient {
    /// Builds a client from realm settings (timeout, TLS verification, page size).
    pub fn new(realm: &RealmConfig) -> KeycloakResult<Self> {
        let base_url = Url::parse(&realm.url)?;
        if base_url.cannot_be_a_base() {
            return Err(KeycloakError::Config(format!(
                "{} cannot be used as a base URL",
                realm.url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(realm.timeout_secs))
            .danger_accept_invalid_certs(!realm.ssl_verify)
            .build()
            .map_err(|e| KeycloakError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            realm: realm.name.clone(),
            page_size: realm.page_size.max(1),
        })
    }

    /// Name of the realm this client queries.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Joins path segments onto the server URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> KeycloakResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                KeycloakError::Config(format!("{} cannot be used as a base URL", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// OIDC endpoint of a realm, e.g. `token` or `logout`.
    pub(crate) fn oidc_endpoint(&self, realm: &str, tail: &[&str]) -> KeycloakResult<Url> {
        let mut segments = vec!["realms", realm, "protocol", "openid-connect"];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    /// Fetches the group forest, optionally narrowed by a name search.
    #[instrument(skip(self, token), fields(realm = %self.realm))]
    pub async fn group_tree(
        &self,
        token: &str,
        search: Option<&str>,
    ) -> KeycloakResult<Vec<GroupRepresentation>> {
        let url = self.endpoint(&["admin", "realms", self.realm.as_str(), "groups"])?;
        let mut query = vec![("briefRepresentation", "false")];
        if let Some(search) = search {
            query.push(("search", search));
        }

        let groups: Vec<GroupRepresentation> = self.get_paged(token, url, &query).await?;
        debug!(count = groups.len(), "Fetched root groups");
        Ok(groups)
    }

    /// Fetches the direct members of a group with full representations.
    #[instrument(skip(self, token), fields(realm = %self.realm))]
    pub async fn group_members(
        &self,
        token: &str,
        group_id: &str,
    ) -> KeycloakResult<Vec<UserRepresentation>> {
        let url = self.endpoint(&[
            "admin",
            "realms",
            self.realm.as_str(),
            "groups",
            group_id,
            "members",
        ])?;
        let members: Vec<UserRepresentation> = self
            .get_paged(token, url, &[("briefRepresentation", "false")])
            .await?;
        debug!(count = members.len(), "Fetched group members");
        Ok(members)
    }

    /// Follows `first`/`max` paging until a short page is returned, or until
    /// the server answers with the same page twice.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        token: &str,
        url: Url,
        query: &[(&str, &str)],
    ) -> KeycloakResult<Vec<T>> {
        let mut results = Vec::new();
        let mut previous: Option<String> = None;
        let mut first: u32 = 0;
        let max = self.page_size.to_string();

        loop {
            trace!(url = %url, first, "GET");
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(token)
                .query(query)
                .query(&[("first", first.to_string().as_str()), ("max", max.as_str())])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let body = response.text().await?;
            trace!(body = %body, "Response");

            if previous.as_deref() == Some(body.as_str()) {
                warn!(url = %url, first, "Server ignored paging and repeated a page");
                break;
            }

            let page: Vec<T> = decode_page(&body)?;
            let received = page.len() as u32;
            results.extend(page);

            if received < self.page_size {
                break;
            }
            first += received;
            previous = Some(body);
        }

        Ok(results)
    }
}

/// Decodes a JSON array without serde_json's nesting limit. Group trees
/// nest `subGroups` as deep as the realm does.
fn decode_page<T: DeserializeOwned>(body: &str) -> KeycloakResult<Vec<T>> {
    let mut de = serde_json::Deserializer::from_str(body);
    de.disable_recursion_limit();
    let page = Vec::<T>::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(page)
}

/// Turns a non-success response into an API error.
pub(crate) async fn api_error(response: reqwest::Response) -> KeycloakError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    KeycloakError::Api {
        status,
        message: ErrorBody::message(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let realm = RealmConfig::new("my realm", "https://sso.example.com/auth/");
        let client = KeycloakClient::new(&realm).unwrap();

        let url = client
            .endpoint(&["admin", "realms", client.realm(), "groups", "a/b"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sso.example.com/auth/admin/realms/my%20realm/groups/a%2Fb"
        );
    }

    #[test]
    fn test_oidc_endpoint() {
        let realm = RealmConfig::new("sso", "https://sso.example.com");
        let client = KeycloakClient::new(&realm).unwrap();

        let url = client.oidc_endpoint("master", &["token"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sso.example.com/realms/master/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_decode_page_beyond_default_nesting_limit() {
        let depth = 300;
        let mut body = String::from("[");
        for level in 0..depth {
            body.push_str(&format!(r#"{{"id": "g{level}", "name": "level-{level}", "subGroups": ["#));
        }
        body.push_str(&"]}".repeat(depth));
        body.push(']');

        let page: Vec<GroupRepresentation> = decode_page(&body).unwrap();
        let root = groupsync_core::ProviderGroup::from(page.into_iter().next().unwrap());

        let mut depth_seen = 1;
        let mut node = &root;
        while let Some(child) = node.sub_groups.first() {
            depth_seen += 1;
            node = child;
        }
        assert_eq!(depth_seen, depth);
        assert_eq!(node.name.as_deref(), Some("level-299"));
    }

    #[test]
    fn test_decode_page_rejects_trailing_data() {
        assert!(decode_page::<UserRepresentation>("[] []").is_err());
    }

    #[test]
    fn test_rejects_non_base_url() {
        let realm = RealmConfig::new("sso", "mailto:admin@example.com");
        assert!(matches!(
            KeycloakClient::new(&realm),
            Err(KeycloakError::Config(_))
        ));
    }
}
