//! [`IdentityProvider`] implementation backed by Keycloak.

use async_trait::async_trait;
use groupsync_core::{
    ClientAuth, IdentityProvider, ProviderGroup, ProviderUser, RealmConfig, SyncResult,
};
use tracing::{debug, instrument, warn};

use crate::{KeycloakClient, KeycloakError, KeycloakResult, TokenSet};

/// Authenticated Keycloak session for one realm.
#[derive(Debug)]
pub struct KeycloakSession {
    client: KeycloakClient,
    tokens: TokenSet,
}

impl KeycloakSession {
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }
}

/// Keycloak identity provider.
///
/// Stateless: every realm gets its own HTTP client and session.
#[derive(Debug, Clone, Default)]
pub struct KeycloakProvider;

impl KeycloakProvider {
    pub fn new() -> Self {
        Self
    }

    /// Client credentials login followed by token introspection.
    ///
    /// A token that fails introspection is logged out before the error is
    /// returned.
    async fn client_login(
        &self,
        client: &KeycloakClient,
        auth: &ClientAuth,
    ) -> KeycloakResult<TokenSet> {
        let tokens = client.login_client(auth).await?;

        let outcome = match client.introspect(auth, &tokens).await {
            Ok(true) => return Ok(tokens),
            Ok(false) => KeycloakError::InactiveToken,
            Err(e) => e,
        };

        if let Some(refresh) = tokens.refresh_token() {
            if let Err(e) = client.logout_client(auth, refresh).await {
                warn!(realm = %client.realm(), error = %e, "Failed to log out rejected session");
            }
        }
        Err(outcome)
    }
}

#[async_trait]
impl IdentityProvider for KeycloakProvider {
    type Session = KeycloakSession;

    #[instrument(skip(self, realm), fields(realm = %realm.name))]
    async fn authenticate(&self, realm: &RealmConfig) -> SyncResult<KeycloakSession> {
        let client = KeycloakClient::new(realm).map_err(|e| e.into_sync_error(&realm.name))?;

        let tokens = match (&realm.client, &realm.user) {
            (Some(auth), _) => self.client_login(&client, auth).await,
            (None, Some(user)) => client.login_user(user, realm.login_realm()).await,
            (None, None) => Err(KeycloakError::Config(
                "no login method configured".to_string(),
            )),
        }
        .map_err(|e| e.into_sync_error(&realm.name))?;

        debug!("Authenticated");
        Ok(KeycloakSession { client, tokens })
    }

    #[instrument(skip(self, realm, session), fields(realm = %realm.name))]
    async fn end_session(&self, realm: &RealmConfig, session: KeycloakSession) -> SyncResult<()> {
        let KeycloakSession { client, tokens } = session;

        let result = match (&realm.client, &realm.user) {
            (Some(auth), _) => match tokens.refresh_token() {
                Some(refresh) => client.logout_client(auth, refresh).await,
                None => {
                    debug!("No refresh token issued, nothing to log out");
                    Ok(())
                }
            },
            (None, Some(_)) => match tokens.session_state() {
                Some(state) => {
                    client
                        .delete_user_session(realm.login_realm(), tokens.access_token(), state)
                        .await
                }
                None => {
                    debug!("No session state issued, nothing to log out");
                    Ok(())
                }
            },
            (None, None) => Ok(()),
        };

        result.map_err(|e| e.into_sync_error(&realm.name))
    }

    async fn fetch_group_tree(
        &self,
        session: &KeycloakSession,
        realm: &RealmConfig,
        search: Option<&str>,
    ) -> SyncResult<Vec<ProviderGroup>> {
        let groups = session
            .client
            .group_tree(session.tokens.access_token(), search)
            .await
            .map_err(|e| e.into_sync_error(&realm.name))?;

        Ok(groups.into_iter().map(ProviderGroup::from).collect())
    }

    async fn fetch_members(
        &self,
        session: &KeycloakSession,
        realm: &RealmConfig,
        group_id: &str,
    ) -> SyncResult<Vec<ProviderUser>> {
        let members = session
            .client
            .group_members(session.tokens.access_token(), group_id)
            .await
            .map_err(|e| e.into_sync_error(&realm.name))?;

        Ok(members.into_iter().map(ProviderUser::from).collect())
    }
}
