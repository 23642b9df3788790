//! Login and logout against Keycloak's OIDC endpoints.

use groupsync_core::{ClientAuth, UserAuth};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::client::api_error;
use crate::models::{ErrorBody, IntrospectionResponse, TokenResponse};
use crate::{KeycloakClient, KeycloakError, KeycloakResult};

/// Client id used for admin user logins.
const ADMIN_CLIENT_ID: &str = "admin-cli";

/// Tokens issued by a successful login.
#[derive(Debug, Clone)]
pub struct TokenSet {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    session_state: Option<String>,
}

impl TokenSet {
    fn from_response(response: TokenResponse) -> Self {
        Self {
            access_token: SecretString::new(response.access_token),
            refresh_token: response.refresh_token.map(SecretString::new),
            session_state: response.session_state,
        }
    }

    /// Bearer token for admin API calls.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Refresh token, required for client logout.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Server-side session id, required for admin session deletion.
    pub fn session_state(&self) -> Option<&str> {
        self.session_state.as_deref()
    }
}

impl KeycloakClient {
    /// Logs in with the client credentials grant on the synchronized realm.
    #[instrument(skip(self, client), fields(realm = %self.realm(), client_id = %client.client_id))]
    pub async fn login_client(&self, client: &ClientAuth) -> KeycloakResult<TokenSet> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose_secret().as_str()),
        ];
        self.request_token(self.realm(), &params).await
    }

    /// Logs in as an admin user through the `admin-cli` client.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn login_user(&self, user: &UserAuth, login_realm: &str) -> KeycloakResult<TokenSet> {
        let params = [
            ("grant_type", "password"),
            ("client_id", ADMIN_CLIENT_ID),
            ("username", user.username.as_str()),
            ("password", user.password.expose_secret().as_str()),
        ];
        self.request_token(login_realm, &params).await
    }

    async fn request_token(
        &self,
        realm: &str,
        params: &[(&str, &str)],
    ) -> KeycloakResult<TokenSet> {
        let url = self.oidc_endpoint(realm, &["token"])?;

        let response = self.http.post(url).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::Auth(format!(
                "token request failed with status {}: {}",
                status,
                ErrorBody::message(&body)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| KeycloakError::Auth(format!("failed to parse token response: {e}")))?;

        debug!(expires_in = ?token.expires_in, "Acquired access token");
        Ok(TokenSet::from_response(token))
    }

    /// Asks Keycloak whether an access token is active.
    #[instrument(skip(self, client, tokens), fields(realm = %self.realm()))]
    pub async fn introspect(&self, client: &ClientAuth, tokens: &TokenSet) -> KeycloakResult<bool> {
        let url = self.oidc_endpoint(self.realm(), &["token", "introspect"])?;
        let params = [
            ("token", tokens.access_token()),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose_secret().as_str()),
        ];

        let response = self.http.post(url).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let result: IntrospectionResponse = response.json().await?;
        Ok(result.active.unwrap_or(false))
    }

    /// Ends a client credentials session using its refresh token.
    #[instrument(skip(self, client, refresh_token), fields(realm = %self.realm()))]
    pub async fn logout_client(&self, client: &ClientAuth, refresh_token: &str) -> KeycloakResult<()> {
        let url = self.oidc_endpoint(self.realm(), &["logout"])?;
        let params = [
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose_secret().as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = self.http.post(url).form(&params).send().await?;
        if !response.status().is_success() {
            let err = api_error(response).await;
            return Err(KeycloakError::Logout(err.to_string()));
        }

        debug!("Client session logged out");
        Ok(())
    }

    /// Deletes an admin user's session on its login realm.
    #[instrument(skip(self, access_token))]
    pub async fn delete_user_session(
        &self,
        login_realm: &str,
        access_token: &str,
        session_state: &str,
    ) -> KeycloakResult<()> {
        let url = self.endpoint(&["admin", "realms", login_realm, "sessions", session_state])?;

        let response = self.http.delete(url).bearer_auth(access_token).send().await?;
        if !response.status().is_success() {
            let err = api_error(response).await;
            return Err(KeycloakError::Logout(err.to_string()));
        }

        debug!("User session deleted");
        Ok(())
    }
}
