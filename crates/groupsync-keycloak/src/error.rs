//! Error types for the Keycloak client.

use groupsync_core::SyncError;
use thiserror::Error;

/// Result type alias using `KeycloakError`.
pub type KeycloakResult<T> = Result<T, KeycloakError>;

/// Errors that can occur when talking to Keycloak.
#[derive(Debug, Error)]
pub enum KeycloakError {
    /// Client construction or URL configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login was rejected.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Introspection reported the freshly issued token as inactive.
    #[error("inactive token")]
    InactiveToken,

    /// Keycloak answered with a non-success status.
    #[error("Keycloak API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session teardown failed.
    #[error("Logout failed: {0}")]
    Logout(String),
}

impl KeycloakError {
    /// Whether this error means the credentials or token were rejected.
    pub fn is_auth(&self) -> bool {
        match self {
            KeycloakError::Auth(_) | KeycloakError::InactiveToken => true,
            KeycloakError::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Converts into the engine's error type for the given realm.
    pub fn into_sync_error(self, realm: &str) -> SyncError {
        if self.is_auth() {
            SyncError::Authentication {
                realm: realm.to_string(),
                message: self.to_string(),
            }
        } else {
            SyncError::Provider(self.to_string())
        }
    }
}
