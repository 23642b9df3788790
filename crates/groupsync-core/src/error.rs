//! Error types for group reconciliation.

use thiserror::Error;

/// Result type alias using `SyncError`.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while loading configuration, talking to an identity
/// provider, or decoding baseline groups.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration was parsed but failed validation.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Login to a realm failed or produced an unusable token.
    #[error("authentication failed for realm {realm}: {message}")]
    Authentication { realm: String, message: String },

    /// The identity provider returned an error or an unusable response.
    #[error("provider error: {0}")]
    Provider(String),

    /// Baseline group input could not be decoded.
    #[error("could not decode baseline groups: {0}")]
    Decode(String),

    /// I/O error while reading input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Returns true if this error came from the authentication step.
    pub fn is_authentication(&self) -> bool {
        matches!(self, SyncError::Authentication { .. })
    }
}

impl From<validator::ValidationErrors> for SyncError {
    fn from(err: validator::ValidationErrors) -> Self {
        SyncError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_classification() {
        let auth = SyncError::Authentication {
            realm: "sso".to_string(),
            message: "inactive token".to_string(),
        };
        assert!(auth.is_authentication());
        assert_eq!(
            auth.to_string(),
            "authentication failed for realm sso: inactive token"
        );

        assert!(!SyncError::Provider("boom".to_string()).is_authentication());
    }
}
