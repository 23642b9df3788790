//! Keycloak identity provider for groupsync.
//!
//! Implements [`groupsync_core::IdentityProvider`] on top of the Keycloak
//! admin REST API:
//!
//! - client credentials login with token introspection, or admin user login
//! - group tree retrieval, optionally by name search
//! - paged group membership retrieval
//! - session teardown through OIDC logout or admin session deletion
//!
//! # Example
//!
//! ```no_run
//! use groupsync_core::{reconcile_realms, SyncConfig};
//! use groupsync_keycloak::KeycloakProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::from_file("groupsync.yml")?;
//! let groups = reconcile_realms(&KeycloakProvider::new(), &config).await;
//! println!("{} groups", groups.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod error;
mod models;
mod provider;

pub use auth::TokenSet;
pub use client::KeycloakClient;
pub use error::{KeycloakError, KeycloakResult};
pub use models::{GroupRepresentation, UserRepresentation};
pub use provider::{KeycloakProvider, KeycloakSession};
