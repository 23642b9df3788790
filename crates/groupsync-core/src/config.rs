//! Sync configuration loading and types.
//!
//! The configuration file is YAML (JSON is accepted as well) and lists the
//! realms to reconcile, in the order their groups are merged.
//!
//! ```yaml
//! prune: true
//! realms:
//!   - name: sso
//!     url: https://sso.example.com/auth
//!     client:
//!       client-id: groupsync
//!       client-secret: s3cret
//!     group-prefix: "sso-"
//!     subgroups: true
//!     subgroup-concat-names: true
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use validator::Validate;

use crate::error::{SyncError, SyncResult};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncConfig {
    /// Realms in merge order.
    #[serde(default)]
    pub realms: Vec<RealmConfig>,

    /// Mark baseline members as prune candidates and trim them on output.
    #[serde(default)]
    pub prune: bool,

    #[serde(default)]
    pub sync_mode: SyncMode,
}

/// Where the baseline enters the merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// The baseline is the starting accumulator; realms merge onto it.
    #[default]
    BaselineFirst,
    /// Realms accumulate first; the baseline merges onto the result.
    BaselineLast,
}

/// Client credentials login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientAuth {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// Admin user login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAuth {
    pub username: String,
    pub password: SecretString,

    /// Realm to log in to, when different from the target realm.
    #[serde(default)]
    pub realm: Option<String>,
}

/// Configuration for a single realm.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct RealmConfig {
    #[validate(length(min = 1, message = "Realm name is required"))]
    pub name: String,

    /// Base URL of the identity provider.
    #[validate(length(min = 1, message = "Realm url is required"))]
    pub url: String,

    #[serde(default)]
    pub client: Option<ClientAuth>,

    #[serde(default)]
    pub user: Option<UserAuth>,

    #[serde(default = "default_true")]
    pub ssl_verify: bool,

    /// User attributes to take the username from, first match wins.
    #[serde(default)]
    pub preferred_username: Vec<String>,

    /// Allow list: only groups with these names (found at any depth) are roots.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Raw group names that are skipped. Their subgroups are still processed.
    #[serde(default)]
    pub blocked_groups: Vec<String>,

    /// Final names that are never emitted.
    #[serde(default)]
    pub blocked_names: Vec<String>,

    #[serde(default)]
    pub group_prefix: String,

    #[serde(default)]
    pub group_suffix: String,

    /// Raw group name to alias.
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Descend into subgroups.
    #[serde(default)]
    pub subgroups: bool,

    /// Add subgroup members to every ancestor group.
    #[serde(default, alias = "subroup-promote-users")]
    pub subgroup_promote_users: bool,

    /// Prefix subgroup names with their ancestor names.
    #[serde(default)]
    pub subgroup_concat_names: bool,

    #[serde(default)]
    pub subgroup_separator: String,

    /// Members requested per page.
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 10000, message = "Page size must be 1-10000"))]
    pub page_size: u32,

    /// HTTP request timeout.
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, message = "Timeout must be at least 1 second"))]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            client: None,
            user: None,
            ssl_verify: default_true(),
            preferred_username: Vec::new(),
            groups: Vec::new(),
            blocked_groups: Vec::new(),
            blocked_names: Vec::new(),
            group_prefix: String::new(),
            group_suffix: String::new(),
            aliases: HashMap::new(),
            subgroups: false,
            subgroup_promote_users: false,
            subgroup_concat_names: false,
            subgroup_separator: String::new(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RealmConfig {
    /// Creates a realm configuration with defaults for everything but name and url.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Use client credentials login.
    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.client = Some(ClientAuth {
            client_id: client_id.into(),
            client_secret: SecretString::new(secret.into()),
        });
        self
    }

    /// Use admin user login.
    #[must_use]
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        login_realm: Option<String>,
    ) -> Self {
        self.user = Some(UserAuth {
            username: username.into(),
            password: SecretString::new(password.into()),
            realm: login_realm,
        });
        self
    }

    /// Source tag for groups produced by this realm.
    pub fn source_tag(&self) -> String {
        format!("{}{}", crate::types::REALM_SOURCE_PREFIX, self.name)
    }

    /// Realm used for login and logout of admin users.
    pub fn login_realm(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.realm.as_deref())
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.name)
    }

    /// Field and cross-field validation.
    pub fn check(&self) -> SyncResult<()> {
        self.validate()?;

        match (&self.client, &self.user) {
            (None, None) => {
                return Err(SyncError::Validation(format!(
                    "realm {}: one of client or user login must be configured",
                    self.name
                )))
            }
            (Some(_), Some(_)) => {
                return Err(SyncError::Validation(format!(
                    "realm {}: client and user login are mutually exclusive",
                    self.name
                )))
            }
            _ => {}
        }

        if let Some(client) = &self.client {
            if client.client_id.is_empty() {
                return Err(SyncError::Validation(format!(
                    "realm {}: client-id is required",
                    self.name
                )));
            }
        }
        if let Some(user) = &self.user {
            if user.username.is_empty() {
                return Err(SyncError::Validation(format!(
                    "realm {}: username is required",
                    self.name
                )));
            }
        }

        url::Url::parse(&self.url).map_err(|e| {
            SyncError::Validation(format!("realm {}: invalid url {}: {e}", self.name, self.url))
        })?;

        if !self.ssl_verify {
            tracing::warn!(
                target: "security",
                realm = %self.name,
                "TLS certificate verification is DISABLED for this realm"
            );
        }

        Ok(())
    }
}

impl SyncConfig {
    /// Load configuration from a YAML or JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(content: &str) -> SyncResult<Self> {
        let config: SyncConfig = serde_yaml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every realm and reject duplicate realm names.
    pub fn validate(&self) -> SyncResult<()> {
        let mut seen = HashSet::new();
        for realm in &self.realms {
            realm.check()?;
            if !seen.insert(realm.name.as_str()) {
                return Err(SyncError::Validation(format!(
                    "realm {} is configured more than once",
                    realm.name
                )));
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(prune) = std::env::var("GROUPSYNC_PRUNE") {
            if let Ok(prune) = prune.trim().parse() {
                self.prune = prune;
            }
        }
    }
}
