//! # Group Reconciliation Engine
//!
//! Reconciles group membership pulled from identity provider realms against an
//! optional baseline of externally sourced groups, producing one canonical set
//! of groups keyed by their computed final name.
//!
//! ## Pipeline
//!
//! 1. [`flatten`] turns one realm's hierarchical group tree into a flat
//!    [`GroupList`], propagating membership to ancestors when configured.
//! 2. [`merge`] folds realm lists (and the baseline) into an accumulator
//!    without mutating its inputs.
//! 3. [`projection`] trims prune candidates and drops unchanged groups,
//!    yielding [`OutputGroup`] records ready for serialization.
//!
//! [`reconcile`] drives the whole pipeline against any [`IdentityProvider`].
//!
//! ## Example
//!
//! ```
//! use groupsync_core::prelude::*;
//!
//! let mut baseline = GroupList::new();
//! baseline.insert(
//!     Group::baseline("devs").with_user(User::new("openshift", "alice").with_prune_candidate(true)),
//! );
//!
//! let mut realm = GroupList::new();
//! realm.insert(Group::new("1", "devs", "realm:sso").with_realm("sso").with_user(User::new("1", "bob")));
//!
//! let merged = merge(&baseline, &realm);
//! let output = project(&merged, ProjectionOptions { prune: true, only_changed: true });
//! assert_eq!(output[0].users, vec!["bob".to_string()]);
//! ```

pub mod baseline;
pub mod config;
pub mod error;
pub mod flatten;
pub mod group_list;
pub mod merge;
pub mod naming;
pub mod projection;
pub mod provider;
pub mod reconcile;
pub mod types;

pub use baseline::{decode_baseline, read_baseline};
pub use config::{ClientAuth, RealmConfig, SyncConfig, SyncMode, UserAuth};
pub use error::{SyncError, SyncResult};
pub use flatten::{select_by_name, GroupHandle, RealmTree};
pub use group_list::GroupList;
pub use merge::merge;
pub use projection::{project, OutputGroup, ProjectionOptions};
pub use provider::{IdentityProvider, ProviderGroup, ProviderUser};
pub use reconcile::{reconcile, reconcile_realm, reconcile_realms};
pub use types::{Group, User};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{RealmConfig, SyncConfig, SyncMode};
    pub use crate::error::{SyncError, SyncResult};
    pub use crate::group_list::GroupList;
    pub use crate::merge::merge;
    pub use crate::projection::{project, OutputGroup, ProjectionOptions};
    pub use crate::provider::IdentityProvider;
    pub use crate::types::{Group, User};
}
