//! Reconciliation driver.
//!
//! Realms are processed one at a time, in configuration order, and each
//! realm's groups are merged onto a single accumulator.

use tracing::{debug, error, info, instrument, warn};

use crate::config::{RealmConfig, SyncConfig, SyncMode};
use crate::error::SyncResult;
use crate::flatten::{select_by_name, RealmTree};
use crate::group_list::GroupList;
use crate::merge::merge;
use crate::provider::{IdentityProvider, ProviderGroup};

/// Fetches, flattens and populates one realm's groups.
///
/// Once a session exists it is always ended, whatever the outcome; a failed
/// teardown is only logged.
#[instrument(skip(provider, realm), fields(realm = %realm.name))]
pub async fn reconcile_realm<P>(provider: &P, realm: &RealmConfig) -> SyncResult<GroupList>
where
    P: IdentityProvider + ?Sized,
{
    let session = provider.authenticate(realm).await?;

    let result = collect_realm(provider, &session, realm).await;

    if let Err(e) = provider.end_session(realm, session).await {
        warn!(error = %e, "Could not log out");
    }

    result
}

async fn collect_realm<P>(
    provider: &P,
    session: &P::Session,
    realm: &RealmConfig,
) -> SyncResult<GroupList>
where
    P: IdentityProvider + ?Sized,
{
    let roots = root_groups(provider, session, realm).await?;
    let mut tree = RealmTree::flatten(&roots, realm);

    let pending: Vec<_> = tree
        .retained()
        .map(|(handle, group)| (handle, group.id.clone(), group.final_name()))
        .collect();

    for (handle, group_id, final_name) in pending {
        match provider.fetch_members(session, realm, &group_id).await {
            Ok(members) => {
                debug!(group = %final_name, members = members.len(), "Fetched members");
                tree.add_members(handle, &members);
            }
            Err(e) => {
                error!(group = %final_name, error = %e, "Could not fetch group members");
            }
        }
    }

    Ok(tree.into_group_list())
}

/// The flattening roots: the whole forest, or the groups matching the
/// realm's allow list when one is configured.
async fn root_groups<P>(
    provider: &P,
    session: &P::Session,
    realm: &RealmConfig,
) -> SyncResult<Vec<ProviderGroup>>
where
    P: IdentityProvider + ?Sized,
{
    if realm.groups.is_empty() {
        return provider.fetch_group_tree(session, realm, None).await;
    }

    let mut roots = Vec::new();
    for name in realm.groups.iter().filter(|n| !n.is_empty()) {
        match provider.fetch_group_tree(session, realm, Some(name)).await {
            Ok(forest) => roots.extend(select_by_name(&forest, name)),
            Err(e) => warn!(group = %name, error = %e, "Could not get group by name"),
        }
    }
    Ok(roots)
}

/// Reconciles every configured realm and merges them in order.
///
/// A failing realm is logged and skipped; the remaining realms still run.
pub async fn reconcile_realms<P>(provider: &P, config: &SyncConfig) -> GroupList
where
    P: IdentityProvider + ?Sized,
{
    fold_realms(provider, config, GroupList::new()).await
}

async fn fold_realms<P>(provider: &P, config: &SyncConfig, start: GroupList) -> GroupList
where
    P: IdentityProvider + ?Sized,
{
    let mut accumulated = start;

    for realm in &config.realms {
        match reconcile_realm(provider, realm).await {
            Ok(groups) if groups.is_empty() => {
                warn!(realm = %realm.name, "No groups returned for realm");
            }
            Ok(groups) => {
                info!(realm = %realm.name, groups = groups.len(), "Realm reconciled");
                accumulated = merge(&accumulated, &groups);
            }
            Err(e) if e.is_authentication() => {
                error!(realm = %realm.name, error = %e, "Skipping realm: authentication failed");
            }
            Err(e) => {
                error!(realm = %realm.name, error = %e, "Skipping realm");
            }
        }
    }

    accumulated
}

/// Reconciles all realms against an optional baseline, honouring the
/// configured [`SyncMode`].
pub async fn reconcile<P>(
    provider: &P,
    config: &SyncConfig,
    baseline: Option<&GroupList>,
) -> GroupList
where
    P: IdentityProvider + ?Sized,
{
    match (baseline, config.sync_mode) {
        (None, _) => reconcile_realms(provider, config).await,
        (Some(baseline), SyncMode::BaselineFirst) => {
            fold_realms(provider, config, baseline.clone()).await
        }
        (Some(baseline), SyncMode::BaselineLast) => {
            let realms = reconcile_realms(provider, config).await;
            merge(&realms, baseline)
        }
    }
}
