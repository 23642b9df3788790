//! groupsync command line.
//!
//! Loads a realm configuration, optionally reads the current OpenShift
//! groups as a baseline, reconciles both against Keycloak, and prints the
//! resulting groups as an OpenShift `GroupList`.

pub mod args;
pub mod error;
pub mod input;
pub mod logging;
pub mod output;

use std::path::Path;

use groupsync_core::{project, reconcile, ProjectionOptions, SyncConfig};
use groupsync_keycloak::KeycloakProvider;
use tracing::{info, warn};

pub use args::{Cli, LogFormat, OutputFormat};
pub use error::{CliError, CliResult};

/// Runs one synchronization pass with the given arguments.
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli.config)?;

    if config.realms.is_empty() {
        return Err(CliError::NoRealms);
    }

    let baseline = match cli.groups.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(source) => Some(input::read_groups(source, config.prune)?),
        None => None,
    };

    info!(
        realms = config.realms.len(),
        baseline = baseline.as_ref().map_or(0, |b| b.len()),
        prune = config.prune,
        "Starting group synchronization"
    );

    let provider = KeycloakProvider::new();
    let groups = reconcile(&provider, &config, baseline.as_ref()).await;

    let options = ProjectionOptions {
        prune: config.prune,
        only_changed: baseline.is_some(),
    };
    let projected = project(&groups, options);
    info!(groups = projected.len(), "Synchronization complete");

    let rendered = output::render(&projected, cli.output_format)?;
    output::emit(cli.output.as_deref(), &rendered)
}

/// Loads, validates, and applies environment overrides to the configuration.
pub fn load_config(path: &Path) -> CliResult<SyncConfig> {
    if path.as_os_str().is_empty() {
        return Err(CliError::NoConfig);
    }
    if !path.exists() {
        return Err(CliError::ConfigNotFound(path.to_path_buf()));
    }

    let mut config =
        SyncConfig::from_file(path).map_err(|e| CliError::ConfigInvalid(e.to_string()))?;
    config.apply_env_overrides();

    if config.prune {
        warn!("Pruning enabled: baseline users missing from every realm will be removed");
    }

    Ok(config)
}
