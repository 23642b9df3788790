//! Baseline group input.

use std::io;

use groupsync_core::{decode_baseline, read_baseline, GroupList};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Source name that selects standard input.
pub const STDIN: &str = "-";

/// Reads the current groups from a file, or from stdin for `-`.
pub fn read_groups(source: &str, prune: bool) -> CliResult<GroupList> {
    let groups = if source == STDIN {
        read_baseline(io::stdin().lock(), prune)
    } else {
        let bytes = std::fs::read(source)
            .map_err(|e| CliError::Baseline(format!("{source}: {e}")))?;
        decode_baseline(&bytes, prune)
    }
    .map_err(|e| CliError::Baseline(e.to_string()))?;

    debug!(source, count = groups.len(), "Loaded baseline groups");
    Ok(groups)
}
