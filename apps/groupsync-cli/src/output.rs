//! OpenShift group documents.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use groupsync_core::OutputGroup;
use serde::Serialize;

use crate::args::OutputFormat;
use crate::error::{CliError, CliResult};

pub const API_VERSION: &str = "user.openshift.io/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftGroupList {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub items: Vec<OpenShiftGroup>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftGroup {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    pub users: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl From<&OutputGroup> for OpenShiftGroup {
    fn from(group: &OutputGroup) -> Self {
        Self {
            api_version: API_VERSION,
            kind: "Group",
            metadata: ObjectMeta {
                name: group.name.clone(),
                annotations: group.annotations.clone(),
            },
            users: group.users.clone(),
        }
    }
}

impl OpenShiftGroupList {
    pub fn new(groups: &[OutputGroup]) -> Self {
        Self {
            api_version: API_VERSION,
            kind: "GroupList",
            items: groups.iter().map(OpenShiftGroup::from).collect(),
        }
    }
}

/// Serializes the groups as a `GroupList` document.
pub fn render(groups: &[OutputGroup], format: OutputFormat) -> CliResult<String> {
    let list = OpenShiftGroupList::new(groups);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&list)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| CliError::Output(format!("Failed to serialize JSON: {e}"))),
        OutputFormat::Yaml => serde_yaml::to_string(&list)
            .map_err(|e| CliError::Output(format!("Failed to serialize YAML: {e}"))),
    }
}

/// Writes the document to `path`, or to stdout when no path is given.
pub fn emit(path: Option<&Path>, content: &str) -> CliResult<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .map_err(|e| CliError::Output(format!("{}: {e}", path.display()))),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
