//! Baseline group decoding.
//!
//! The baseline is an OpenShift-style `GroupList` or a single `Group`, in
//! YAML or JSON. The format is detected from the first non-whitespace byte.

use std::io::Read;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::group_list::GroupList;
use crate::types::{Group, User, BASELINE_ORIGIN};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectMeta {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroupDocument {
    kind: String,
    metadata: ObjectMeta,
    users: Option<Vec<String>>,
    items: Vec<GroupDocument>,
}

impl GroupDocument {
    fn is_single_group(&self) -> bool {
        match self.kind.as_str() {
            "Group" => true,
            "GroupList" => false,
            _ => self.items.is_empty() && !self.metadata.name.is_empty(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BaselineInput {
    Many(Vec<GroupDocument>),
    One(GroupDocument),
}

fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{' | '['))
}

/// Decodes baseline groups.
///
/// Every decoded member gets `prune_candidate = prune`. Groups start out
/// unchanged with [`BASELINE_ORIGIN`] as id and source.
pub fn decode_baseline(bytes: &[u8], prune: bool) -> SyncResult<GroupList> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SyncError::Decode(format!("input is not valid UTF-8: {e}")))?;

    if text.trim().is_empty() {
        debug!("Baseline input is empty");
        return Ok(GroupList::new());
    }

    let input: BaselineInput = if looks_like_json(text) {
        serde_json::from_str(text).map_err(|e| SyncError::Decode(format!("invalid JSON: {e}")))?
    } else {
        serde_yaml::from_str(text).map_err(|e| SyncError::Decode(format!("invalid YAML: {e}")))?
    };

    let documents = match input {
        BaselineInput::Many(items) => items,
        BaselineInput::One(doc) if doc.is_single_group() => vec![doc],
        BaselineInput::One(doc) => doc.items,
    };

    let mut groups = GroupList::new();
    for doc in documents {
        if doc.metadata.name.is_empty() {
            warn!("Ignoring baseline group without a name");
            continue;
        }

        let mut group = Group::baseline(doc.metadata.name);
        for username in doc.users.unwrap_or_default() {
            if username.is_empty() {
                continue;
            }
            let user = User::new(BASELINE_ORIGIN, username).with_prune_candidate(prune);
            group.users.insert(user.name.clone(), user);
        }
        groups.insert(group);
    }

    debug!(groups = groups.len(), "Decoded baseline groups");
    Ok(groups)
}

/// Reads a reader to the end and decodes it with [`decode_baseline`].
pub fn read_baseline<R: Read>(mut reader: R, prune: bool) -> SyncResult<GroupList> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    decode_baseline(&buf, prune)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_YAML: &str = r#"
apiVersion: user.openshift.io/v1
kind: GroupList
items:
  - apiVersion: user.openshift.io/v1
    kind: Group
    metadata:
      name: developers
    users:
      - alice
      - bob
  - apiVersion: user.openshift.io/v1
    kind: Group
    metadata:
      name: admins
    users: null
"#;

    const LIST_JSON: &str = r#"{
  "apiVersion": "user.openshift.io/v1",
  "kind": "GroupList",
  "metadata": {},
  "items": [
    {"kind": "Group", "metadata": {"name": "developers"}, "users": ["alice", "bob"]},
    {"kind": "Group", "metadata": {"name": "admins"}, "users": []}
  ]
}"#;

    const SINGLE_YAML: &str = r#"
apiVersion: user.openshift.io/v1
kind: Group
metadata:
  name: developers
users:
  - alice
  - bob
"#;

    const SINGLE_JSON: &str = r#"{"apiVersion": "user.openshift.io/v1", "kind": "Group",
 "metadata": {"name": "developers"}, "users": ["alice", "bob"]}"#;

    fn check_list(groups: &GroupList) {
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get("developers").unwrap().users.len(), 2);
        assert!(groups.get("admins").unwrap().users.is_empty());
    }

    fn check_single(groups: &GroupList) {
        assert_eq!(groups.len(), 1);
        let group = groups.get("developers").unwrap();
        assert_eq!(group.users.len(), 2);
        assert!(group.is_baseline());
        assert!(!group.changed);
        assert!(group.realms.is_empty());
    }

    #[test]
    fn test_group_list_yaml() {
        check_list(&decode_baseline(LIST_YAML.as_bytes(), false).unwrap());
    }

    #[test]
    fn test_group_list_json() {
        check_list(&decode_baseline(LIST_JSON.as_bytes(), false).unwrap());
    }

    #[test]
    fn test_single_group_yaml() {
        check_single(&decode_baseline(SINGLE_YAML.as_bytes(), false).unwrap());
    }

    #[test]
    fn test_single_group_json() {
        check_single(&decode_baseline(SINGLE_JSON.as_bytes(), false).unwrap());
    }

    #[test]
    fn test_bare_array() {
        let json = r#"[{"metadata": {"name": "a"}, "users": ["x"]}, {"metadata": {"name": "b"}}]"#;
        let groups = decode_baseline(json.as_bytes(), false).unwrap();
        assert_eq!(groups.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_prune_flag_is_applied() {
        let pruned = decode_baseline(SINGLE_YAML.as_bytes(), true).unwrap();
        assert!(pruned
            .get("developers")
            .unwrap()
            .users
            .values()
            .all(|u| u.prune_candidate));

        let kept = decode_baseline(SINGLE_YAML.as_bytes(), false).unwrap();
        assert!(kept
            .get("developers")
            .unwrap()
            .users
            .values()
            .all(|u| !u.prune_candidate));
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_baseline(b"  \n", true).unwrap().is_empty());
    }

    #[test]
    fn test_named_empty_group_list_has_no_groups() {
        let yaml = b"kind: GroupList\nmetadata:\n  name: all\nitems: []\n";
        let groups = decode_baseline(yaml, true).unwrap();
        assert!(groups.is_empty());

        let json = br#"{"kind": "GroupList", "metadata": {"name": "all"}, "items": []}"#;
        assert!(decode_baseline(json, true).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_input_is_decode_error() {
        assert!(matches!(
            decode_baseline(b"{not json", false),
            Err(SyncError::Decode(_))
        ));
        assert!(matches!(
            decode_baseline(b"items: [unclosed", false),
            Err(SyncError::Decode(_))
        ));
        assert!(matches!(
            decode_baseline(&[0xff, 0xfe], false),
            Err(SyncError::Decode(_))
        ));
    }

    #[test]
    fn test_read_baseline_from_reader() {
        let groups = read_baseline(std::io::Cursor::new(LIST_JSON), true).unwrap();
        check_list(&groups);
    }
}
