//! Installed snap records.

use gadgetd_snap::{Revision, SideInfo, SnapType};
use serde::{Deserialize, Serialize};

/// Installation record of one snap instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapState {
    /// Declared snap type.
    pub snap_type: SnapType,
    /// Installed revisions, oldest first.
    pub sequence: Vec<SideInfo>,
    /// Revision currently in use.
    pub current: Revision,
    /// Instance key for parallel installs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_key: Option<String>,
    /// Whether the current revision is active.
    pub active: bool,
}

impl SnapState {
    /// Record for a single active revision.
    #[must_use]
    pub fn single(snap_type: SnapType, side_info: SideInfo) -> Self {
        let current = side_info.revision;
        Self {
            snap_type,
            sequence: vec![side_info],
            current,
            instance_key: None,
            active: true,
        }
    }

    /// Side info of the current revision.
    #[must_use]
    pub fn current_side_info(&self) -> Option<&SideInfo> {
        self.sequence
            .iter()
            .find(|side_info| side_info.revision == self.current)
    }

    /// Instance name for the record stored under `snap_name`.
    #[must_use]
    pub fn instance_name(&self, snap_name: &str) -> String {
        self.instance_key.as_deref().map_or_else(
            || snap_name.to_string(),
            |key| format!("{snap_name}_{key}"),
        )
    }
}
