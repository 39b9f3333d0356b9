//! Driving snap reference stored on tasks.

use gadgetd_snap::{Revision, SideInfo, SnapType};
use gadgetd_state::{StateGuard, TaskId};
use serde::{Deserialize, Serialize};

use crate::error::{DeviceStateError, DeviceStateResult};

/// Task data key holding a [`SnapSetup`].
pub const SNAP_SETUP_KEY: &str = "snap-setup";
/// Task data key naming another task that holds the [`SnapSetup`].
pub const SNAP_SETUP_TASK_KEY: &str = "snap-setup-task";

/// Snap being installed or refreshed by a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SnapSetup {
    /// Name and revision of the snap.
    pub side_info: SideInfo,
    /// Instance key for parallel installs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_key: Option<String>,
    /// Declared snap type.
    #[serde(rename = "type", default)]
    pub snap_type: SnapType,
}

impl SnapSetup {
    /// Setup for `side_info` without an instance key.
    #[must_use]
    pub const fn new(side_info: SideInfo, snap_type: SnapType) -> Self {
        Self {
            side_info,
            instance_key: None,
            snap_type,
        }
    }

    /// Attach an instance key.
    #[must_use]
    pub fn with_instance_key(mut self, key: impl Into<String>) -> Self {
        self.instance_key = Some(key.into());
        self
    }

    /// `<name>` or `<name>_<instance_key>`.
    #[must_use]
    pub fn instance_name(&self) -> String {
        match self.instance_key.as_deref() {
            Some(key) if !key.is_empty() => format!("{}_{key}", self.side_info.real_name),
            _ => self.side_info.real_name.clone(),
        }
    }

    /// Revision being installed.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.side_info.revision
    }
}

/// Snap setup of `task_id`, following a `snap-setup-task` reference if needed.
///
/// # Errors
///
/// Returns an error when the task or the referenced task is unknown, when no
/// setup is stored, or when the stored setup does not decode.
pub fn task_snap_setup(guard: &StateGuard<'_>, task_id: TaskId) -> DeviceStateResult<SnapSetup> {
    let decode = |source| DeviceStateError::SnapSetup { task_id, source };

    let task = guard.task(task_id)?;
    if let Some(setup) = task.get::<SnapSetup>(SNAP_SETUP_KEY).map_err(decode)? {
        return Ok(setup);
    }
    let Some(owner) = task.get::<TaskId>(SNAP_SETUP_TASK_KEY).map_err(decode)? else {
        return Err(DeviceStateError::MissingSnapSetup { task_id });
    };
    guard
        .task(owner)?
        .get::<SnapSetup>(SNAP_SETUP_KEY)
        .map_err(decode)?
        .ok_or(DeviceStateError::MissingSnapSetup { task_id })
}
