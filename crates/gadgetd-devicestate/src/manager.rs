//! Device manager owning the collaborators of device management tasks.

use std::fmt;
use std::sync::Arc;

use gadgetd_boot::{ObserverResolver, TrustedAssetsResolver};
use gadgetd_config::{Dirs, Release};
use gadgetd_gadget::GadgetUpdater;
use gadgetd_snap::{MountedSnapReader, SnapReader};
use gadgetd_state::{State, TaskId, TaskRunner, TaskStatus};

use crate::error::{DeviceStateError, DeviceStateResult};

/// Handles device management tasks against a shared [`State`].
pub struct DeviceManager {
    pub(crate) state: State,
    pub(crate) dirs: Dirs,
    pub(crate) release: Release,
    pub(crate) snaps: Arc<dyn SnapReader>,
    pub(crate) updater: Arc<dyn GadgetUpdater>,
    pub(crate) observers: Arc<dyn ObserverResolver>,
}

impl fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceManager")
            .field("dirs", &self.dirs)
            .field("release", &self.release)
            .finish_non_exhaustive()
    }
}

impl DeviceManager {
    /// Manager with explicit collaborators.
    #[must_use]
    pub fn new(
        state: State,
        dirs: Dirs,
        release: Release,
        snaps: Arc<dyn SnapReader>,
        updater: Arc<dyn GadgetUpdater>,
        observers: Arc<dyn ObserverResolver>,
    ) -> Self {
        Self {
            state,
            dirs,
            release,
            snaps,
            updater,
            observers,
        }
    }

    /// Manager reading snaps from `dirs.snap_mount_dir` and caching trusted
    /// boot assets under `dirs.boot_assets_dir`.
    #[must_use]
    pub fn with_defaults(
        state: State,
        dirs: Dirs,
        release: Release,
        updater: Arc<dyn GadgetUpdater>,
    ) -> Self {
        let snaps = Arc::new(MountedSnapReader::new(dirs.snap_mount_dir.clone()));
        let observers = Arc::new(TrustedAssetsResolver::new(dirs.boot_assets_dir.clone()));
        Self::new(state, dirs, release, snaps, updater, observers)
    }

    /// State the manager operates on.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Directory layout in use.
    #[must_use]
    pub const fn dirs(&self) -> &Dirs {
        &self.dirs
    }

    /// Run the update-gadget-assets handler for `task_id` on the blocking pool
    /// and record its outcome on the task.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, or [`DeviceStateError::Join`] when the
    /// blocking task panicked or was cancelled.
    pub async fn update_gadget_assets(
        self: Arc<Self>,
        task_id: TaskId,
    ) -> DeviceStateResult<TaskStatus> {
        let runner = TaskRunner::new(self.state.clone());
        tokio::task::spawn_blocking(move || {
            runner.run(task_id, || self.do_update_gadget_assets(task_id))
        })
        .await
        .map_err(|source| DeviceStateError::Join { source })?
    }
}
