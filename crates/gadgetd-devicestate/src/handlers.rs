//! The update-gadget-assets task handler.
//!
//! # Design
//! - Prepare reads everything the update needs while holding the state lock.
//! - The update algorithm runs with the lock released; the lock is taken back
//!   before the outcome touches the task or requests a restart.
//! - A rollback workspace survives failures and no-op runs; it is only
//!   removed after assets were written.

use std::path::{Path, PathBuf};

use gadgetd_gadget::{ContentObserver, GadgetData, UpdateOutcome, UpdatePolicy, UpdateRequest};
use gadgetd_state::{RestartType, StateGuard, TaskId, TaskStatus};
use tracing::{debug, info};

use crate::context::DeviceContext;
use crate::error::{DeviceStateError, DeviceStateResult};
use crate::gadgets::{load_current, load_pending};
use crate::manager::DeviceManager;
use crate::observer::resolve_observer;
use crate::policy::select_policy;
use crate::rollback;
use crate::snapsetup::task_snap_setup;

/// Task kind handled by [`DeviceManager::do_update_gadget_assets`].
pub const UPDATE_GADGET_ASSETS: &str = "update-gadget-assets";

struct PreparedUpdate {
    snap: String,
    current: GadgetData,
    pending: GadgetData,
    rollback_dir: PathBuf,
    policy: UpdatePolicy,
    observer: Option<Box<dyn ContentObserver>>,
}

impl DeviceManager {
    /// Apply the boot assets of the gadget driving `task_id`.
    ///
    /// On success the task is marked done and a system restart is requested.
    /// When the update algorithm finds nothing to change, or no gadget is
    /// installed yet, the task succeeds without a restart.
    ///
    /// # Errors
    ///
    /// Returns an error classified by [`DeviceStateError::class`] when the
    /// platform, the task, the models or the gadget metadata are unusable, or
    /// when the update itself fails.
    pub fn do_update_gadget_assets(&self, task_id: TaskId) -> DeviceStateResult<()> {
        if self.release.on_classic {
            return Err(DeviceStateError::OnClassic);
        }

        let mut guard = self.state.lock();
        let Some(prepared) = self.prepare_update(&guard, task_id)? else {
            return Ok(());
        };
        let PreparedUpdate {
            snap,
            current,
            pending,
            rollback_dir,
            policy,
            mut observer,
        } = prepared;

        debug!(snap = %snap, policy = policy.as_str(), "applying gadget assets");
        let outcome = guard.unlocked(|| {
            self.updater.update(UpdateRequest {
                current: &current,
                pending: &pending,
                rollback_dir: &rollback_dir,
                policy,
                observer: observer
                    .as_deref_mut()
                    .map(|observer| observer as &mut dyn ContentObserver),
            })
        });

        match outcome {
            Ok(UpdateOutcome::NoUpdate) => {
                info!(snap = %snap, "no gadget assets update needed");
                guard
                    .task_mut(task_id)?
                    .logf("No gadget assets update needed");
                Ok(())
            }
            Ok(UpdateOutcome::Applied) => {
                Self::finish_applied(&mut guard, task_id, &rollback_dir)?;
                info!(snap = %snap, "gadget assets updated; restart requested");
                Ok(())
            }
            Err(source) => Err(DeviceStateError::Update { snap, source }),
        }
    }

    fn prepare_update(
        &self,
        guard: &StateGuard<'_>,
        task_id: TaskId,
    ) -> DeviceStateResult<Option<PreparedUpdate>> {
        let setup = task_snap_setup(guard, task_id)?;
        let ctx = DeviceContext::resolve(guard, task_id)?;

        let snap = setup.instance_name();
        let expected = ctx.expected_gadget();
        if snap != expected {
            return Err(DeviceStateError::NonModelGadget {
                snap,
                expected: expected.to_string(),
            });
        }

        let pending = load_pending(self.snaps.as_ref(), &setup, ctx.model())?;
        let Some(current) = load_current(guard, self.snaps.as_ref(), ctx.ground_model())? else {
            info!(snap = %snap, "no current gadget; skipping assets update during seeding");
            return Ok(None);
        };

        let rollback_dir = rollback::allocate(
            &self.dirs.rollback_dir,
            &rollback::workspace_name(&snap, setup.revision()),
        )?;
        let policy = select_policy(&ctx);
        let observer = resolve_observer(self.observers.as_ref(), ctx.model())?;

        Ok(Some(PreparedUpdate {
            snap,
            current,
            pending,
            rollback_dir,
            policy,
            observer,
        }))
    }

    fn finish_applied(
        guard: &mut StateGuard<'_>,
        task_id: TaskId,
        rollback_dir: &Path,
    ) -> DeviceStateResult<()> {
        guard.task_mut(task_id)?.set_status(TaskStatus::Done);
        rollback::reclaim(rollback_dir);
        guard.request_restart(RestartType::System);
        Ok(())
    }
}
