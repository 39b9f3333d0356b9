//! Ground and candidate models for the operation a task belongs to.

use gadgetd_snap::Model;
use gadgetd_state::{StateGuard, TaskId};

use crate::error::{DeviceStateError, DeviceStateResult};

/// Models visible to a task: the one the device runs and, during a remodel,
/// the one it is moving to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    ground: Model,
    candidate: Option<Model>,
}

impl DeviceContext {
    /// Context for an ordinary operation on `ground`.
    #[must_use]
    pub const fn new(ground: Model) -> Self {
        Self {
            ground,
            candidate: None,
        }
    }

    /// Context for a remodel from `ground` to `candidate`.
    #[must_use]
    pub const fn remodel(ground: Model, candidate: Model) -> Self {
        Self {
            ground,
            candidate: Some(candidate),
        }
    }

    /// Resolve the context of `task_id` from state.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is unknown or no device model is recorded.
    pub fn resolve(guard: &StateGuard<'_>, task_id: TaskId) -> DeviceStateResult<Self> {
        let change = guard.task(task_id)?.change();
        let ground = guard
            .model()
            .cloned()
            .ok_or(DeviceStateError::NoDeviceModel)?;
        Ok(Self {
            ground,
            candidate: guard.remodel_context(change).cloned(),
        })
    }

    /// Whether the operation changes the device model.
    #[must_use]
    pub const fn for_remodeling(&self) -> bool {
        self.candidate.is_some()
    }

    /// Model the device currently runs.
    #[must_use]
    pub const fn ground_model(&self) -> &Model {
        &self.ground
    }

    /// Model appropriate to the operation: the candidate when remodeling.
    #[must_use]
    pub const fn model(&self) -> &Model {
        match &self.candidate {
            Some(candidate) => candidate,
            None => &self.ground,
        }
    }

    /// Gadget snap name the driving snap must carry.
    #[must_use]
    pub fn expected_gadget(&self) -> &str {
        self.model().gadget_snap_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use gadgetd_state::State;

    fn pc() -> Model {
        Model::new("canonical", "pc", "pc", "pc-kernel")
    }

    fn pc_b() -> Model {
        Model::new("canonical", "pc-b", "pc-b", "pc-kernel")
    }

    #[test]
    fn refresh_uses_ground_model() -> Result<()> {
        let state = State::new();
        let mut guard = state.lock();
        guard.set_model(pc());
        let change = guard.new_change("refresh-snap", "Refresh pc");
        let task = guard.new_task(change, "update-gadget-assets", "Update")?;

        let ctx = DeviceContext::resolve(&guard, task)?;
        assert!(!ctx.for_remodeling());
        assert_eq!(ctx.model(), &pc());
        assert_eq!(ctx.expected_gadget(), "pc");
        Ok(())
    }

    #[test]
    fn remodel_uses_candidate_model() -> Result<()> {
        let state = State::new();
        let mut guard = state.lock();
        guard.set_model(pc());
        let change = guard.new_change("remodel", "Remodel to pc-b");
        guard.set_remodel_context(change, pc_b());
        let task = guard.new_task(change, "update-gadget-assets", "Update")?;

        let ctx = DeviceContext::resolve(&guard, task)?;
        assert!(ctx.for_remodeling());
        assert_eq!(ctx.ground_model(), &pc());
        assert_eq!(ctx.expected_gadget(), "pc-b");
        assert_eq!(ctx, DeviceContext::remodel(pc(), pc_b()));
        Ok(())
    }

    #[test]
    fn missing_model_is_an_error() -> Result<()> {
        let state = State::new();
        let mut guard = state.lock();
        let change = guard.new_change("refresh-snap", "Refresh pc");
        let task = guard.new_task(change, "update-gadget-assets", "Update")?;
        assert!(matches!(
            DeviceContext::resolve(&guard, task),
            Err(DeviceStateError::NoDeviceModel)
        ));
        Ok(())
    }
}
