//! Contract of the gadget asset update algorithm.
//!
//! The algorithm itself (diffing layouts, writing raw images and filesystem
//! content, rolling back on failure) lives behind [`GadgetUpdater`]; callers
//! only see the three-way outcome.

use std::path::Path;

use crate::error::GadgetResult;
use crate::info::GadgetData;
use crate::observer::ContentObserver;
use crate::policy::UpdatePolicy;

/// Non-error outcomes of an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Assets were written; a reboot is needed for them to take effect.
    Applied,
    /// Nothing differed under the selected policy; nothing was written.
    NoUpdate,
}

/// Inputs to a single update run.
pub struct UpdateRequest<'a> {
    /// Layout currently installed on the device.
    pub current: &'a GadgetData,
    /// Layout shipped by the gadget being installed.
    pub pending: &'a GadgetData,
    /// Scratch directory for backups of overwritten content.
    pub rollback_dir: &'a Path,
    /// Which structures may be updated.
    pub policy: UpdatePolicy,
    /// Optional observer witnessing content changes.
    pub observer: Option<&'a mut dyn ContentObserver>,
}

/// The gadget asset update algorithm.
pub trait GadgetUpdater: Send + Sync {
    /// Apply `request.pending` over `request.current`.
    ///
    /// # Errors
    ///
    /// Returns an error when the layouts are incompatible or writing fails.
    fn update(&self, request: UpdateRequest<'_>) -> GadgetResult<UpdateOutcome>;
}
