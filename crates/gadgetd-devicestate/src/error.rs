//! # Design
//!
//! - Constant messages; snap names, paths and models travel as fields.
//! - [`DeviceStateError::class`] separates conditions that retrying cannot fix
//!   from transient ones.
//! - Sources are preserved so task logs show the full chain.

use std::io;
use std::path::PathBuf;

use gadgetd_boot::BootError;
use gadgetd_gadget::GadgetError;
use gadgetd_snap::SnapError;
use gadgetd_state::{StateError, TaskId};
use thiserror::Error;

/// Result alias for device management operations.
pub type DeviceStateResult<T> = Result<T, DeviceStateError>;

/// Whether re-running a failed task can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Input or environment is wrong; retrying yields the same failure.
    Fatal,
    /// The condition may be transient.
    Retriable,
}

/// Failure reading snap or gadget metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Snap metadata could not be read.
    #[error("snap metadata unavailable")]
    Snap(#[from] SnapError),
    /// Gadget metadata could not be read or validated.
    #[error("gadget metadata unavailable")]
    Gadget(#[from] GadgetError),
}

/// Errors produced by device management task handlers.
#[derive(Debug, Error)]
pub enum DeviceStateError {
    /// The platform has no managed boot layout.
    #[error("gadget asset updates are not supported on classic systems")]
    OnClassic,
    /// The task carries no snap setup, directly or by reference.
    #[error("task has no snap setup")]
    MissingSnapSetup {
        /// Task being handled.
        task_id: TaskId,
    },
    /// The snap setup stored on the task could not be decoded.
    #[error("task snap setup is invalid")]
    SnapSetup {
        /// Task being handled.
        task_id: TaskId,
        /// Underlying decoding error.
        source: StateError,
    },
    /// A state lookup failed.
    #[error("state lookup failed")]
    State {
        /// Underlying state error.
        #[from]
        source: StateError,
    },
    /// The device has no model recorded yet.
    #[error("device model unavailable")]
    NoDeviceModel,
    /// The driving snap is not the gadget named by the model.
    #[error("cannot apply gadget assets update from non-model gadget snap")]
    NonModelGadget {
        /// Instance name of the driving snap.
        snap: String,
        /// Gadget snap name expected by the model.
        expected: String,
    },
    /// Metadata of the gadget being installed could not be loaded.
    #[error("cannot read candidate gadget snap details")]
    PendingGadget {
        /// Instance name of the candidate gadget.
        snap: String,
        /// Underlying metadata failure.
        source: MetadataError,
    },
    /// Metadata of the installed gadget could not be loaded.
    #[error("cannot read current gadget snap details")]
    CurrentGadget {
        /// Instance name of the installed gadget.
        snap: String,
        /// Underlying metadata failure.
        source: MetadataError,
    },
    /// The rollback workspace could not be created.
    #[error("cannot prepare update rollback directory")]
    RollbackDir {
        /// Workspace path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The trusted asset observer could not be set up.
    #[error("cannot setup asset update observer")]
    Observer {
        /// Model reference (`brand/model`).
        model: String,
        /// Underlying boot error.
        source: BootError,
    },
    /// The update algorithm failed.
    #[error("gadget assets update failed")]
    Update {
        /// Instance name of the gadget being applied.
        snap: String,
        /// Underlying update failure.
        source: GadgetError,
    },
    /// The blocking handler did not run to completion.
    #[error("gadget assets task did not complete")]
    Join {
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}

impl DeviceStateError {
    /// Fatal or retriable classification.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RollbackDir { .. } | Self::Observer { .. } | Self::Update { .. } => {
                ErrorClass::Retriable
            }
            Self::OnClassic
            | Self::MissingSnapSetup { .. }
            | Self::SnapSetup { .. }
            | Self::State { .. }
            | Self::NoDeviceModel
            | Self::NonModelGadget { .. }
            | Self::PendingGadget { .. }
            | Self::CurrentGadget { .. }
            | Self::Join { .. } => ErrorClass::Fatal,
        }
    }

    /// Whether the task engine may run the task again.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self.class(), ErrorClass::Retriable)
    }
}
