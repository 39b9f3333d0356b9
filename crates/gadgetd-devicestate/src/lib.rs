#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Device management tasks that apply gadget boot asset updates.
//!
//! Layout: `manager.rs` (`DeviceManager` and its collaborators), `handlers.rs`
//! (the update-gadget-assets task handler), `context.rs` (ground and candidate
//! models), `snapsetup.rs` (driving snap reference stored on tasks),
//! `gadgets.rs` (current and pending gadget loaders), `rollback.rs` (rollback
//! workspaces), `policy.rs` (update policy selection), `observer.rs` (trusted
//! asset observer resolution), `error.rs` (`DeviceStateError`).
//!
//! # Design
//! - State is only read and written while the lock is held; the update
//!   algorithm runs inside [`gadgetd_state::StateGuard::unlocked`].
//! - Every failure is classified as fatal or retriable so the task engine can
//!   decide whether to run the task again.

pub mod context;
pub mod error;
pub mod gadgets;
pub mod handlers;
pub mod manager;
pub mod observer;
pub mod policy;
pub mod rollback;
pub mod snapsetup;

pub use context::DeviceContext;
pub use error::{DeviceStateError, DeviceStateResult, ErrorClass, MetadataError};
pub use gadgets::{load_current, load_pending};
pub use handlers::UPDATE_GADGET_ASSETS;
pub use manager::DeviceManager;
pub use observer::resolve_observer;
pub use policy::select_policy;
pub use snapsetup::{SNAP_SETUP_KEY, SNAP_SETUP_TASK_KEY, SnapSetup, task_snap_setup};
