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

//! Snap and device model primitives shared by the gadget update pipeline.
//!
//! Layout: `model.rs` (device model assertions as seen by the update task),
//! `info.rs` (revisions, side info, snap metadata and the mounted-snap reader),
//! `error.rs` (`SnapError`).

pub mod error;
pub mod info;
pub mod model;

pub use error::{SnapError, SnapResult};
pub use info::{MountedSnapReader, Revision, SideInfo, SnapInfo, SnapReader, SnapType, snap_name};
pub use model::{Model, ModelGrade};
