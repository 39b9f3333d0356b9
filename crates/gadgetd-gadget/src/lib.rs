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

//! Gadget layout metadata and the contracts of the gadget asset update algorithm.
//!
//! Layout: `info.rs` (`gadget.yaml` model and model-bound validation),
//! `policy.rs` (structure update policies), `observer.rs` (content change
//! observation hooks), `update.rs` (`GadgetUpdater` contract and outcomes).

pub mod error;
pub mod info;
pub mod observer;
pub mod policy;
pub mod update;

pub use error::{GadgetError, GadgetResult};
pub use info::{
    GadgetData, GadgetInfo, Size, Volume, VolumeContent, VolumeStructure, VolumeUpdate, read_info,
};
pub use observer::{ContentChange, ContentChangeAction, ContentObserver, ContentOperation};
pub use policy::UpdatePolicy;
pub use update::{GadgetUpdater, UpdateOutcome, UpdateRequest};
