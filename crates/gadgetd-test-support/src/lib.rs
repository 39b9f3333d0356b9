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
#![allow(clippy::multiple_crate_versions)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (models and on-disk snaps), fakes.rs (instrumented
//! update algorithm and observer resolvers).

pub mod fakes;
pub mod fixtures;

pub use fakes::{NullObserver, ObservedWrite, RecordingUpdater, StaticObserverResolver, UpdateCall};
pub use fixtures::{PC_GADGET_YAML, core_model, uc20_model, write_gadget_snap, write_snap_yaml};
