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

//! Boot asset trust boundary: resolves content observers that witness changes
//! to measured boot assets during gadget updates.
//!
//! Layout: `resolver.rs` (`ObserverResolver` contract and its tagged outcome),
//! `assets.rs` (trusted asset cache observer), `error.rs` (`BootError`).

pub mod assets;
pub mod error;
pub mod resolver;

pub use assets::{ObservedAsset, TrustedAssetsObserver, TrustedAssetsResolver};
pub use error::{BootError, BootResult};
pub use resolver::{ObserverResolution, ObserverResolver};
