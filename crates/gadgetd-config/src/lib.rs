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

//! Filesystem layout and platform detection for gadgetd.
//!
//! Layout: `dirs.rs` (directory layout rooted at `GADGETD_ROOT`), `release.rs`
//! (os-release parsing and classic detection), `error.rs` (`ConfigError`).

pub mod dirs;
pub mod error;
pub mod release;

pub use dirs::{Dirs, ROOT_ENV};
pub use error::{ConfigError, ConfigResult};
pub use release::{ON_CLASSIC_ENV, Release};
