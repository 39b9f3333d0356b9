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

//! Shared, lock-protected state store for device management tasks.
//!
//! Layout: `store.rs` (`State` handle and the `StateGuard` critical section),
//! `task.rs` (changes, tasks, statuses and task logs), `snapstate.rs`
//! (installed snap records), `restart.rs` (restart requests), `runner.rs`
//! (task status driver), `error.rs` (`StateError`).
//!
//! # Design
//! - A single exclusive lock serialises every read and write.
//! - Blocking work must happen inside [`StateGuard::unlocked`], which releases
//!   the lock for the duration of a closure and always re-acquires it.

pub mod error;
pub mod restart;
pub mod runner;
pub mod snapstate;
pub mod store;
pub mod task;

pub use error::{StateError, StateResult, describe_error};
pub use restart::{RestartRequest, RestartType};
pub use runner::TaskRunner;
pub use snapstate::SnapState;
pub use store::{State, StateGuard};
pub use task::{Change, ChangeId, LogLevel, Task, TaskId, TaskLogEntry, TaskStatus};
