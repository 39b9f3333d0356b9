//! # Design
//!
//! - Constant messages; paths and operations are carried as fields.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for boot asset operations.
pub type BootResult<T> = Result<T, BootError>;

/// Errors produced by the boot asset trust subsystem.
#[derive(Debug, Error)]
pub enum BootError {
    /// IO failure while managing the trusted asset cache.
    #[error("boot asset io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl BootError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
