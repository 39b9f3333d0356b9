//! # Design
//!
//! - Constant error messages; context lives in fields.
//! - Preserve the underlying IO/YAML errors as sources.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for snap metadata operations.
pub type SnapResult<T> = Result<T, SnapError>;

/// Errors produced while reading snap metadata.
#[derive(Debug, Error)]
pub enum SnapError {
    /// IO failure while reading snap metadata from disk.
    #[error("snap metadata io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// `snap.yaml` could not be decoded.
    #[error("snap metadata yaml failure")]
    Yaml {
        /// Path of the YAML document.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// Metadata decoded but failed validation.
    #[error("invalid snap metadata")]
    InvalidMetadata {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl SnapError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
