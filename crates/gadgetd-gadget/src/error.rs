//! # Design
//!
//! - Constant messages with structured context fields.
//! - Update and observer failures box their sources so external algorithms
//!   and trust subsystems can surface their own error types.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for gadget operations.
pub type GadgetResult<T> = Result<T, GadgetError>;

/// Errors produced while loading gadget metadata or applying gadget assets.
#[derive(Debug, Error)]
pub enum GadgetError {
    /// IO failure while reading gadget metadata.
    #[error("gadget io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// `gadget.yaml` could not be decoded.
    #[error("gadget yaml failure")]
    Yaml {
        /// Path of the YAML document.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// The declared layout is not valid for the model.
    #[error("invalid gadget layout")]
    InvalidLayout {
        /// Volume the violation was found in, when applicable.
        volume: Option<String>,
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The update algorithm failed while writing assets.
    #[error("gadget update failed")]
    Update {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A content observer rejected or failed to record a change.
    #[error("gadget content observer failed")]
    Observer {
        /// Observer hook that failed.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl GadgetError {
    pub(crate) fn invalid_layout(
        volume: Option<&str>,
        field: &'static str,
        reason: &'static str,
        value: Option<&str>,
    ) -> Self {
        Self::InvalidLayout {
            volume: volume.map(str::to_string),
            field,
            reason,
            value: value.map(str::to_string),
        }
    }

    /// Wrap an update algorithm failure.
    #[must_use]
    pub fn update(operation: &'static str, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Update {
            operation,
            source: source.into(),
        }
    }

    /// Wrap a content observer failure.
    #[must_use]
    pub fn observer(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Observer {
            operation,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_variants_with_sources() {
        let update = GadgetError::update("write", io::Error::other("disk full"));
        assert!(matches!(update, GadgetError::Update { operation: "write", .. }));
        assert!(update.source().is_some());

        let observer = GadgetError::observer("observe", "asset rejected");
        assert!(matches!(observer, GadgetError::Observer { .. }));
        assert_eq!(observer.to_string(), "gadget content observer failed");

        let layout = GadgetError::invalid_layout(Some("pc"), "role", "unknown", Some("bogus"));
        assert!(matches!(
            layout,
            GadgetError::InvalidLayout {
                field: "role",
                reason: "unknown",
                ..
            }
        ));
    }
}
