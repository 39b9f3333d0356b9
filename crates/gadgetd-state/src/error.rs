//! # Design
//!
//! - Constant messages with identifiers carried as fields.
//! - `describe_error` flattens a source chain for task logs.

use std::error::Error;
use std::fmt::Write as _;

use thiserror::Error;

use crate::task::{ChangeId, TaskId};

/// Result alias for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors produced by the state store.
#[derive(Debug, Error)]
pub enum StateError {
    /// No task exists with the identifier.
    #[error("task not found")]
    TaskNotFound {
        /// Missing task identifier.
        task_id: TaskId,
    },
    /// No change exists with the identifier.
    #[error("change not found")]
    ChangeNotFound {
        /// Missing change identifier.
        change_id: ChangeId,
    },
    /// Task data could not be encoded or decoded.
    #[error("task data encoding failed")]
    TaskData {
        /// Task owning the data.
        task_id: TaskId,
        /// Data key.
        key: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Render an error and its sources as `outer: inner: root`.
#[must_use]
pub fn describe_error(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(source) = current {
        let _ = write!(rendered, ": {source}");
        current = source.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer {
        source: io::Error,
    }

    #[test]
    fn describe_error_walks_sources() {
        let err = Outer {
            source: io::Error::other("disk full"),
        };
        assert_eq!(describe_error(&err), "outer failure: disk full");
    }

    #[test]
    fn describe_error_without_sources_is_display() {
        let err = StateError::TaskNotFound {
            task_id: TaskId::new(),
        };
        assert_eq!(describe_error(&err), "task not found");
    }
}
