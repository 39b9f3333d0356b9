//! Hooks letting a trust subsystem witness content written by a gadget update.

use std::path::Path;

use crate::error::GadgetResult;

/// Phase in which content is being changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOperation {
    /// New content is about to be written.
    Write,
    /// Previously written content is being restored.
    Rollback,
}

/// Verdict returned by an observer for a single change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChangeAction {
    /// Proceed with the change.
    Apply,
    /// Skip the change.
    Ignore,
}

/// Description of one file about to change inside a structure.
#[derive(Debug, Clone, Copy)]
pub struct ContentChange<'a> {
    /// Structure the file belongs to.
    pub structure: &'a str,
    /// Root directory of the mounted structure.
    pub target_root: &'a Path,
    /// Path of the file relative to `target_root`.
    pub relative_path: &'a str,
    /// File holding the new content.
    pub after: &'a Path,
    /// Backup of the previous content, when one exists.
    pub before: Option<&'a Path>,
}

/// Observer consulted by the update algorithm around content writes.
pub trait ContentObserver: Send {
    /// Observe a single change.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the update.
    fn observe(
        &mut self,
        operation: ContentOperation,
        change: &ContentChange<'_>,
    ) -> GadgetResult<ContentChangeAction>;

    /// Called once all changes were observed and before anything is written.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the update.
    fn before_write(&mut self) -> GadgetResult<()> {
        Ok(())
    }

    /// Called when the update was abandoned after observation started.
    ///
    /// # Errors
    ///
    /// Returns an error when observer state could not be reverted.
    fn canceled(&mut self) -> GadgetResult<()> {
        Ok(())
    }
}
