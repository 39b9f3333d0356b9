//! Per-update rollback workspaces.

use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use gadgetd_snap::Revision;
use tracing::{debug, warn};

use crate::error::{DeviceStateError, DeviceStateResult};

/// Permission bits of a rollback workspace.
pub const ROLLBACK_DIR_MODE: u32 = 0o750;

/// Workspace name for an instance revision: `<instance>_<revision>`.
#[must_use]
pub fn workspace_name(instance_name: &str, revision: Revision) -> String {
    format!("{instance_name}_{revision}")
}

/// Create `<parent>/<name>` and any missing parents. Existing directories are reused.
///
/// # Errors
///
/// Returns [`DeviceStateError::RollbackDir`] when the directory cannot be created.
pub fn allocate(parent: &Path, name: &str) -> DeviceStateResult<PathBuf> {
    let path = parent.join(name);
    DirBuilder::new()
        .recursive(true)
        .mode(ROLLBACK_DIR_MODE)
        .create(&path)
        .map_err(|source| DeviceStateError::RollbackDir {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), "rollback workspace ready");
    Ok(path)
}

/// Remove a workspace recursively. Failures are logged and otherwise ignored.
pub fn reclaim(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => debug!(path = %path.display(), "rollback workspace removed"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            error = %err,
            path = %path.display(),
            "failed to remove gadget update rollback directory"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn workspace_names_include_revision() {
        assert_eq!(workspace_name("pc", Revision::new(3)), "pc_3");
        assert_eq!(workspace_name("pc_alt", Revision::new(-2)), "pc_alt_x2");
    }

    #[test]
    fn allocate_is_idempotent_and_restrictive() -> Result<()> {
        let root = TempDir::new()?;
        let parent = root.path().join("var/lib/snapd/rollback");
        let first = allocate(&parent, "pc_3")?;
        let second = allocate(&parent, "pc_3")?;
        assert_eq!(first, second);
        assert!(first.is_dir());
        let mode = fs::metadata(&first)?.permissions().mode() & 0o777;
        assert_eq!(mode & !ROLLBACK_DIR_MODE, 0);
        Ok(())
    }

    #[test]
    fn allocate_reports_blocked_paths() -> Result<()> {
        let root = TempDir::new()?;
        let blocker = root.path().join("rollback");
        fs::write(&blocker, b"not a directory")?;
        let result = allocate(&blocker, "pc_3");
        assert!(matches!(result, Err(DeviceStateError::RollbackDir { .. })));
        Ok(())
    }

    #[test]
    fn reclaim_tolerates_missing_directories() -> Result<()> {
        let root = TempDir::new()?;
        let workspace = allocate(root.path(), "pc_3")?;
        fs::write(workspace.join("backup.img"), b"old")?;
        reclaim(&workspace);
        assert!(!workspace.exists());
        reclaim(&workspace);
        Ok(())
    }
}
