//! Directory layout rooted at a configurable filesystem root.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the filesystem root.
pub const ROOT_ENV: &str = "GADGETD_ROOT";

/// Well-known locations used by gadget asset updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    /// Filesystem root every other path is derived from.
    pub root: PathBuf,
    /// Where snap revisions are mounted (`<root>/snap`).
    pub snap_mount_dir: PathBuf,
    /// Parent of per-update rollback workspaces.
    pub rollback_dir: PathBuf,
    /// Cache of measured boot assets.
    pub boot_assets_dir: PathBuf,
    /// Platform identification file.
    pub os_release: PathBuf,
}

impl Dirs {
    /// Layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            root: root.to_path_buf(),
            snap_mount_dir: root.join("snap"),
            rollback_dir: root.join("var/lib/snapd/rollback"),
            boot_assets_dir: root.join("var/lib/snapd/boot-assets"),
            os_release: root.join("etc/os-release"),
        }
    }

    /// Layout rooted at `$GADGETD_ROOT`, or `/` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the variable is set to an empty or relative path.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Layout rooted at the value `lookup` yields for [`ROOT_ENV`].
    ///
    /// # Errors
    ///
    /// Returns an error when the value is empty or relative.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        match lookup(ROOT_ENV) {
            None => Ok(Self::new("/")),
            Some(value) if value.is_empty() => {
                Err(ConfigError::invalid_env(ROOT_ENV, &value, "empty"))
            }
            Some(value) if !Path::new(&value).is_absolute() => {
                Err(ConfigError::invalid_env(ROOT_ENV, &value, "not_absolute"))
            }
            Some(value) => Ok(Self::new(value)),
        }
    }
}
