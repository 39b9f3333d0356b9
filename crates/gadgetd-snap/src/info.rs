//! Snap revisions, side info and the metadata reader used to load gadget snaps.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SnapError, SnapResult};

const SNAP_YAML: &str = "meta/snap.yaml";

/// Snap revision. Store revisions are positive, locally installed ones negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(i32);

impl Revision {
    /// Wrap a raw revision number.
    #[must_use]
    pub const fn new(number: i32) -> Self {
        Self(number)
    }

    /// Raw revision number.
    #[must_use]
    pub const fn number(self) -> i32 {
        self.0
    }

    /// Whether the revision is unset (zero).
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Whether the revision was assigned locally rather than by the store.
    #[must_use]
    pub const fn is_local(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "x{}", self.0.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Type of a snap as declared in `snap.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapType {
    /// Regular application snap.
    #[default]
    App,
    /// Gadget snap owning the device boot layout.
    Gadget,
    /// Kernel snap.
    Kernel,
    /// Base snap.
    Base,
    /// Legacy core snap.
    Os,
    /// The snapd snap.
    Snapd,
}

/// Store-provided details for an installed snap revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SideInfo {
    /// Snap name without any instance key.
    #[serde(rename = "name")]
    pub real_name: String,
    /// Installed revision.
    pub revision: Revision,
    /// Store snap id, absent for locally installed snaps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_id: Option<String>,
    /// Channel the revision was fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl SideInfo {
    /// Side info for a named snap at a revision.
    #[must_use]
    pub fn new(real_name: impl Into<String>, revision: Revision) -> Self {
        Self {
            real_name: real_name.into(),
            revision,
            snap_id: None,
            channel: None,
        }
    }
}

/// Metadata of a mounted snap revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapInfo {
    /// Instance name (`<name>` or `<name>_<key>`).
    pub instance_name: String,
    /// Side info the metadata was read for.
    pub side_info: SideInfo,
    /// Declared snap type.
    pub snap_type: SnapType,
    /// Declared version string.
    pub version: String,
    /// Directory the revision is mounted at.
    pub mount_dir: PathBuf,
}

/// Reads snap metadata for an instance at a given revision.
pub trait SnapReader: Send + Sync {
    /// Read the metadata of `instance_name` at the revision in `side_info`.
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata is missing or malformed.
    fn read_info(&self, instance_name: &str, side_info: &SideInfo) -> SnapResult<SnapInfo>;
}

/// Snap name portion of an instance name.
#[must_use]
pub fn snap_name(instance_name: &str) -> &str {
    instance_name
        .split_once('_')
        .map_or(instance_name, |(name, _)| name)
}

#[derive(Debug, Deserialize)]
struct SnapYaml {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(rename = "type", default)]
    snap_type: SnapType,
}

/// Reader backed by snaps mounted at `<snap_mount_dir>/<instance>/<revision>`.
#[derive(Debug, Clone)]
pub struct MountedSnapReader {
    snap_mount_dir: PathBuf,
}

impl MountedSnapReader {
    /// Construct a reader rooted at the snap mount directory.
    #[must_use]
    pub fn new(snap_mount_dir: impl Into<PathBuf>) -> Self {
        Self {
            snap_mount_dir: snap_mount_dir.into(),
        }
    }

    /// Mount directory of an instance revision.
    #[must_use]
    pub fn mount_dir(&self, instance_name: &str, revision: Revision) -> PathBuf {
        self.snap_mount_dir
            .join(instance_name)
            .join(revision.to_string())
    }

    fn load_yaml(path: &Path) -> SnapResult<SnapYaml> {
        let raw = fs::read_to_string(path).map_err(|source| SnapError::io("read", path, source))?;
        serde_yaml::from_str(&raw).map_err(|source| SnapError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SnapReader for MountedSnapReader {
    fn read_info(&self, instance_name: &str, side_info: &SideInfo) -> SnapResult<SnapInfo> {
        if side_info.revision.is_unset() {
            return Err(SnapError::InvalidMetadata {
                field: "revision",
                reason: "unset",
                value: Some(instance_name.to_string()),
            });
        }

        let mount_dir = self.mount_dir(instance_name, side_info.revision);
        let yaml_path = mount_dir.join(SNAP_YAML);
        debug!(snap = instance_name, path = %yaml_path.display(), "reading snap metadata");
        let yaml = Self::load_yaml(&yaml_path)?;

        if yaml.name != snap_name(instance_name) {
            return Err(SnapError::InvalidMetadata {
                field: "name",
                reason: "name_mismatch",
                value: Some(yaml.name),
            });
        }

        Ok(SnapInfo {
            instance_name: instance_name.to_string(),
            side_info: side_info.clone(),
            snap_type: yaml.snap_type,
            version: yaml.version.unwrap_or_default(),
            mount_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn write_snap_yaml(root: &Path, instance: &str, revision: Revision, body: &str) -> Result<()> {
        let meta = root.join(instance).join(revision.to_string()).join("meta");
        fs::create_dir_all(&meta)?;
        fs::write(meta.join("snap.yaml"), body)?;
        Ok(())
    }

    #[test]
    fn revision_display_marks_local_revisions() {
        assert_eq!(Revision::new(42).to_string(), "42");
        assert_eq!(Revision::new(-3).to_string(), "x3");
        assert!(Revision::new(0).is_unset());
    }

    #[test]
    fn snap_name_strips_instance_key() {
        assert_eq!(snap_name("pc"), "pc");
        assert_eq!(snap_name("pc_test"), "pc");
    }

    #[test]
    fn reader_loads_gadget_metadata() -> Result<()> {
        let temp = TempDir::new()?;
        let revision = Revision::new(7);
        write_snap_yaml(
            temp.path(),
            "pc",
            revision,
            "name: pc\nversion: '20-1'\ntype: gadget\n",
        )?;

        let reader = MountedSnapReader::new(temp.path());
        let info = reader.read_info("pc", &SideInfo::new("pc", revision))?;
        assert_eq!(info.snap_type, SnapType::Gadget);
        assert_eq!(info.version, "20-1");
        assert_eq!(info.mount_dir, temp.path().join("pc").join("7"));
        Ok(())
    }

    #[test]
    fn reader_rejects_mismatched_names() -> Result<()> {
        let temp = TempDir::new()?;
        let revision = Revision::new(1);
        write_snap_yaml(temp.path(), "pc", revision, "name: other\ntype: gadget\n")?;

        let reader = MountedSnapReader::new(temp.path());
        let err = reader
            .read_info("pc", &SideInfo::new("pc", revision))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected name mismatch"))?;
        assert!(matches!(
            err,
            SnapError::InvalidMetadata {
                field: "name",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn reader_reports_missing_metadata() -> Result<()> {
        let temp = TempDir::new()?;
        let reader = MountedSnapReader::new(temp.path());
        let result = reader.read_info("pc", &SideInfo::new("pc", Revision::new(3)));
        assert!(matches!(result, Err(SnapError::Io { operation: "read", .. })));
        Ok(())
    }

    #[test]
    fn reader_rejects_unset_revision() {
        let reader = MountedSnapReader::new("/nonexistent");
        let result = reader.read_info("pc", &SideInfo::new("pc", Revision::new(0)));
        assert!(matches!(
            result,
            Err(SnapError::InvalidMetadata {
                field: "revision",
                ..
            })
        ));
    }
}
