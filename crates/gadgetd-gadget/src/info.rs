//! `gadget.yaml` model and model-bound validation.
//!
//! # Design
//! - Deserialize only the parts of the layout the update pipeline reasons
//!   about: volumes, structures, their content and update editions.
//! - Validation is performed against the model the gadget is resolved for,
//!   since some roles only exist on graded (recovery capable) models.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use gadgetd_snap::Model;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GadgetError, GadgetResult};

const GADGET_YAML: &str = "meta/gadget.yaml";
const KNOWN_BOOTLOADERS: &[&str] = &["grub", "u-boot", "android-boot", "lk", "piboot"];
const ALWAYS_ALLOWED_ROLES: &[&str] = &["mbr", "system-boot", "system-data"];
const GRADED_ONLY_ROLES: &[&str] = &["system-seed", "system-save"];

/// Structure or content size in bytes. Accepts plain integers or `K`/`M`/`G`
/// suffixed strings in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSize", into = "u64")]
pub struct Size(u64);

impl Size {
    /// Size in bytes.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl From<Size> for u64 {
    fn from(size: Size) -> Self {
        size.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Text(String),
}

impl TryFrom<RawSize> for Size {
    type Error = String;

    fn try_from(raw: RawSize) -> Result<Self, Self::Error> {
        let text = match raw {
            RawSize::Bytes(bytes) => return Ok(Self(bytes)),
            RawSize::Text(text) => text,
        };
        let trimmed = text.trim();
        let (digits, multiplier) = match trimmed.chars().last() {
            Some('K') => (&trimmed[..trimmed.len() - 1], 1_u64 << 10),
            Some('M') => (&trimmed[..trimmed.len() - 1], 1_u64 << 20),
            Some('G') => (&trimmed[..trimmed.len() - 1], 1_u64 << 30),
            _ => (trimmed, 1),
        };
        digits
            .parse::<u64>()
            .ok()
            .and_then(|value| value.checked_mul(multiplier))
            .map(Self)
            .ok_or_else(|| format!("invalid size {text:?}"))
    }
}

/// One content entry of a structure: either a file tree copy or a raw image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeContent {
    /// Source path inside the gadget for filesystem content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Target path inside the structure filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Raw image inside the gadget for bare structures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Offset of a raw image within the structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Size>,
}

/// Update metadata of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeUpdate {
    /// Monotonic edition; a structure is updated when the edition grows.
    #[serde(default)]
    pub edition: u32,
    /// Paths preserved across updates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserve: Vec<String>,
}

/// A partition or bare region of a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeStructure {
    /// Structure name, unique within its volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Role of the structure in the boot layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Partition type (GUID, MBR type or `bare`).
    #[serde(rename = "type")]
    pub structure_type: String,
    /// Structure size.
    pub size: Size,
    /// Explicit offset within the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Size>,
    /// Filesystem to create, when the structure carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<String>,
    /// Content written into the structure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<VolumeContent>,
    /// Update metadata.
    #[serde(default)]
    pub update: VolumeUpdate,
}

impl VolumeStructure {
    /// Structure name or `"<unnamed>"` for logging.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// A physical volume described by the gadget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Partitioning schema (`gpt` or `mbr`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Bootloader managing this volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootloader: Option<String>,
    /// Disk identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Structures in declaration order.
    #[serde(rename = "structure", default)]
    pub structures: Vec<VolumeStructure>,
}

/// Parsed `gadget.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetInfo {
    /// Volumes keyed by name.
    pub volumes: BTreeMap<String, Volume>,
}

impl GadgetInfo {
    /// Parse and validate a `gadget.yaml` document for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the layout is invalid for the model.
    pub fn from_yaml(raw: &str, path: &Path, model: &Model) -> GadgetResult<Self> {
        let info: Self = serde_yaml::from_str(raw).map_err(|source| GadgetError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        info.validate(model)?;
        Ok(info)
    }

    /// Validate the layout against the model it is resolved for.
    ///
    /// # Errors
    ///
    /// Returns `GadgetError::InvalidLayout` describing the first violation.
    pub fn validate(&self, model: &Model) -> GadgetResult<()> {
        if self.volumes.is_empty() {
            return Err(GadgetError::invalid_layout(None, "volumes", "empty", None));
        }

        let mut bootloaders = 0_usize;
        for (name, volume) in &self.volumes {
            if let Some(bootloader) = volume.bootloader.as_deref() {
                if !KNOWN_BOOTLOADERS.contains(&bootloader) {
                    return Err(GadgetError::invalid_layout(
                        Some(name),
                        "bootloader",
                        "unknown",
                        Some(bootloader),
                    ));
                }
                bootloaders += 1;
            }
            validate_structures(name, volume, model)?;
        }

        match bootloaders {
            0 if !model.classic => Err(GadgetError::invalid_layout(
                None,
                "bootloader",
                "missing",
                None,
            )),
            0 | 1 => Ok(()),
            _ => Err(GadgetError::invalid_layout(
                None,
                "bootloader",
                "multiple",
                None,
            )),
        }
    }

    /// Look up a structure by volume and name.
    #[must_use]
    pub fn structure(&self, volume: &str, name: &str) -> Option<&VolumeStructure> {
        self.volumes
            .get(volume)?
            .structures
            .iter()
            .find(|structure| structure.name.as_deref() == Some(name))
    }
}

fn validate_structures(volume_name: &str, volume: &Volume, model: &Model) -> GadgetResult<()> {
    let mut seen = HashSet::new();
    for structure in &volume.structures {
        if let Some(name) = structure.name.as_deref()
            && !seen.insert(name)
        {
            return Err(GadgetError::invalid_layout(
                Some(volume_name),
                "name",
                "duplicate",
                Some(name),
            ));
        }

        if let Some(role) = structure.role.as_deref() {
            let graded_only = GRADED_ONLY_ROLES.contains(&role);
            if !graded_only && !ALWAYS_ALLOWED_ROLES.contains(&role) {
                return Err(GadgetError::invalid_layout(
                    Some(volume_name),
                    "role",
                    "unknown",
                    Some(role),
                ));
            }
            if graded_only && !model.has_grade() {
                return Err(GadgetError::invalid_layout(
                    Some(volume_name),
                    "role",
                    "requires_model_grade",
                    Some(role),
                ));
            }
        }

        for content in &structure.content {
            let file_copy = content.source.is_some() && content.target.is_some();
            let raw_image = content.image.is_some();
            if file_copy == raw_image {
                return Err(GadgetError::invalid_layout(
                    Some(volume_name),
                    "content",
                    "ambiguous_entry",
                    structure.name.as_deref(),
                ));
            }
        }
    }
    Ok(())
}

/// Read `meta/gadget.yaml` from a mounted gadget and validate it for `model`.
///
/// # Errors
///
/// Returns an error when the file cannot be read, decoded or validated.
pub fn read_info(gadget_root: &Path, model: &Model) -> GadgetResult<GadgetInfo> {
    let path = gadget_root.join(GADGET_YAML);
    debug!(path = %path.display(), model = %model.reference(), "reading gadget metadata");
    let raw = fs::read_to_string(&path).map_err(|source| GadgetError::Io {
        operation: "read",
        path: path.clone(),
        source,
    })?;
    GadgetInfo::from_yaml(&raw, &path, model)
}

/// Gadget layout bound to its content tree and the model it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GadgetData {
    /// Parsed layout.
    pub info: GadgetInfo,
    /// Root of the gadget content tree.
    pub root_dir: PathBuf,
    /// Model the layout was validated against.
    pub model: Model,
}

impl GadgetData {
    /// Load the gadget mounted at `root_dir` for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error when `gadget.yaml` cannot be read or validated.
    pub fn load(root_dir: impl Into<PathBuf>, model: &Model) -> GadgetResult<Self> {
        let root_dir = root_dir.into();
        let info = read_info(&root_dir, model)?;
        Ok(Self {
            info,
            root_dir,
            model: model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use gadgetd_snap::ModelGrade;
    use tempfile::TempDir;

    const PC_GADGET: &str = r"
volumes:
  pc:
    schema: gpt
    bootloader: grub
    structure:
      - name: mbr
        type: mbr
        role: mbr
        size: 440
        content:
          - image: pc-boot.img
      - name: BIOS Boot
        type: DA,21686148-6449-6E6F-744E-656564454649
        size: 1M
        offset: 1M
        update:
          edition: 2
        content:
          - image: pc-core.img
      - name: EFI System
        type: EF,C12A7328-F81F-11D2-BA4B-00A0C93EC93B
        filesystem: vfat
        size: 50M
        role: system-boot
        content:
          - source: grubx64.efi
            target: EFI/boot/grubx64.efi
";

    fn core_model() -> Model {
        Model::new("canonical", "pc", "pc", "pc-kernel")
    }

    #[test]
    fn parses_sizes_with_suffixes() -> Result<()> {
        let info = GadgetInfo::from_yaml(PC_GADGET, Path::new("gadget.yaml"), &core_model())?;
        let bios = info
            .structure("pc", "BIOS Boot")
            .ok_or_else(|| anyhow::anyhow!("missing BIOS Boot"))?;
        assert_eq!(bios.size.bytes(), 1 << 20);
        assert_eq!(bios.offset.map(Size::bytes), Some(1 << 20));
        assert_eq!(bios.update.edition, 2);
        Ok(())
    }

    #[test]
    fn rejects_invalid_size_strings() {
        assert!(Size::try_from(RawSize::Text("12Q".into())).is_err());
        assert!(Size::try_from(RawSize::Text("M".into())).is_err());
        assert_eq!(Size::try_from(RawSize::Text("4K".into())), Ok(Size(4096)));
    }

    #[test]
    fn seed_role_requires_graded_model() -> Result<()> {
        let yaml = r"
volumes:
  pc:
    bootloader: grub
    structure:
      - name: ubuntu-seed
        role: system-seed
        type: EF,C12A7328-F81F-11D2-BA4B-00A0C93EC93B
        size: 1200M
";
        let path = Path::new("gadget.yaml");
        let err = GadgetInfo::from_yaml(yaml, path, &core_model())
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected grade violation"))?;
        assert!(matches!(
            err,
            GadgetError::InvalidLayout {
                reason: "requires_model_grade",
                ..
            }
        ));

        let graded = core_model().with_grade(ModelGrade::Signed);
        GadgetInfo::from_yaml(yaml, path, &graded)?;
        Ok(())
    }

    #[test]
    fn rejects_missing_and_duplicate_bootloaders() {
        let path = Path::new("gadget.yaml");
        let missing = "volumes:\n  pc:\n    structure: []\n";
        assert!(matches!(
            GadgetInfo::from_yaml(missing, path, &core_model()),
            Err(GadgetError::InvalidLayout {
                reason: "missing",
                ..
            })
        ));

        let duplicate = "volumes:\n  a:\n    bootloader: grub\n  b:\n    bootloader: u-boot\n";
        assert!(matches!(
            GadgetInfo::from_yaml(duplicate, path, &core_model()),
            Err(GadgetError::InvalidLayout {
                reason: "multiple",
                ..
            })
        ));
    }

    #[test]
    fn classic_models_tolerate_missing_bootloader() -> Result<()> {
        let mut model = core_model();
        model.classic = true;
        GadgetInfo::from_yaml("volumes:\n  pc:\n    structure: []\n", Path::new("g"), &model)?;
        Ok(())
    }

    #[test]
    fn rejects_duplicate_structure_names() {
        let yaml = r"
volumes:
  pc:
    bootloader: u-boot
    structure:
      - name: boot
        type: bare
        size: 1M
      - name: boot
        type: bare
        size: 1M
";
        assert!(matches!(
            GadgetInfo::from_yaml(yaml, Path::new("g"), &core_model()),
            Err(GadgetError::InvalidLayout {
                reason: "duplicate",
                ..
            })
        ));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = GadgetInfo::from_yaml("volumes: [", Path::new("g"), &core_model());
        assert!(matches!(result, Err(GadgetError::Yaml { .. })));
    }

    #[test]
    fn gadget_data_loads_from_mounted_tree() -> Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir_all(temp.path().join("meta"))?;
        fs::write(temp.path().join("meta/gadget.yaml"), PC_GADGET)?;

        let data = GadgetData::load(temp.path(), &core_model())?;
        assert_eq!(data.root_dir, temp.path());
        assert_eq!(data.model, core_model());
        assert_eq!(data.info.volumes["pc"].structures.len(), 3);
        Ok(())
    }

    #[test]
    fn read_info_reports_missing_metadata() -> Result<()> {
        let temp = TempDir::new()?;
        let result = read_info(temp.path(), &core_model());
        assert!(matches!(result, Err(GadgetError::Io { operation: "read", .. })));
        Ok(())
    }
}
