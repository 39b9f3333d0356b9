//! Models and on-disk snap fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use gadgetd_snap::{Model, ModelGrade, Revision, SnapType};

/// Minimal valid pc gadget layout.
pub const PC_GADGET_YAML: &str = r"
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
          edition: 1
        content:
          - image: pc-core.img
      - name: EFI System
        type: EF,C12A7328-F81F-11D2-BA4B-00A0C93EC93B
        role: system-boot
        filesystem: vfat
        size: 50M
        update:
          edition: 1
        content:
          - source: grubx64.efi
            target: EFI/boot/grubx64.efi
";

/// Pre-UC20 model using the `pc` gadget.
#[must_use]
pub fn core_model() -> Model {
    Model::new("canonical", "pc-model", "pc", "pc-kernel").with_base("core18")
}

/// UC20 model with a grade, using the `pc` gadget.
#[must_use]
pub fn uc20_model() -> Model {
    Model::new("canonical", "pc-model-20", "pc", "pc-kernel")
        .with_base("core20")
        .with_grade(ModelGrade::Dangerous)
}

/// Write `meta/snap.yaml` for `instance_name` at `revision` under `snap_mount_dir`
/// and return the mount directory.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn write_snap_yaml(
    snap_mount_dir: &Path,
    instance_name: &str,
    revision: Revision,
    snap_type: SnapType,
) -> Result<PathBuf> {
    let mount_dir = snap_mount_dir
        .join(instance_name)
        .join(revision.to_string());
    let meta = mount_dir.join("meta");
    fs::create_dir_all(&meta)?;
    let name = gadgetd_snap::snap_name(instance_name);
    let kind = match snap_type {
        SnapType::App => "app",
        SnapType::Gadget => "gadget",
        SnapType::Kernel => "kernel",
        SnapType::Base => "base",
        SnapType::Os => "os",
        SnapType::Snapd => "snapd",
    };
    fs::write(
        meta.join("snap.yaml"),
        format!("name: {name}\nversion: '1.0'\ntype: {kind}\n"),
    )?;
    Ok(mount_dir)
}

/// Write a mounted gadget snap carrying `gadget_yaml` and return its mount directory.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn write_gadget_snap(
    snap_mount_dir: &Path,
    instance_name: &str,
    revision: Revision,
    gadget_yaml: &str,
) -> Result<PathBuf> {
    let mount_dir = write_snap_yaml(snap_mount_dir, instance_name, revision, SnapType::Gadget)?;
    fs::write(mount_dir.join("meta/gadget.yaml"), gadget_yaml)?;
    fs::write(mount_dir.join("grubx64.efi"), format!("grub for r{revision}"))?;
    Ok(mount_dir)
}
