//! Loaders for the installed and the candidate gadget layouts.

use gadgetd_gadget::GadgetData;
use gadgetd_snap::{Model, SideInfo, SnapError, SnapReader};
use gadgetd_state::StateGuard;
use tracing::debug;

use crate::error::{DeviceStateError, DeviceStateResult, MetadataError};
use crate::snapsetup::SnapSetup;

fn gadget_data(
    reader: &dyn SnapReader,
    instance_name: &str,
    side_info: &SideInfo,
    model: &Model,
) -> Result<GadgetData, MetadataError> {
    let info = reader.read_info(instance_name, side_info)?;
    Ok(GadgetData::load(info.mount_dir, model)?)
}

/// Layout of the gadget driving the task, validated for `model`.
///
/// # Errors
///
/// Returns [`DeviceStateError::PendingGadget`] when metadata is missing or malformed.
pub fn load_pending(
    reader: &dyn SnapReader,
    setup: &SnapSetup,
    model: &Model,
) -> DeviceStateResult<GadgetData> {
    let snap = setup.instance_name();
    gadget_data(reader, &snap, &setup.side_info, model)
        .map_err(|source| DeviceStateError::PendingGadget { snap, source })
}

/// Layout of the gadget the device currently runs, or `None` while no gadget
/// has been recorded yet (first boot and seeding).
///
/// # Errors
///
/// Returns [`DeviceStateError::CurrentGadget`] when a recorded gadget cannot be read.
pub fn load_current(
    guard: &StateGuard<'_>,
    reader: &dyn SnapReader,
    ground: &Model,
) -> DeviceStateResult<Option<GadgetData>> {
    let name = ground.gadget_snap_name();
    let Some(snap_state) = guard.snap_state(name) else {
        debug!(snap = %name, "no gadget recorded in state");
        return Ok(None);
    };
    let snap = snap_state.instance_name(name);
    let Some(side_info) = snap_state.current_side_info() else {
        return Err(DeviceStateError::CurrentGadget {
            snap,
            source: MetadataError::Snap(SnapError::InvalidMetadata {
                field: "current",
                reason: "missing_revision",
                value: Some(snap_state.current.number().to_string()),
            }),
        });
    };
    gadget_data(reader, &snap, side_info, ground)
        .map(Some)
        .map_err(|source| DeviceStateError::CurrentGadget { snap, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use gadgetd_snap::{MountedSnapReader, Revision, SnapType};
    use gadgetd_state::{SnapState, State};
    use gadgetd_test_support::{PC_GADGET_YAML, core_model, write_gadget_snap};
    use tempfile::TempDir;

    #[test]
    fn current_gadget_is_absent_before_seeding() -> Result<()> {
        let root = TempDir::new()?;
        let reader = MountedSnapReader::new(root.path());
        let state = State::new();
        let guard = state.lock();
        assert!(load_current(&guard, &reader, &core_model())?.is_none());
        Ok(())
    }

    #[test]
    fn current_gadget_follows_snap_state() -> Result<()> {
        let root = TempDir::new()?;
        write_gadget_snap(root.path(), "pc", Revision::new(5), PC_GADGET_YAML)?;
        let reader = MountedSnapReader::new(root.path());
        let state = State::new();
        let mut guard = state.lock();
        guard.set_snap_state(
            "pc",
            SnapState::single(SnapType::Gadget, SideInfo::new("pc", Revision::new(5))),
        );
        let current = load_current(&guard, &reader, &core_model())?;
        assert_eq!(
            current.map(|data| data.root_dir),
            Some(reader.mount_dir("pc", Revision::new(5)))
        );
        Ok(())
    }

    #[test]
    fn pending_gadget_errors_name_the_snap() -> Result<()> {
        let root = TempDir::new()?;
        let reader = MountedSnapReader::new(root.path());
        let setup = SnapSetup::new(SideInfo::new("pc", Revision::new(2)), SnapType::Gadget);
        let result = load_pending(&reader, &setup, &core_model());
        assert!(matches!(
            result,
            Err(DeviceStateError::PendingGadget {
                ref snap,
                source: MetadataError::Snap(_),
            }) if snap == "pc"
        ));

        write_gadget_snap(root.path(), "pc", Revision::new(2), "volumes: {}\n")?;
        let result = load_pending(&reader, &setup, &core_model());
        assert!(matches!(
            result,
            Err(DeviceStateError::PendingGadget {
                source: MetadataError::Gadget(_),
                ..
            })
        ));
        Ok(())
    }
}
