//! Trusted asset observer resolution.

use gadgetd_boot::{ObserverResolution, ObserverResolver};
use gadgetd_gadget::ContentObserver;
use gadgetd_snap::Model;
use tracing::debug;

use crate::error::{DeviceStateError, DeviceStateResult};

/// Observer for `model`, or `None` when observation does not apply to it.
///
/// # Errors
///
/// Returns [`DeviceStateError::Observer`] when the resolver fails.
pub fn resolve_observer(
    resolver: &dyn ObserverResolver,
    model: &Model,
) -> DeviceStateResult<Option<Box<dyn ContentObserver>>> {
    match resolver.observer_for_model(model) {
        Ok(ObserverResolution::Observer(observer)) => Ok(Some(observer)),
        Ok(ObserverResolution::NotApplicable) => {
            debug!(model = %model.reference(), "asset update observer not applicable");
            Ok(None)
        }
        Err(source) => Err(DeviceStateError::Observer {
            model: model.reference(),
            source,
        }),
    }
}
