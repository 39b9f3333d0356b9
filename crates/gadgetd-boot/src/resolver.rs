//! Observer resolution contract.

use std::fmt;

use gadgetd_gadget::ContentObserver;
use gadgetd_snap::Model;

use crate::error::BootResult;

/// Successful outcomes of resolving an observer for a model. Errors are
/// reported separately through [`BootResult`].
pub enum ObserverResolution {
    /// A usable observer.
    Observer(Box<dyn ContentObserver>),
    /// The model does not use measured boot assets; proceed without an observer.
    NotApplicable,
}

impl ObserverResolution {
    /// Convert into an optional observer.
    #[must_use]
    pub fn into_observer(self) -> Option<Box<dyn ContentObserver>> {
        match self {
            Self::Observer(observer) => Some(observer),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Debug for ObserverResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observer(_) => f.write_str("Observer(..)"),
            Self::NotApplicable => f.write_str("NotApplicable"),
        }
    }
}

/// Builds content observers for trusted boot assets.
pub trait ObserverResolver: Send + Sync {
    /// Resolve an observer for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error when an observer applies to the model but cannot be set up.
    fn observer_for_model(&self, model: &Model) -> BootResult<ObserverResolution>;
}
