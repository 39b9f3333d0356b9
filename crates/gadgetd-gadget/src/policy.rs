//! Structure update policies consulted by the update algorithm.

use serde::{Deserialize, Serialize};

use crate::info::VolumeStructure;

/// Decides which structures an update is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Update a structure only when its edition increases.
    #[default]
    Default,
    /// Update every structure; used when the device changes model.
    Remodel,
}

impl UpdatePolicy {
    /// Whether the structure `to` should replace `from`.
    #[must_use]
    pub const fn should_update(self, from: &VolumeStructure, to: &VolumeStructure) -> bool {
        match self {
            Self::Default => to.update.edition > from.update.edition,
            Self::Remodel => true,
        }
    }

    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Remodel => "remodel",
        }
    }
}
