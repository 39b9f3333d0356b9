//! Restart requests issued to the owning environment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of restart being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartType {
    /// Reboot the whole device.
    System,
}

/// A recorded restart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRequest {
    /// Requested restart kind.
    pub restart_type: RestartType,
    /// When the request was issued.
    pub requested_at: DateTime<Utc>,
}
