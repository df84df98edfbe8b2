//! Advisory "may be stale" markers.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Contents of `clipped-polygons.<tier>.dirty.json`.
///
/// Informational only: a flag never causes regeneration on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyFlag {
    pub reason: String,
    /// RFC 3339 UTC timestamp with millisecond precision.
    #[serde(rename = "dirtyAt")]
    pub dirty_at: String,
}

impl DirtyFlag {
    /// A flag stamped with the current time.
    pub fn now(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            dirty_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
