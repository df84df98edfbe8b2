//! Per-tier record of the last generation.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::partition::SkippedSite;
use crate::tier::QualityTier;

/// Contents of `clipped-polygons.<tier>.manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManifest {
    pub tier: QualityTier,
    /// Increments every time the tier is regenerated.
    pub version: u64,
    pub generated_at: String,
    /// Library version that produced the artifact.
    pub generator: String,
    /// Number of partitions in the collection.
    pub partitions: usize,
    pub skipped: Vec<SkippedSite>,
}

impl CacheManifest {
    /// Manifest following `previous`, stamped now.
    pub fn next(
        tier: QualityTier,
        previous: Option<&CacheManifest>,
        partitions: usize,
        skipped: Vec<SkippedSite>,
    ) -> Self {
        Self {
            tier,
            version: previous.map_or(1, |m| m.version + 1),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            generator: crate::VERSION.to_string(),
            partitions,
            skipped,
        }
    }
}
