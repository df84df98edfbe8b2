use std::fmt;

use geo::MultiPolygon;
use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{
    feature_collection, feature_multi_polygon, multi_polygon_feature, parse_feature_collection,
    GeometryError,
};

/// Voronoi cell for the site at `site_index`; `None` when degenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    pub site_index: usize,
    pub polygon: Option<MultiPolygon<f64>>,
}

/// A cell clipped to the landmass and tagged with its site.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedPartition {
    pub site_id: i64,
    pub site_name: String,
    pub polygon: MultiPolygon<f64>,
}

/// Ordered partitions for one tier.
///
/// Holds a subset of the input sites; each site appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionCollection {
    pub partitions: Vec<ClippedPartition>,
}

impl PartitionCollection {
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Site ids in collection order.
    pub fn site_ids(&self) -> Vec<i64> {
        self.partitions.iter().map(|p| p.site_id).collect()
    }

    /// Encode as a GeoJSON FeatureCollection with `targetId` / `targetName`
    /// properties.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let features = self
            .partitions
            .iter()
            .map(|p| {
                let mut properties = JsonObject::new();
                properties.insert("targetId".into(), p.site_id.into());
                properties.insert("targetName".into(), p.site_name.clone().into());
                multi_polygon_feature(&p.polygon, properties)
            })
            .collect();
        serde_json::to_vec(&feature_collection(features))
    }

    /// Decode a persisted collection.
    ///
    /// Features missing `targetId` or areal geometry are dropped with a warning.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        let collection = parse_feature_collection(bytes)?;
        let partitions = collection
            .features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let site_id = feature.property("targetId").and_then(|v| v.as_i64());
                let polygon = feature_multi_polygon(feature);
                match (site_id, polygon) {
                    (Some(site_id), Some(polygon)) => Some(ClippedPartition {
                        site_id,
                        site_name: feature
                            .property("targetName")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        polygon,
                    }),
                    _ => {
                        warn!(index, "Dropping malformed feature from persisted collection");
                        None
                    }
                }
            })
            .collect();
        Ok(Self { partitions })
    }
}

/// Why a site is absent from the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The site had no Voronoi cell (coincident or invalid coordinates).
    DegenerateCell,
    /// The cell does not overlap the landmass.
    EmptyIntersection,
    /// The boolean-ops engine failed on this cell.
    GeometryError(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DegenerateCell => write!(f, "degenerate cell"),
            SkipReason::EmptyIntersection => write!(f, "empty intersection"),
            SkipReason::GeometryError(msg) => write!(f, "geometry error: {}", msg),
        }
    }
}

/// A site excluded from the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSite {
    pub site_id: i64,
    pub site_name: String,
    pub reason: SkipReason,
}

/// Outcome of clipping: what was included and what was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipReport {
    pub included: PartitionCollection,
    pub skipped: Vec<SkippedSite>,
}
