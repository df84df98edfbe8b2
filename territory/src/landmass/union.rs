//! Merged, simplified landmass per quality tier.

use std::path::PathBuf;

use geo::{Area, BooleanOps, MultiPolygon, Polygon, Simplify};
use geojson::JsonObject;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use super::error::LandmassError;
use super::source::LandmassSource;
use crate::cache::artifact::{read_optional, write_atomic};
use crate::cache::ArtifactPaths;
use crate::config::UnionSettings;
use crate::geometry::{feature_multi_polygon, multi_polygon_feature, parse_feature};
use crate::tier::QualityTier;

/// The landmass merged into one multipolygon for a tier.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmassUnion {
    pub tier: QualityTier,
    pub polygon: MultiPolygon<f64>,
    pub tolerance: f64,
}

impl LandmassUnion {
    /// Encode as a GeoJSON Feature with `tier` and `tolerance` properties.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LandmassError> {
        let mut properties = JsonObject::new();
        properties.insert("tier".into(), self.tier.as_str().into());
        properties.insert("tolerance".into(), self.tolerance.into());
        let feature = multi_polygon_feature(&self.polygon, properties);
        Ok(serde_json::to_vec(&feature)?)
    }

    /// Decode a persisted union artifact.
    ///
    /// A missing `tolerance` property decodes as `NaN`, which never matches
    /// a configured value.
    pub fn from_bytes(tier: QualityTier, bytes: &[u8]) -> Result<Self, LandmassError> {
        let feature = parse_feature(bytes)?;
        let polygon = feature_multi_polygon(&feature).ok_or(LandmassError::InvalidUnion(tier))?;
        let tolerance = feature
            .property("tolerance")
            .and_then(|v| v.as_f64())
            .unwrap_or(f64::NAN);
        Ok(Self {
            tier,
            polygon,
            tolerance,
        })
    }
}

/// Merge features with an order-preserving pairwise reduction.
///
/// Adjacent pairs are unioned in parallel, level by level, so the result
/// depends only on the input order.
pub fn union_features(features: Vec<MultiPolygon<f64>>) -> Option<MultiPolygon<f64>> {
    let mut level = features;
    while level.len() > 1 {
        level = level
            .par_chunks(2)
            .map(|pair| match pair {
                [a, b] => a.union(b),
                _ => pair[0].clone(),
            })
            .collect();
    }
    level.pop()
}

/// Simplify and drop polygons that collapse to nothing.
fn simplify_landmass(polygon: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    let simplified = polygon.simplify(&tolerance);
    MultiPolygon::new(
        simplified
            .into_iter()
            .filter(|p: &Polygon<f64>| p.exterior().0.len() >= 4 && p.unsigned_area() > 0.0)
            .collect(),
    )
}

/// Builds and persists the per-tier landmass union.
pub struct LandmassUnionBuilder {
    source: LandmassSource,
    paths: ArtifactPaths,
    settings: UnionSettings,
}

impl LandmassUnionBuilder {
    pub fn new(source: LandmassSource, paths: ArtifactPaths, settings: UnionSettings) -> Self {
        Self {
            source,
            paths,
            settings,
        }
    }

    /// Path of the union artifact for `tier`.
    pub fn artifact_path(&self, tier: QualityTier) -> PathBuf {
        self.paths.union(tier)
    }

    /// Return the union for `tier`, building it on first use.
    ///
    /// An existing artifact is returned unchanged even when the configured
    /// tolerance has since changed.
    #[instrument(skip(self), fields(tier = %tier))]
    pub async fn build(&self, tier: QualityTier) -> Result<LandmassUnion, LandmassError> {
        let path = self.artifact_path(tier);
        let tolerance = self.settings.tolerance(tier);

        if let Some(bytes) = read_optional(&path)
            .await
            .map_err(|e| LandmassError::io(&path, e))?
        {
            let union = tokio::task::spawn_blocking(move || LandmassUnion::from_bytes(tier, &bytes))
                .await
                .map_err(|e| LandmassError::Task(e.to_string()))??;
            if union.tolerance != tolerance {
                warn!(
                    persisted = union.tolerance,
                    configured = tolerance,
                    path = %path.display(),
                    "Union artifact was built with a different tolerance; remove it to rebuild"
                );
            }
            return Ok(union);
        }

        let raw = self.source.fetch().await?;
        let feature_count = raw.features.len();
        info!(features = feature_count, tolerance, "Building landmass union");

        let (union, bytes) = tokio::task::spawn_blocking(move || {
            let merged = union_features(raw.features).ok_or(LandmassError::Empty)?;
            let polygon = simplify_landmass(&merged, tolerance);
            if polygon.0.is_empty() {
                return Err(LandmassError::Empty);
            }
            let union = LandmassUnion {
                tier,
                polygon,
                tolerance,
            };
            let bytes = union.to_bytes()?;
            Ok((union, bytes))
        })
        .await
        .map_err(|e| LandmassError::Task(e.to_string()))??;

        write_atomic(&path, &bytes)
            .await
            .map_err(|e| LandmassError::io(&path, e))?;
        info!(
            polygons = union.polygon.0.len(),
            bytes = bytes.len(),
            "Landmass union saved"
        );
        Ok(union)
    }
}
