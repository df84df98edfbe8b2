//! Fixed artifact names inside the cache directory.

use std::path::{Path, PathBuf};

use crate::tier::QualityTier;

/// Raw landmass snapshot.
pub const RAW_LANDMASS_FILE: &str = "japan.geojson";

/// Locates every persisted artifact under one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    directory: PathBuf,
}

impl ArtifactPaths {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `japan.geojson`
    pub fn raw(&self) -> PathBuf {
        self.directory.join(RAW_LANDMASS_FILE)
    }

    /// `japan-union.<tier>.geojson`
    pub fn union(&self, tier: QualityTier) -> PathBuf {
        self.directory.join(format!("japan-union.{}.geojson", tier))
    }

    /// `clipped-polygons.<tier>.geojson`
    pub fn collection(&self, tier: QualityTier) -> PathBuf {
        self.directory
            .join(format!("clipped-polygons.{}.geojson", tier))
    }

    /// `clipped-polygons.<tier>.dirty.json`
    pub fn dirty_flag(&self, tier: QualityTier) -> PathBuf {
        self.directory
            .join(format!("clipped-polygons.{}.dirty.json", tier))
    }

    /// `clipped-polygons.<tier>.manifest.json`
    pub fn manifest(&self, tier: QualityTier) -> PathBuf {
        self.directory
            .join(format!("clipped-polygons.{}.manifest.json", tier))
    }
}
