use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::GeometryError;
use crate::tier::QualityTier;

/// Failures while obtaining the raw landmass or its union.
#[derive(Debug, Error)]
pub enum LandmassError {
    /// Network failure or non-success HTTP status.
    #[error("landmass download failed: {0}")]
    Http(String),

    /// Snapshot or union artifact could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The data is not the GeoJSON we expect.
    #[error("failed to parse landmass data: {0}")]
    Parse(#[from] GeometryError),

    /// A union artifact could not be encoded.
    #[error("failed to encode union artifact: {0}")]
    Encode(#[from] serde_json::Error),

    /// The raw landmass has no areal features.
    #[error("landmass contains no areal features")]
    Empty,

    /// A persisted union artifact carries no usable geometry.
    #[error("union artifact for tier {0} has no areal geometry")]
    InvalidUnion(QualityTier),

    /// A blocking geometry task panicked or was cancelled.
    #[error("landmass task failed: {0}")]
    Task(String),
}

impl LandmassError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
