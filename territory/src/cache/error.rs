use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::GeometryError;
use crate::landmass::LandmassError;
use crate::site::RegistryError;

/// Failures reading or writing cache artifacts.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A persisted collection is not a valid FeatureCollection.
    #[error("corrupt artifact {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: GeometryError,
    },

    /// A manifest could not be decoded.
    #[error("corrupt manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode artifact: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cache task failed: {0}")]
    Task(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failed attempt to produce a tier's collection.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Landmass(#[from] LandmassError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The blocking partition task panicked or was cancelled.
    #[error("generation task failed: {0}")]
    Task(String),

    /// A concurrent generation this caller waited on failed.
    #[error("concurrent generation failed: {0}")]
    Coalesced(String),
}
