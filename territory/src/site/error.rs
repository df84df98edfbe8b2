use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Site registry failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The registry file is not a JSON array of site records.
    #[error("invalid site registry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be encoded for saving.
    #[error("failed to encode site registry: {0}")]
    Encode(#[from] serde_json::Error),

    /// No site has this id.
    #[error("site {0} not found")]
    NotFound(i64),

    /// Latitude or longitude is not a finite number.
    #[error("invalid coordinates lat={lat} lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
}
