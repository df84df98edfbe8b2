//! Persisted artifacts and the per-tier derived cache.
//!
//! Every artifact lives under one directory (see [`ArtifactPaths`]) and is
//! written atomically. [`DerivedCache`] orchestrates generation of the
//! clipped collections and owns invalidation.

pub mod artifact;
mod derived;
mod dirty;
mod error;
mod lease;
mod manifest;
mod paths;

pub use artifact::ArtifactMetadata;
pub use derived::{CacheStatus, DerivedCache};
pub use dirty::DirtyFlag;
pub use error::{CacheError, GenerationError};
pub use lease::{GenerationLease, LeaseStats};
pub use manifest::CacheManifest;
pub use paths::{ArtifactPaths, RAW_LANDMASS_FILE};
