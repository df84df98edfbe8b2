//! Voronoi partitioning of sites and clipping against the landmass.
//!
//! [`SitePartitioner`] returns one optional cell per input site, index
//! aligned with the input. [`LandClipper`] intersects each cell with the
//! landmass union and reports which sites made it into the collection and
//! why the others did not.

mod clip;
mod types;
mod voronoi;

pub use clip::LandClipper;
pub use types::{
    ClipReport, ClippedPartition, PartitionCollection, SkipReason, SkippedSite, VoronoiCell,
};
pub use voronoi::{BoundingRegion, SitePartitioner, SERVING_REGION};
