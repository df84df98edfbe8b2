//! Territory - land-clipped Voronoi partitions around points of interest
//!
//! This library derives one region per site by partitioning a fixed bounding
//! region with a Voronoi diagram and clipping every cell against a merged
//! national landmass. Derived artifacts are persisted per quality tier and
//! served over HTTP with weak, metadata-based cache validators.
//!
//! # Pipeline
//!
//! ```text
//! LandmassSource ──► LandmassUnionBuilder ──┐
//!   (raw snapshot)     (union + simplify)   │
//!                                           ▼
//! SiteRegistry ─────► SitePartitioner ──► LandClipper ──► DerivedCache ──► serve
//!   (sorted sites)      (Voronoi cells)    (intersect)     (per tier)     (ETag/304)
//! ```

pub mod cache;
pub mod config;
pub mod geometry;
pub mod landmass;
pub mod logging;
pub mod partition;
pub mod prewarm;
pub mod serve;
pub mod site;
pub mod tier;

use std::future::Future;
use std::pin::Pin;

/// Library version, also recorded in cache manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed future used by the dyn-compatible async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use tier::QualityTier;
