//! Raw landmass acquisition and the per-tier merged landmass.
//!
//! [`LandmassSource`] downloads the national boundary once and keeps the
//! snapshot on disk. [`LandmassUnionBuilder`] merges its features into one
//! multipolygon, simplifies it at the tier's tolerance and persists the
//! result per tier.

mod error;
mod http;
mod source;
mod union;

pub use error::LandmassError;
pub use http::{HttpClient, MockHttpClient, ReqwestClient};
pub use source::{LandmassSource, RawLandmass};
pub use union::{union_features, LandmassUnion, LandmassUnionBuilder};
