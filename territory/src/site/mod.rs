//! Sites and the registry that owns them.
//!
//! The partition pipeline only reads sites. The one write path,
//! [`SiteRegistry::update_location`], notifies [`LocationObserver`]s so that
//! derived artifacts can be flagged as stale.

mod error;
mod json;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DerivedCache;
use crate::BoxFuture;

pub use error::RegistryError;
pub use json::JsonSiteRegistry;

/// Dirty-flag reason recorded when a site moves.
pub const LOCATION_UPDATED_REASON: &str = "target-location-updated";

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SiteMeta>,
}

impl Site {
    pub fn new(id: i64, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id,
            name: name.into(),
            lat,
            lng,
            series: None,
            meta: None,
        }
    }

    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }
}

/// Descriptive metadata attached to a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Source of the sites to partition.
pub trait SiteRegistry: Send + Sync {
    /// Sites admitted by the registry's allow-list, sorted by id ascending.
    fn list_active_sites(&self) -> BoxFuture<'_, Result<Vec<Site>, RegistryError>>;

    /// Move a site. Returns the updated site.
    fn update_location(&self, id: i64, lat: f64, lng: f64)
        -> BoxFuture<'_, Result<Site, RegistryError>>;
}

/// Callback run after a successful location update.
///
/// Failures are logged by the registry and never reach the caller.
pub trait LocationObserver: Send + Sync {
    fn location_updated<'a>(&'a self, site: &'a Site) -> BoxFuture<'a, Result<(), String>>;
}

/// Marks every tier dirty when a site moves.
pub struct DirtyMarker {
    cache: Arc<DerivedCache>,
}

impl DirtyMarker {
    pub fn new(cache: Arc<DerivedCache>) -> Self {
        Self { cache }
    }
}

impl LocationObserver for DirtyMarker {
    fn location_updated<'a>(&'a self, site: &'a Site) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async move {
            debug!(site_id = site.id, "Site moved, marking partitions dirty");
            self.cache.mark_dirty(LOCATION_UPDATED_REASON).await;
            Ok(())
        })
    }
}
