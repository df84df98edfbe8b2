//! File-backed site registry.
//!
//! The file holds a JSON array of records:
//!
//! ```json
//! [{"id": 1, "name": "根室半島チャシ跡群", "lat": 43.32, "lng": 145.59,
//!   "series": "日本100名城", "meta": "{\"prefecture\":\"北海道\"}"}]
//! ```
//!
//! `meta` may be an object or a string holding a JSON object.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{LocationObserver, RegistryError, Site, SiteMeta, SiteRegistry};
use crate::cache::artifact::write_atomic;
use crate::BoxFuture;

/// On-disk record. Unknown fields are carried through saves.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SiteRecord {
    id: i64,
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<serde_json::Value>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl SiteRecord {
    fn to_site(&self) -> Site {
        Site {
            id: self.id,
            name: self.name.clone(),
            lat: self.lat,
            lng: self.lng,
            series: self.series.clone(),
            meta: self.parse_meta(),
        }
    }

    /// Malformed metadata is dropped with a warning rather than failing.
    fn parse_meta(&self) -> Option<SiteMeta> {
        let value = match &self.meta {
            None | Some(serde_json::Value::Null) => return None,
            Some(serde_json::Value::String(text)) => serde_json::from_str(text),
            Some(value) => serde_json::from_value(value.clone()),
        };
        match value {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(site_id = self.id, error = %e, "Failed to parse site meta");
                None
            }
        }
    }
}

/// Site registry stored in a JSON file.
pub struct JsonSiteRegistry {
    path: PathBuf,
    series: Vec<String>,
    observers: RwLock<Vec<Arc<dyn LocationObserver>>>,
    write_lock: Mutex<()>,
}

impl JsonSiteRegistry {
    /// Registry over `path` admitting the given series. An empty allow-list
    /// admits every record.
    pub fn new(path: impl Into<PathBuf>, series: Vec<String>) -> Self {
        Self {
            path: path.into(),
            series,
            observers: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register an observer for location updates.
    pub fn add_observer(&self, observer: Arc<dyn LocationObserver>) {
        self.observers.write().push(observer);
    }

    fn admits(&self, record: &SiteRecord) -> bool {
        self.series.is_empty()
            || record
                .series
                .as_ref()
                .is_some_and(|s| self.series.iter().any(|allowed| allowed == s))
    }

    async fn load_records(&self) -> Result<Vec<SiteRecord>, RegistryError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| RegistryError::Io {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save_records(&self, records: &[SiteRecord]) -> Result<(), RegistryError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|source| RegistryError::Io {
                path: self.path.clone(),
                source,
            })
    }

    async fn notify(&self, site: &Site) {
        let observers: Vec<_> = self.observers.read().clone();
        for observer in observers {
            if let Err(e) = observer.location_updated(site).await {
                warn!(site_id = site.id, error = %e, "Location observer failed");
            }
        }
    }
}

impl SiteRegistry for JsonSiteRegistry {
    fn list_active_sites(&self) -> BoxFuture<'_, Result<Vec<Site>, RegistryError>> {
        Box::pin(async move {
            let mut sites: Vec<Site> = self
                .load_records()
                .await?
                .iter()
                .filter(|r| self.admits(r))
                .map(SiteRecord::to_site)
                .collect();
            sites.sort_by_key(|s| s.id);
            Ok(sites)
        })
    }

    fn update_location(
        &self,
        id: i64,
        lat: f64,
        lng: f64,
    ) -> BoxFuture<'_, Result<Site, RegistryError>> {
        Box::pin(async move {
            if !(lat.is_finite() && lng.is_finite()) {
                return Err(RegistryError::InvalidCoordinates { lat, lng });
            }

            let site = {
                let _guard = self.write_lock.lock().await;
                let mut records = self.load_records().await?;
                let record = records
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(RegistryError::NotFound(id))?;
                record.lat = lat;
                record.lng = lng;
                let site = record.to_site();
                self.save_records(&records).await?;
                site
            };

            info!(site_id = id, lat, lng, "Site location updated");
            self.notify(&site).await;
            Ok(site)
        })
    }
}
