//! Download-once access to the raw national boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geo::MultiPolygon;
use tracing::{debug, info, instrument};

use super::error::LandmassError;
use super::http::HttpClient;
use crate::cache::artifact::{read_optional, write_atomic};
use crate::geometry::{feature_multi_polygon, parse_feature_collection};

/// Areal features of the raw boundary, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLandmass {
    pub features: Vec<MultiPolygon<f64>>,
}

impl RawLandmass {
    /// Decode a FeatureCollection snapshot.
    ///
    /// Features without areal geometry are skipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LandmassError> {
        let collection = parse_feature_collection(bytes)?;
        let total = collection.features.len();

        let features: Vec<_> = collection
            .features
            .iter()
            .filter_map(feature_multi_polygon)
            .collect();

        if features.len() < total {
            debug!(
                skipped = total - features.len(),
                "Skipped raw features without areal geometry"
            );
        }
        Ok(Self { features })
    }
}

/// Fetches the raw landmass, hitting the network at most once per snapshot.
pub struct LandmassSource {
    client: Arc<dyn HttpClient>,
    url: String,
    snapshot_path: PathBuf,
}

impl LandmassSource {
    pub fn new(client: Arc<dyn HttpClient>, url: impl Into<String>, snapshot_path: PathBuf) -> Self {
        Self {
            client,
            url: url.into(),
            snapshot_path,
        }
    }

    /// Path of the persisted raw snapshot.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Return the raw landmass.
    ///
    /// An existing snapshot is read from disk without network access.
    /// Otherwise the body is downloaded, persisted byte for byte, and parsed.
    /// Failures are not retried.
    #[instrument(skip(self), fields(snapshot = %self.snapshot_path.display()))]
    pub async fn fetch(&self) -> Result<RawLandmass, LandmassError> {
        let bytes = match read_optional(&self.snapshot_path)
            .await
            .map_err(|e| LandmassError::io(&self.snapshot_path, e))?
        {
            Some(bytes) => {
                debug!(bytes = bytes.len(), "Using cached landmass snapshot");
                bytes
            }
            None => {
                info!(url = %self.url, "Downloading landmass");
                let bytes = self.client.get(&self.url).await?;
                write_atomic(&self.snapshot_path, &bytes)
                    .await
                    .map_err(|e| LandmassError::io(&self.snapshot_path, e))?;
                info!(bytes = bytes.len(), "Landmass snapshot saved");
                bytes
            }
        };

        tokio::task::spawn_blocking(move || RawLandmass::from_bytes(&bytes))
            .await
            .map_err(|e| LandmassError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmass::MockHttpClient;
    use tempfile::TempDir;

    const RAW: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"nam":"A"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type":"Feature","properties":{"nam":"B"},"geometry":null},
        {"type":"Feature","properties":{"nam":"C"},"geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}},
        {"type":"Feature","properties":{"nam":"D"},"geometry":{"type":"MultiPolygon","coordinates":[[[[2,2],[3,2],[3,3],[2,3],[2,2]]]]}}
    ]}"#;

    #[test]
    fn test_from_bytes_skips_non_areal() {
        let raw = RawLandmass::from_bytes(RAW.as_bytes()).unwrap();
        assert_eq!(raw.features.len(), 2);
    }

    #[test]
    fn test_from_bytes_requires_collection() {
        let err = RawLandmass::from_bytes(br#"{"type":"Point","coordinates":[0,0]}"#).unwrap_err();
        assert!(matches!(err, LandmassError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_downloads_once_and_persists_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("japan.geojson");
        let client = Arc::new(MockHttpClient::ok(RAW.as_bytes().to_vec()));
        let source = LandmassSource::new(client.clone(), "http://example.test/raw", path.clone());

        let first = source.fetch().await.unwrap();
        let second = source.fetch().await.unwrap();

        assert_eq!(client.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&path).unwrap(), RAW.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_no_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("japan.geojson");
        let source = LandmassSource::new(
            Arc::new(MockHttpClient::failing("offline")),
            "http://example.test/raw",
            path.clone(),
        );

        assert!(matches!(source.fetch().await, Err(LandmassError::Http(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_existing_snapshot_skips_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("japan.geojson");
        std::fs::write(&path, RAW).unwrap();
        let client = Arc::new(MockHttpClient::failing("should not be called"));
        let source = LandmassSource::new(client.clone(), "http://example.test/raw", path);

        assert_eq!(source.fetch().await.unwrap().features.len(), 2);
        assert_eq!(client.calls(), 0);
    }
}
