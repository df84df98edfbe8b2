//! Per-tier persisted partition collections.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn, Instrument};

use super::artifact::{read_optional, remove_if_exists, stat, write_atomic, ArtifactMetadata};
use super::dirty::DirtyFlag;
use super::error::{CacheError, GenerationError};
use super::lease::{GenerationLease, LeaseStats, LeaseTicket};
use super::manifest::CacheManifest;
use super::paths::ArtifactPaths;
use crate::landmass::LandmassUnionBuilder;
use crate::partition::{LandClipper, PartitionCollection, SitePartitioner};
use crate::serve::WeakValidator;
use crate::site::{Site, SiteRegistry};
use crate::tier::QualityTier;

/// Snapshot of a tier's artifacts for `territory cache status`.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub tier: QualityTier,
    pub collection: Option<ArtifactMetadata>,
    /// ETag the server would send for the collection.
    pub validator: Option<WeakValidator>,
    pub union_present: bool,
    pub raw_present: bool,
    pub manifest: Option<CacheManifest>,
    pub dirty: Option<DirtyFlag>,
}

/// Owns the derived collections and the pipeline that produces them.
///
/// A persisted collection is served as is until it is removed; dirty flags
/// never trigger regeneration.
///
/// Clones share the lease and the run counter.
#[derive(Clone)]
pub struct DerivedCache {
    paths: ArtifactPaths,
    union_builder: Arc<LandmassUnionBuilder>,
    partitioner: SitePartitioner,
    clipper: LandClipper,
    lease: Arc<GenerationLease>,
    pipeline_runs: Arc<AtomicU64>,
}

impl DerivedCache {
    pub fn new(paths: ArtifactPaths, union_builder: LandmassUnionBuilder) -> Self {
        Self {
            paths,
            union_builder: Arc::new(union_builder),
            partitioner: SitePartitioner::default(),
            clipper: LandClipper::new(),
            lease: Arc::new(GenerationLease::new()),
            pipeline_runs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Use a different partitioner (bounding region).
    pub fn with_partitioner(mut self, partitioner: SitePartitioner) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Number of times the union/partition/clip pipeline has run.
    pub fn pipeline_runs(&self) -> u64 {
        self.pipeline_runs.load(Ordering::SeqCst)
    }

    pub fn lease_stats(&self) -> LeaseStats {
        self.lease.stats()
    }

    /// Raw bytes of the persisted collection, if any.
    pub async fn read_bytes(&self, tier: QualityTier) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.paths.collection(tier);
        read_optional(&path)
            .await
            .map_err(|e| CacheError::io(&path, e))
    }

    /// The persisted collection, without any staleness check.
    pub async fn read(&self, tier: QualityTier) -> Result<Option<PartitionCollection>, CacheError> {
        let Some(bytes) = self.read_bytes(tier).await? else {
            return Ok(None);
        };
        let path = self.paths.collection(tier);
        let collection =
            tokio::task::spawn_blocking(move || PartitionCollection::from_bytes(&bytes))
                .await
                .map_err(|e| CacheError::Task(e.to_string()))?
                .map_err(|source| CacheError::Corrupt { path, source })?;
        Ok(Some(collection))
    }

    /// Produce the collection for `tier` from `sites`.
    ///
    /// Returns the persisted collection when one exists. Concurrent callers
    /// for the same tier share one pipeline run. The run is a detached task:
    /// dropping this future does not cancel it, and waiters still receive
    /// its result.
    #[instrument(skip(self, sites), fields(tier = %tier, sites = sites.len()))]
    pub async fn generate(
        &self,
        tier: QualityTier,
        sites: Vec<Site>,
    ) -> Result<Arc<PartitionCollection>, GenerationError> {
        if let Some(existing) = self.read(tier).await? {
            debug!("Collection already persisted");
            return Ok(Arc::new(existing));
        }

        match self.lease.acquire(tier) {
            LeaseTicket::Waiter(waiter) => waiter.wait().await.map_err(GenerationError::Coalesced),
            LeaseTicket::Owner(owner) => {
                let cache = self.clone();
                tokio::spawn(async move {
                    let result = cache.run_pipeline(tier, sites).await;
                    owner.complete(match &result {
                        Ok(collection) => Ok(Arc::clone(collection)),
                        Err(e) => Err(e.to_string()),
                    });
                    result
                }
                .in_current_span())
                .await
                .map_err(|e| GenerationError::Task(e.to_string()))?
            }
        }
    }

    /// Return the persisted collection, loading sites and generating on miss.
    pub async fn ensure(
        &self,
        tier: QualityTier,
        registry: &dyn SiteRegistry,
    ) -> Result<Arc<PartitionCollection>, GenerationError> {
        if let Some(existing) = self.read(tier).await? {
            return Ok(Arc::new(existing));
        }
        let sites = registry.list_active_sites().await?;
        self.generate(tier, sites).await
    }

    async fn run_pipeline(
        &self,
        tier: QualityTier,
        sites: Vec<Site>,
    ) -> Result<Arc<PartitionCollection>, GenerationError> {
        // Another owner may have finished between the fast path and the lease.
        if let Some(existing) = self.read(tier).await? {
            return Ok(Arc::new(existing));
        }

        let started = Instant::now();
        self.pipeline_runs.fetch_add(1, Ordering::SeqCst);
        info!(tier = %tier, sites = sites.len(), "Generating clipped partitions");

        let union = self.union_builder.build(tier).await?;

        let partitioner = self.partitioner;
        let clipper = self.clipper;
        let (report, bytes) = tokio::task::spawn_blocking(move || {
            let cells = partitioner.partition(&sites);
            let report = clipper.clip(&cells, &union.polygon, &sites);
            let bytes = report.included.to_bytes();
            (report, bytes)
        })
        .await
        .map_err(|e| GenerationError::Task(e.to_string()))?;
        let bytes = bytes.map_err(CacheError::from)?;

        let path = self.paths.collection(tier);
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| CacheError::io(&path, e))?;

        let previous = self.read_manifest(tier).await.unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable manifest");
            None
        });
        let manifest = CacheManifest::next(
            tier,
            previous.as_ref(),
            report.included.len(),
            report.skipped,
        );
        self.write_manifest(&manifest).await?;

        info!(
            tier = %tier,
            partitions = manifest.partitions,
            skipped = manifest.skipped.len(),
            version = manifest.version,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Clipped partitions saved"
        );
        Ok(Arc::new(report.included))
    }

    /// Flag every tier as possibly stale. Failures are logged, never returned.
    ///
    /// Tiers are written concurrently; one failing write does not stop the
    /// others.
    pub async fn mark_dirty(&self, reason: &str) {
        join_all(
            QualityTier::ALL
                .into_iter()
                .map(|tier| self.write_dirty(tier, reason)),
        )
        .await;
    }

    async fn write_dirty(&self, tier: QualityTier, reason: &str) {
        let path = self.paths.dirty_flag(tier);
        let flag = DirtyFlag::now(reason);
        let written = match serde_json::to_vec_pretty(&flag) {
            Ok(bytes) => write_atomic(&path, &bytes).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match written {
            Ok(()) => info!(tier = %tier, reason, "Marked partitions dirty"),
            Err(e) => warn!(
                tier = %tier,
                path = %path.display(),
                error = %e,
                "Failed to write dirty flag"
            ),
        }
    }

    /// The tier's dirty flag, if present and readable.
    pub async fn read_dirty(&self, tier: QualityTier) -> Option<DirtyFlag> {
        let bytes = read_optional(&self.paths.dirty_flag(tier)).await.ok()??;
        serde_json::from_slice(&bytes).ok()
    }

    pub async fn read_manifest(
        &self,
        tier: QualityTier,
    ) -> Result<Option<CacheManifest>, CacheError> {
        let path = self.paths.manifest(tier);
        let Some(bytes) = read_optional(&path)
            .await
            .map_err(|e| CacheError::io(&path, e))?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Manifest { path, source })
    }

    async fn write_manifest(&self, manifest: &CacheManifest) -> Result<(), CacheError> {
        let path = self.paths.manifest(manifest.tier);
        let bytes = serde_json::to_vec_pretty(manifest)?;
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| CacheError::io(&path, e))
    }

    /// Delete the tier's collection so the next request regenerates it.
    ///
    /// The collection goes first, in one `remove_file`, then the dirty flag.
    /// The manifest is kept so the next generation continues its version
    /// sequence. Returns the paths that existed.
    #[instrument(skip(self), fields(tier = %tier))]
    pub async fn invalidate(&self, tier: QualityTier) -> Result<Vec<PathBuf>, CacheError> {
        self.remove_all(&[self.paths.collection(tier), self.paths.dirty_flag(tier)])
            .await
    }

    /// [`invalidate`](Self::invalidate) plus the tier's union artifact and
    /// manifest.
    #[instrument(skip(self), fields(tier = %tier))]
    pub async fn clean(&self, tier: QualityTier) -> Result<Vec<PathBuf>, CacheError> {
        let mut removed = self.invalidate(tier).await?;
        removed.extend(
            self.remove_all(&[self.paths.union(tier), self.paths.manifest(tier)])
                .await?,
        );
        Ok(removed)
    }

    async fn remove_all(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, CacheError> {
        let mut removed = Vec::new();
        for path in paths {
            if remove_if_exists(path)
                .await
                .map_err(|e| CacheError::io(path, e))?
            {
                info!(path = %path.display(), "Removed artifact");
                removed.push(path.clone());
            }
        }
        Ok(removed)
    }

    /// Presence and metadata of every artifact for `tier`.
    pub async fn status(&self, tier: QualityTier) -> Result<CacheStatus, CacheError> {
        let collection = stat(&self.paths.collection(tier)).await;
        Ok(CacheStatus {
            tier,
            validator: collection.as_ref().map(WeakValidator::from_metadata),
            collection,
            union_present: stat(&self.paths.union(tier)).await.is_some(),
            raw_present: stat(&self.paths.raw()).await.is_some(),
            manifest: self.read_manifest(tier).await?,
            dirty: self.read_dirty(tier).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnionSettings;
    use crate::landmass::{HttpClient, LandmassError, LandmassSource, MockHttpClient};
    use crate::BoxFuture;
    use std::time::Duration;
    use tempfile::TempDir;

    const RAW: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[130,30],[140,30],[140,40],[130,40],[130,30]]]}}
    ]}"#;

    fn cache(dir: &TempDir, client: Arc<MockHttpClient>) -> DerivedCache {
        let paths = ArtifactPaths::new(dir.path());
        let source = LandmassSource::new(client, "http://example.test/raw", paths.raw());
        let builder = LandmassUnionBuilder::new(
            source,
            paths.clone(),
            UnionSettings {
                coarse_tolerance: 0.1,
                fine_tolerance: 0.01,
            },
        );
        DerivedCache::new(paths, builder)
    }

    fn sites() -> Vec<Site> {
        vec![
            Site::new(1, "A", 35.0, 132.0),
            Site::new(2, "B", 35.0, 138.0),
        ]
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));

        let first = cache.generate(QualityTier::Fine, sites()).await.unwrap();
        let bytes_after_first = cache.read_bytes(QualityTier::Fine).await.unwrap().unwrap();
        let second = cache.generate(QualityTier::Fine, sites()).await.unwrap();

        assert_eq!(cache.pipeline_runs(), 1);
        assert_eq!(first.site_ids(), second.site_ids());
        assert_eq!(
            cache.read_bytes(QualityTier::Fine).await.unwrap().unwrap(),
            bytes_after_first
        );
        let manifest = cache.read_manifest(QualityTier::Fine).await.unwrap().unwrap();
        assert_eq!(manifest.version, 1);
        assert_eq!(manifest.partitions, 2);
    }

    #[tokio::test]
    async fn test_read_absent() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));
        assert!(cache.read(QualityTier::Coarse).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_dirty_writes_every_tier_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));

        cache.mark_dirty("target-location-updated").await;

        for tier in QualityTier::ALL {
            let flag = cache.read_dirty(tier).await.unwrap();
            assert_eq!(flag.reason, "target-location-updated");
            assert!(chrono::DateTime::parse_from_rfc3339(&flag.dirty_at).is_ok());
        }
    }

    #[tokio::test]
    async fn test_dirty_flag_does_not_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));
        cache.generate(QualityTier::Coarse, sites()).await.unwrap();

        cache.mark_dirty("manual").await;

        assert!(cache.read(QualityTier::Coarse).await.unwrap().is_some());
        cache.generate(QualityTier::Coarse, vec![]).await.unwrap();
        assert_eq!(cache.pipeline_runs(), 1);
    }

    #[tokio::test]
    async fn test_mark_dirty_swallows_write_failures() {
        let dir = TempDir::new().unwrap();
        // A file where the cache directory should be makes every write fail.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let paths = ArtifactPaths::new(&blocker);
        let source = LandmassSource::new(
            Arc::new(MockHttpClient::ok(RAW)),
            "http://example.test/raw",
            paths.raw(),
        );
        let builder = LandmassUnionBuilder::new(
            source,
            paths.clone(),
            UnionSettings {
                coarse_tolerance: 0.1,
                fine_tolerance: 0.01,
            },
        );
        DerivedCache::new(paths, builder).mark_dirty("x").await;
    }

    #[tokio::test]
    async fn test_invalidate_then_regenerate_bumps_version() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));
        cache.generate(QualityTier::Fine, sites()).await.unwrap();
        cache.mark_dirty("moved").await;

        let removed = cache.invalidate(QualityTier::Fine).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(cache.read(QualityTier::Fine).await.unwrap().is_none());
        assert!(cache.read_dirty(QualityTier::Fine).await.is_none());
        // The other tier's flag is untouched.
        assert!(cache.read_dirty(QualityTier::Coarse).await.is_some());
        // The union survives invalidation.
        assert!(cache.paths().union(QualityTier::Fine).exists());

        cache.generate(QualityTier::Fine, sites()).await.unwrap();
        assert_eq!(cache.pipeline_runs(), 2);
        let manifest = cache.read_manifest(QualityTier::Fine).await.unwrap().unwrap();
        assert_eq!(manifest.version, 2);
    }

    #[tokio::test]
    async fn test_clean_removes_union() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));
        cache.generate(QualityTier::Coarse, sites()).await.unwrap();

        cache.clean(QualityTier::Coarse).await.unwrap();

        assert!(!cache.paths().union(QualityTier::Coarse).exists());
        assert!(!cache.paths().collection(QualityTier::Coarse).exists());
        assert!(!cache.paths().manifest(QualityTier::Coarse).exists());
        // The raw snapshot is kept.
        assert!(cache.paths().raw().exists());
        assert!(cache.invalidate(QualityTier::Coarse).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generate_runs_pipeline_once() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(cache(&dir, Arc::new(MockHttpClient::ok(RAW))));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.generate(QualityTier::Fine, sites()).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().site_ids(), vec![1, 2]);
        }
        assert_eq!(cache.pipeline_runs(), 1);
    }

    /// Serves `RAW` after a delay so a generation stays in flight.
    struct SlowClient;

    impl HttpClient for SlowClient {
        fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LandmassError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(RAW.as_bytes().to_vec())
            })
        }
    }

    #[tokio::test]
    async fn test_aborted_owner_still_completes_for_waiters() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let source = LandmassSource::new(Arc::new(SlowClient), "http://example.test/raw", paths.raw());
        let builder = LandmassUnionBuilder::new(
            source,
            paths.clone(),
            UnionSettings {
                coarse_tolerance: 0.1,
                fine_tolerance: 0.01,
            },
        );
        let cache = Arc::new(DerivedCache::new(paths, builder));

        let owner = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.generate(QualityTier::Fine, sites()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.generate(QualityTier::Fine, sites()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        owner.abort();

        let collection = waiter.await.unwrap().unwrap();
        assert_eq!(collection.site_ids(), vec![1, 2]);
        assert!(cache.paths().collection(QualityTier::Fine).exists());
        assert_eq!(cache.pipeline_runs(), 1);
        assert_eq!(cache.lease_stats().coalesced, 1);
    }

    #[tokio::test]
    async fn test_landmass_failure_is_generation_error() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::failing("offline")));

        let err = cache.generate(QualityTier::Fine, sites()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Landmass(_)));
        assert!(cache.read(QualityTier::Fine).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, Arc::new(MockHttpClient::ok(RAW)));

        let empty = cache.status(QualityTier::Fine).await.unwrap();
        assert!(empty.collection.is_none() && empty.manifest.is_none() && !empty.raw_present);
        assert!(empty.validator.is_none());

        cache.generate(QualityTier::Fine, sites()).await.unwrap();
        let status = cache.status(QualityTier::Fine).await.unwrap();
        let metadata = status.collection.unwrap();
        assert!(metadata.size > 0);
        assert_eq!(
            status.validator,
            WeakValidator::for_path(&cache.paths().collection(QualityTier::Fine)).await
        );
        assert_eq!(
            status.validator.unwrap().as_str(),
            format!("W/\"{}-{}\"", metadata.size, metadata.modified_millis)
        );
        assert!(status.union_present && status.raw_present);
        assert_eq!(status.manifest.unwrap().version, 1);
    }
}
