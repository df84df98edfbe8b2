//! Out-of-band cache warming.
//!
//! Runs the same pipeline as the server ahead of traffic. When both tiers
//! are requested they are built one after the other, never concurrently,
//! so the memory-hungry union step runs once at a time.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::cache::{DerivedCache, GenerationError};
use crate::site::SiteRegistry;
use crate::tier::QualityTier;

/// Which tiers to warm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrewarmMode {
    #[default]
    Coarse,
    Fine,
    Both,
}

impl PrewarmMode {
    /// `both`, or anything else resolved through tier coercion.
    pub fn coerce(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("both") {
            PrewarmMode::Both
        } else {
            QualityTier::coerce(Some(value)).into()
        }
    }

    /// Tiers in the order they are warmed.
    pub fn tiers(&self) -> &'static [QualityTier] {
        match self {
            PrewarmMode::Coarse => &[QualityTier::Coarse],
            PrewarmMode::Fine => &[QualityTier::Fine],
            PrewarmMode::Both => &QualityTier::ALL,
        }
    }
}

impl From<QualityTier> for PrewarmMode {
    fn from(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Coarse => PrewarmMode::Coarse,
            QualityTier::Fine => PrewarmMode::Fine,
        }
    }
}

impl FromStr for PrewarmMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::coerce(s))
    }
}

impl fmt::Display for PrewarmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrewarmMode::Coarse => f.write_str("coarse"),
            PrewarmMode::Fine => f.write_str("fine"),
            PrewarmMode::Both => f.write_str("both"),
        }
    }
}

/// Outcome for one tier.
#[derive(Debug, Clone)]
pub struct TierReport {
    pub tier: QualityTier,
    pub partitions: usize,
    pub elapsed: Duration,
}

/// Outcome of a prewarm run.
#[derive(Debug, Clone, Default)]
pub struct PrewarmReport {
    pub tiers: Vec<TierReport>,
}

/// Drives generation for one or both tiers.
pub struct Prewarmer {
    cache: Arc<DerivedCache>,
    registry: Arc<dyn SiteRegistry>,
}

impl Prewarmer {
    pub fn new(cache: Arc<DerivedCache>, registry: Arc<dyn SiteRegistry>) -> Self {
        Self { cache, registry }
    }

    /// Warm the tiers selected by `mode`, optionally cleaning them first.
    ///
    /// Stops at the first failing tier.
    pub async fn run(&self, mode: PrewarmMode, clean: bool) -> Result<PrewarmReport, GenerationError> {
        let mut report = PrewarmReport::default();
        for &tier in mode.tiers() {
            report.tiers.push(self.warm(tier, clean).await?);
        }
        Ok(report)
    }

    async fn warm(&self, tier: QualityTier, clean: bool) -> Result<TierReport, GenerationError> {
        if clean {
            info!(tier = %tier, "Cleaning caches");
            self.cache.clean(tier).await?;
        }

        let started = Instant::now();
        info!(tier = %tier, "Generating clipped partitions");
        let collection = self.cache.ensure(tier, self.registry.as_ref()).await?;
        let elapsed = started.elapsed();
        info!(
            tier = %tier,
            partitions = collection.len(),
            elapsed_secs = elapsed.as_secs(),
            "Prewarm done"
        );

        Ok(TierReport {
            tier,
            partitions: collection.len(),
            elapsed,
        })
    }
}
