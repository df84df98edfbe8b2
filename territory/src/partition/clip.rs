//! Intersection of Voronoi cells with the landmass union.

use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::{BooleanOps, MultiPolygon};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use super::types::{
    ClipReport, ClippedPartition, PartitionCollection, SkipReason, SkippedSite, VoronoiCell,
};
use crate::geometry::is_empty_area;
use crate::site::Site;

/// Clips cells to the landmass and tags them with site identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandClipper;

impl LandClipper {
    pub fn new() -> Self {
        Self
    }

    /// Intersect every cell with `union`.
    ///
    /// `cells[i]` must belong to `sites[i]`; sites past the last cell are
    /// skipped as degenerate. Sites keep their input order;
    /// nothing is re-sorted. Sites whose cell is missing, misses the
    /// landmass, or breaks the boolean-ops engine are reported in
    /// `skipped` and left out of the collection.
    #[instrument(skip_all, fields(cells = cells.len()))]
    pub fn clip(
        &self,
        cells: &[VoronoiCell],
        union: &MultiPolygon<f64>,
        sites: &[Site],
    ) -> ClipReport {
        if cells.len() != sites.len() {
            warn!(
                cells = cells.len(),
                sites = sites.len(),
                "Cell and site counts differ"
            );
        }

        let mut outcomes: Vec<Result<ClippedPartition, SkippedSite>> = cells
            .par_iter()
            .zip(sites.par_iter())
            .map(|(cell, site)| clip_one(cell, union, site))
            .collect();
        // Sites without a cell.
        outcomes.extend(sites.iter().skip(cells.len()).map(|site| {
            Err(SkippedSite {
                site_id: site.id,
                site_name: site.name.clone(),
                reason: SkipReason::DegenerateCell,
            })
        }));

        let mut report = ClipReport::default();
        let mut partitions = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(partition) => partitions.push(partition),
                Err(skipped) => {
                    warn!(
                        site_id = skipped.site_id,
                        site_name = %skipped.site_name,
                        reason = %skipped.reason,
                        "Skipping site"
                    );
                    report.skipped.push(skipped);
                }
            }
        }
        report.included = PartitionCollection { partitions };

        info!(
            included = report.included.len(),
            skipped = report.skipped.len(),
            "Clipping complete"
        );
        report
    }
}

fn clip_one(
    cell: &VoronoiCell,
    union: &MultiPolygon<f64>,
    site: &Site,
) -> Result<ClippedPartition, SkippedSite> {
    let skip = |reason| SkippedSite {
        site_id: site.id,
        site_name: site.name.clone(),
        reason,
    };

    let polygon = cell
        .polygon
        .as_ref()
        .ok_or_else(|| skip(SkipReason::DegenerateCell))?;

    let clipped = catch_unwind(AssertUnwindSafe(|| polygon.intersection(union)))
        .map_err(|panic| skip(SkipReason::GeometryError(panic_message(panic))))?;

    if is_empty_area(&clipped) {
        return Err(skip(SkipReason::EmptyIntersection));
    }

    Ok(ClippedPartition {
        site_id: site.id,
        site_name: site.name.clone(),
        polygon: clipped,
    })
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "boolean operation panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{BoundingRegion, SitePartitioner};
    use geo::{polygon, Area};

    fn land() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 130.0, y: 30.0),
            (x: 140.0, y: 30.0),
            (x: 140.0, y: 40.0),
            (x: 130.0, y: 40.0),
            (x: 130.0, y: 30.0),
        ]])
    }

    fn site(id: i64, lat: f64, lng: f64) -> Site {
        Site::new(id, format!("site {}", id), lat, lng)
    }

    #[test]
    fn test_clip_tags_and_preserves_order() {
        let sites = vec![site(1, 35.0, 132.0), site(2, 35.0, 138.0)];
        let cells = SitePartitioner::default().partition(&sites);

        let report = LandClipper::new().clip(&cells, &land(), &sites);

        assert!(report.skipped.is_empty());
        assert_eq!(report.included.site_ids(), vec![1, 2]);
        assert_eq!(report.included.partitions[0].site_name, "site 1");
        let total: f64 = report
            .included
            .partitions
            .iter()
            .map(|p| p.polygon.unsigned_area())
            .sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_skip_reasons() {
        let region = BoundingRegion {
            min_lng: 120.0,
            min_lat: 20.0,
            max_lng: 160.0,
            max_lat: 46.0,
        };
        // Site 3 is far east; its cell lies beyond the landmass.
        let sites = vec![site(1, 35.0, 135.0), site(2, 35.0, 135.0), site(3, 35.0, 158.0)];
        let cells = SitePartitioner::new(region).partition(&sites);

        let report = LandClipper::new().clip(&cells, &land(), &sites);

        assert_eq!(report.included.site_ids(), vec![1]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].site_id, 2);
        assert_eq!(report.skipped[0].reason, SkipReason::DegenerateCell);
        assert_eq!(report.skipped[1].site_id, 3);
        assert_eq!(report.skipped[1].reason, SkipReason::EmptyIntersection);
    }

    #[test]
    fn test_sites_without_cells_are_skipped() {
        let sites = vec![site(1, 35.0, 132.0), site(2, 35.0, 138.0)];
        let cells = SitePartitioner::default().partition(&sites[..1]);

        let report = LandClipper::new().clip(&cells, &land(), &sites);

        assert_eq!(report.included.site_ids(), vec![1]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].site_id, 2);
        assert_eq!(report.skipped[0].reason, SkipReason::DegenerateCell);
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42)), "boolean operation panicked");
    }
}
