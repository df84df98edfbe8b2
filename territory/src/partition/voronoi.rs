//! Bounded Voronoi cells from a Delaunay triangulation.
//!
//! Each cell starts as the bounding rectangle and is cut by the
//! perpendicular bisector between the site and every Delaunay neighbour.

use std::collections::HashSet;

use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use spade::handles::FixedVertexHandle;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::{debug, instrument};

use super::types::VoronoiCell;
use crate::site::Site;

/// Longitude/latitude rectangle bounding every cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// Extent of the serving area.
pub const SERVING_REGION: BoundingRegion = BoundingRegion {
    min_lng: 122.93,
    min_lat: 20.0,
    max_lng: 150.0,
    max_lat: 46.0,
};

impl BoundingRegion {
    /// Corners in counter-clockwise order.
    fn corners(&self) -> Vec<Coord<f64>> {
        vec![
            Coord { x: self.min_lng, y: self.min_lat },
            Coord { x: self.max_lng, y: self.min_lat },
            Coord { x: self.max_lng, y: self.max_lat },
            Coord { x: self.min_lng, y: self.max_lat },
        ]
    }
}

/// Computes Voronoi cells for an ordered list of sites.
#[derive(Debug, Clone, Copy)]
pub struct SitePartitioner {
    region: BoundingRegion,
}

impl Default for SitePartitioner {
    fn default() -> Self {
        Self::new(SERVING_REGION)
    }
}

impl SitePartitioner {
    pub fn new(region: BoundingRegion) -> Self {
        Self { region }
    }

    pub fn region(&self) -> BoundingRegion {
        self.region
    }

    /// One cell per site, `output[i]` belonging to `sites[i]`.
    ///
    /// The first site at a coordinate owns its cell. Later coincident sites,
    /// non-finite coordinates and cells that collapse get `polygon: None`.
    #[instrument(skip_all, fields(sites = sites.len()))]
    pub fn partition(&self, sites: &[Site]) -> Vec<VoronoiCell> {
        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        let mut owners: HashSet<FixedVertexHandle> = HashSet::new();

        let handles: Vec<Option<FixedVertexHandle>> = sites
            .iter()
            .map(|site| {
                if !(site.lng.is_finite() && site.lat.is_finite()) {
                    return None;
                }
                let handle = triangulation.insert(Point2::new(site.lng, site.lat)).ok()?;
                // Inserting an existing position returns the existing vertex.
                owners.insert(handle).then_some(handle)
            })
            .collect();

        let cells: Vec<VoronoiCell> = handles
            .iter()
            .enumerate()
            .map(|(site_index, handle)| VoronoiCell {
                site_index,
                polygon: handle.and_then(|h| self.cell(&triangulation, h)),
            })
            .collect();

        debug!(
            degenerate = cells.iter().filter(|c| c.polygon.is_none()).count(),
            "Voronoi partition complete"
        );
        cells
    }

    fn cell(
        &self,
        triangulation: &DelaunayTriangulation<Point2<f64>>,
        handle: FixedVertexHandle,
    ) -> Option<MultiPolygon<f64>> {
        let vertex = triangulation.vertex(handle);
        let site = vertex.position();
        let p = Coord { x: site.x, y: site.y };

        let mut ring = self.region.corners();
        for edge in vertex.out_edges() {
            let neighbour = edge.to().position();
            let q = Coord { x: neighbour.x, y: neighbour.y };
            ring = clip_half_plane(&ring, p, q);
            if ring.len() < 3 {
                return None;
            }
        }

        let polygon = Polygon::new(LineString::new(ring), vec![]);
        if polygon.unsigned_area() > 0.0 {
            Some(MultiPolygon::new(vec![polygon]))
        } else {
            None
        }
    }
}

/// Keep the part of `ring` closer to `p` than to `q` (Sutherland–Hodgman).
fn clip_half_plane(ring: &[Coord<f64>], p: Coord<f64>, q: Coord<f64>) -> Vec<Coord<f64>> {
    let mid = Coord { x: (p.x + q.x) / 2.0, y: (p.y + q.y) / 2.0 };
    let dir = Coord { x: q.x - p.x, y: q.y - p.y };
    let side = |c: Coord<f64>| (c.x - mid.x) * dir.x + (c.y - mid.y) * dir.y;

    let mut out = Vec::with_capacity(ring.len() + 1);
    for (i, &current) in ring.iter().enumerate() {
        let previous = ring[(i + ring.len() - 1) % ring.len()];
        let (sc, sp) = (side(current), side(previous));

        if sc <= 0.0 {
            if sp > 0.0 {
                out.push(intersect(previous, current, sp, sc));
            }
            out.push(current);
        } else if sp <= 0.0 {
            out.push(intersect(previous, current, sp, sc));
        }
    }
    out.dedup_by(|a, b| (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12);
    out
}

fn intersect(a: Coord<f64>, b: Coord<f64>, sa: f64, sb: f64) -> Coord<f64> {
    let t = sa / (sa - sb);
    Coord { x: a.x + t * (b.x - a.x), y: a.y + t * (b.y - a.y) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Point};
    use proptest::prelude::*;

    fn site(id: i64, lat: f64, lng: f64) -> Site {
        Site::new(id, format!("site {}", id), lat, lng)
    }

    fn region_area() -> f64 {
        (SERVING_REGION.max_lng - SERVING_REGION.min_lng)
            * (SERVING_REGION.max_lat - SERVING_REGION.min_lat)
    }

    #[test]
    fn test_single_site_owns_region() {
        let cells = SitePartitioner::default().partition(&[site(1, 35.0, 135.0)]);
        assert_eq!(cells.len(), 1);
        let area = cells[0].polygon.as_ref().unwrap().unsigned_area();
        assert!((area - region_area()).abs() < 1e-9);
    }

    #[test]
    fn test_two_sites_split_at_bisector() {
        let cells = SitePartitioner::default()
            .partition(&[site(1, 35.0, 130.0), site(2, 35.0, 140.0)]);
        let left = cells[0].polygon.as_ref().unwrap();
        let right = cells[1].polygon.as_ref().unwrap();

        assert!(left.contains(&Point::new(130.0, 35.0)));
        assert!(right.contains(&Point::new(140.0, 35.0)));
        let expected_left = (135.0 - SERVING_REGION.min_lng) * 26.0;
        assert!((left.unsigned_area() - expected_left).abs() < 1e-6);
        assert!((left.unsigned_area() + right.unsigned_area() - region_area()).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_keeps_slot() {
        let cells = SitePartitioner::default().partition(&[
            site(1, 35.0, 135.0),
            site(2, 35.0, 135.0),
            site(3, 34.0, 136.0),
        ]);
        assert_eq!(cells.len(), 3);
        assert!(cells[0].polygon.is_some());
        assert!(cells[1].polygon.is_none());
        assert!(cells[2].polygon.is_some());
        assert_eq!(
            cells.iter().map(|c| c.site_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_non_finite_coordinates_are_degenerate() {
        let cells = SitePartitioner::default()
            .partition(&[site(1, f64::NAN, 135.0), site(2, 35.0, 135.0)]);
        assert!(cells[0].polygon.is_none());
        assert!(cells[1].polygon.is_some());
    }

    #[test]
    fn test_empty_input() {
        assert!(SitePartitioner::default().partition(&[]).is_empty());
    }

    #[test]
    fn test_clip_half_plane_halves_square() {
        let square = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 0.0, y: 2.0 },
        ];
        let half = clip_half_plane(&square, Coord { x: 0.5, y: 1.0 }, Coord { x: 1.5, y: 1.0 });
        let area = Polygon::new(LineString::new(half), vec![]).unsigned_area();
        assert!((area - 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_output_is_index_aligned(
            coords in prop::collection::vec((20.0f64..46.0, 123.0f64..150.0), 0..40),
            dup_every in 1usize..5,
        ) {
            let mut sites: Vec<Site> = coords
                .iter()
                .enumerate()
                .map(|(i, (lat, lng))| site(i as i64, *lat, *lng))
                .collect();
            // Duplicate some coordinates.
            let extra: Vec<Site> = sites
                .iter()
                .step_by(dup_every)
                .map(|s| site(s.id + 1000, s.lat, s.lng))
                .collect();
            sites.extend(extra);

            let cells = SitePartitioner::default().partition(&sites);
            prop_assert_eq!(cells.len(), sites.len());
            for (i, cell) in cells.iter().enumerate() {
                prop_assert_eq!(cell.site_index, i);
            }
            for cell in &cells[coords.len()..] {
                prop_assert!(cell.polygon.is_none());
            }
        }
    }
}
