//! Region geometry and point-in-polygon tests.

use serde::{Deserialize, Serialize};

use dekad_common::crs::transform_point;
use dekad_common::{BoundingBox, CrsCode};

/// A polygon with one exterior ring and zero or more holes.
///
/// Ring coordinates are (x, y) pairs in the owning region's CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingPolygon {
    pub exterior: Vec<(f64, f64)>,
    pub holes: Vec<Vec<(f64, f64)>>,
}

impl RingPolygon {
    pub fn new(exterior: Vec<(f64, f64)>) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    /// Check if a point is inside the polygon (holes excluded).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        if !point_in_ring(&self.exterior, x, y) {
            return false;
        }
        !self.holes.iter().any(|hole| point_in_ring(hole, x, y))
    }
}

/// A named administrative region.
///
/// Multi-part geometries are stored as a union of polygons; a point is
/// in the region if it falls in any part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub polygons: Vec<RingPolygon>,
    pub crs: CrsCode,
}

impl Region {
    /// Check if a point is inside any part of the region.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.polygons.iter().any(|p| p.contains_point(x, y))
    }

    /// Bounding box over all exterior rings.
    ///
    /// Returns `None` for a region with no vertices.
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(
            self.polygons
                .iter()
                .flat_map(|p| p.exterior.iter().copied()),
        )
    }

    /// Produce this region's geometry in another coordinate reference.
    ///
    /// Must be applied before any pixel-in-polygon test against a raster
    /// whose CRS differs from the catalog's native reference.
    pub fn reproject(&self, target: CrsCode) -> Region {
        if self.crs == target {
            return self.clone();
        }

        let project = |ring: &[(f64, f64)]| -> Vec<(f64, f64)> {
            ring.iter()
                .map(|&(x, y)| transform_point(x, y, self.crs, target))
                .collect()
        };

        Region {
            name: self.name.clone(),
            polygons: self
                .polygons
                .iter()
                .map(|p| RingPolygon {
                    exterior: project(&p.exterior),
                    holes: p.holes.iter().map(|h| project(h)).collect(),
                })
                .collect(),
            crs: target,
        }
    }
}

/// Ray casting point-in-ring test.
fn point_in_ring(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<(f64, f64)> {
        vec![(min, min), (max, min), (max, max), (min, max), (min, min)]
    }

    fn region(polygons: Vec<RingPolygon>) -> Region {
        Region {
            name: "Test".to_string(),
            polygons,
            crs: CrsCode::Epsg4326,
        }
    }

    #[test]
    fn test_contains_point() {
        let r = region(vec![RingPolygon::new(square(0.0, 10.0))]);
        assert!(r.contains_point(5.0, 5.0));
        assert!(!r.contains_point(-1.0, 5.0));
        assert!(!r.contains_point(5.0, 11.0));
    }

    #[test]
    fn test_hole_excluded() {
        let mut polygon = RingPolygon::new(square(0.0, 10.0));
        polygon.holes.push(square(4.0, 6.0));
        let r = region(vec![polygon]);

        assert!(r.contains_point(2.0, 2.0));
        assert!(!r.contains_point(5.0, 5.0));
    }

    #[test]
    fn test_multi_part_union() {
        let r = region(vec![
            RingPolygon::new(square(0.0, 1.0)),
            RingPolygon::new(square(5.0, 6.0)),
        ]);
        assert!(r.contains_point(0.5, 0.5));
        assert!(r.contains_point(5.5, 5.5));
        assert!(!r.contains_point(3.0, 3.0));
    }

    #[test]
    fn test_degenerate_ring() {
        let r = region(vec![RingPolygon::new(vec![(0.0, 0.0), (1.0, 1.0)])]);
        assert!(!r.contains_point(0.5, 0.5));
    }

    #[test]
    fn test_bbox() {
        let r = region(vec![RingPolygon::new(square(2.0, 7.0))]);
        let bbox = r.bbox().unwrap();
        assert_eq!(bbox.min_x, 2.0);
        assert_eq!(bbox.max_y, 7.0);
    }

    #[test]
    fn test_reproject_identity() {
        let r = region(vec![RingPolygon::new(square(0.0, 10.0))]);
        let same = r.reproject(CrsCode::Epsg4326);
        assert_eq!(same, r);
    }

    #[test]
    fn test_reproject_round_trip() {
        let r = region(vec![RingPolygon::new(square(25.0, 33.0))]);
        let back = r
            .reproject(CrsCode::Epsg3857)
            .reproject(CrsCode::Epsg4326);
        for (a, b) in back.polygons[0]
            .exterior
            .iter()
            .zip(r.polygons[0].exterior.iter())
        {
            assert!((a.0 - b.0).abs() < 1e-9);
            assert!((a.1 - b.1).abs() < 1e-9);
        }
    }
}
