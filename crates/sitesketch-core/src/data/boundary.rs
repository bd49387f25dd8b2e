//! The planning boundary.
//!
//! A fixed polygon supplied at start-up. Every geometry committed by the
//! editor is clipped to it.

use super::geometry::{
    point_in_ring, point_in_rings, ring_is_simple, ring_signed_area, rings_touch,
    strip_closing_vertex, Extent, Geometry, Point, SpatialReference,
};
use crate::error::GeometryError;

const MIN_RING_AREA: f64 = 1e-12;

/// Validated boundary polygon.
///
/// Rings are disjoint outer rings. A ring with fewer than three vertices, no
/// area or a self-crossing is rejected at construction, as is any pair of
/// rings that touch or nest. Holes are therefore not representable, and
/// even-odd containment agrees with the union of the rings.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    rings: Vec<Vec<Point>>,
    spatial_reference: SpatialReference,
    extent: Extent,
}

impl BoundaryPolygon {
    pub fn new(
        rings: Vec<Vec<Point>>,
        spatial_reference: SpatialReference,
    ) -> Result<Self, GeometryError> {
        let rings: Vec<Vec<Point>> = rings
            .into_iter()
            .map(|mut ring| {
                ring.dedup();
                strip_closing_vertex(ring)
            })
            .collect();

        if rings.is_empty() {
            return Err(GeometryError::InvalidBoundary {
                reason: "boundary has no rings".to_string(),
            });
        }
        for (index, ring) in rings.iter().enumerate() {
            if ring.len() < 3 {
                return Err(GeometryError::InvalidBoundary {
                    reason: format!("ring {} has {} vertices, need at least 3", index, ring.len()),
                });
            }
            if ring_signed_area(ring).abs() < MIN_RING_AREA {
                return Err(GeometryError::InvalidBoundary {
                    reason: format!("ring {} has no area", index),
                });
            }
            if !ring_is_simple(ring) {
                return Err(GeometryError::SelfIntersecting { ring: index });
            }
        }
        for first in 0..rings.len() {
            for second in (first + 1)..rings.len() {
                let (a, b) = (&rings[first], &rings[second]);
                if rings_touch(a, b) || ring_inside(a, b) || ring_inside(b, a) {
                    return Err(GeometryError::OverlappingRings { first, second });
                }
            }
        }

        let extent = Extent::from_points(rings.iter().flatten()).ok_or_else(|| {
            GeometryError::InvalidBoundary {
                reason: "boundary has no vertices".to_string(),
            }
        })?;

        Ok(Self {
            rings,
            spatial_reference,
            extent,
        })
    }

    /// Rectangular boundary, handy for tests and defaults.
    pub fn rectangle(extent: Extent, spatial_reference: SpatialReference) -> Result<Self, GeometryError> {
        Self::new(
            vec![vec![
                Point::new(extent.xmin, extent.ymin),
                Point::new(extent.xmax, extent.ymin),
                Point::new(extent.xmax, extent.ymax),
                Point::new(extent.xmin, extent.ymax),
            ]],
            spatial_reference,
        )
    }

    pub fn rings(&self) -> &[Vec<Point>] {
        &self.rings
    }

    pub fn spatial_reference(&self) -> SpatialReference {
        self.spatial_reference
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn area(&self) -> f64 {
        self.rings.iter().map(|r| ring_signed_area(r).abs()).sum()
    }

    /// Even-odd containment test over all rings. Points on an edge may fall
    /// either way.
    pub fn contains(&self, point: &Point) -> bool {
        self.extent.contains(point) && point_in_rings(point, &self.rings)
    }

    pub fn to_geometry(&self) -> Geometry {
        Geometry::polygon(self.rings.clone(), self.spatial_reference)
    }
}

// Only meaningful once the two rings are known not to touch.
fn ring_inside(inner: &[Point], outer: &[Point]) -> bool {
    point_in_ring(&inner[0], outer)
}
