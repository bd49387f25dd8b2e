//! Boundary clipping and part decomposition.
//!
//! Polygon rings are intersected with each boundary ring through
//! `cavalier_contours`; every resulting loop becomes its own single-ring
//! polygon. Polyline paths are cut at their crossings with the boundary
//! edges and the inside runs become single-path polylines. Points are kept
//! or dropped whole.

use crate::geometry_ops::{
    dedupe, dedupe_ring, is_ccw, path_length, ring_is_simple, segment_intersection,
};
use crate::model::Graphic;
use cavalier_contours::polyline::{BooleanOp, PlineSource, PlineSourceMut, PlineVertex, Polyline};
use sitesketch_core::data::geometry::{point_in_ring, ring_signed_area};
use sitesketch_core::{BoundaryPolygon, Geometry, GeometryError, Point, SpatialReference};
use std::sync::Arc;

/// Vertices closer than this are merged before clipping.
const MERGE_TOLERANCE: f64 = 1e-9;

/// Clips geometries against an optional boundary.
#[derive(Debug, Clone)]
pub struct GeometryClipper {
    boundary: Option<Arc<BoundaryPolygon>>,
    epsilon: f64,
}

impl GeometryClipper {
    pub fn new(boundary: Option<Arc<BoundaryPolygon>>) -> Self {
        Self {
            boundary,
            epsilon: 1e-9,
        }
    }

    /// Parts with area (polygons) or length (polylines) at or below
    /// `epsilon` are dropped.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn boundary(&self) -> Option<&Arc<BoundaryPolygon>> {
        self.boundary.as_ref()
    }

    /// Clips `geometry` and splits the result into single-part geometries.
    ///
    /// An empty result means the shape lies entirely outside the boundary.
    /// Without a boundary the input is returned unchanged as one part.
    pub fn clip(&self, geometry: &Geometry) -> Result<Vec<Geometry>, GeometryError> {
        let Some(boundary) = self.boundary.as_deref() else {
            return Ok(vec![geometry.clone()]);
        };

        let sr = geometry.spatial_reference();
        if sr != boundary.spatial_reference() {
            return Err(GeometryError::SpatialReferenceMismatch {
                expected: boundary.spatial_reference().wkid,
                actual: sr.wkid,
            });
        }

        match geometry {
            Geometry::Point { point, .. } => Ok(if boundary.contains(point) {
                vec![geometry.clone()]
            } else {
                Vec::new()
            }),
            Geometry::Polyline { paths, .. } => self.clip_polyline(paths, boundary, sr),
            Geometry::Polygon { rings, .. } => self.clip_polygon(rings, boundary, sr),
        }
    }

    /// Clips a graphic; each part becomes a graphic with the same style.
    ///
    /// Clipping failures are logged and yield no graphics.
    pub fn clip_graphic(&self, graphic: &Graphic) -> Vec<Graphic> {
        match self.clip(&graphic.geometry) {
            Ok(parts) => parts.into_iter().map(|g| graphic.derive(g)).collect(),
            Err(err) => {
                tracing::warn!("Dropping graphic {}: {}", graphic.id(), err);
                Vec::new()
            }
        }
    }

    fn clip_polygon(
        &self,
        rings: &[Vec<Point>],
        boundary: &BoundaryPolygon,
        sr: SpatialReference,
    ) -> Result<Vec<Geometry>, GeometryError> {
        let mut prepared = Vec::with_capacity(rings.len());
        for (index, ring) in rings.iter().enumerate() {
            let ring = dedupe_ring(ring, MERGE_TOLERANCE);
            if ring.len() < 3 {
                continue;
            }
            if !ring_is_simple(&ring) {
                return Err(GeometryError::SelfIntersecting { ring: index });
            }
            if ring_signed_area(&ring).abs() > self.epsilon {
                prepared.push(ring);
            }
        }
        if prepared.is_empty() {
            return Err(GeometryError::Degenerate {
                reason: "polygon has no ring with area".to_string(),
            });
        }

        // Boundary rings are pairwise disjoint, so per-ring pieces never overlap.
        let mut parts = Vec::new();
        for ring in &prepared {
            let clockwise = !is_ccw(ring);
            for boundary_ring in boundary.rings() {
                if ring_within(ring, boundary_ring) {
                    parts.push(Geometry::polygon(vec![ring.clone()], sr));
                    continue;
                }
                for mut piece in intersect_rings(ring, boundary_ring) {
                    if piece.len() < 3 || ring_signed_area(&piece).abs() <= self.epsilon {
                        continue;
                    }
                    if is_ccw(&piece) == clockwise {
                        piece.reverse();
                    }
                    parts.push(Geometry::polygon(vec![piece], sr));
                }
            }
        }
        Ok(parts)
    }

    fn clip_polyline(
        &self,
        paths: &[Vec<Point>],
        boundary: &BoundaryPolygon,
        sr: SpatialReference,
    ) -> Result<Vec<Geometry>, GeometryError> {
        let prepared: Vec<Vec<Point>> = paths
            .iter()
            .map(|p| dedupe(p, MERGE_TOLERANCE))
            .filter(|p| p.len() >= 2)
            .collect();
        if prepared.is_empty() {
            return Err(GeometryError::Degenerate {
                reason: "polyline has no path with two distinct vertices".to_string(),
            });
        }

        let mut parts = Vec::new();
        for path in &prepared {
            for run in inside_runs(path, boundary) {
                let run = dedupe(&run, MERGE_TOLERANCE);
                if run.len() >= 2 && path_length(&run) > self.epsilon {
                    parts.push(Geometry::polyline(vec![run], sr));
                }
            }
        }
        Ok(parts)
    }
}

fn to_pline(ring: &[Point]) -> Polyline<f64> {
    let mut pline = Polyline::new();
    let reversed = !is_ccw(ring);
    let mut push = |p: &Point| pline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    if reversed {
        ring.iter().rev().for_each(&mut push);
    } else {
        ring.iter().for_each(&mut push);
    }
    pline.set_is_closed(true);
    pline
}

fn intersect_rings(ring: &[Point], boundary_ring: &[Point]) -> Vec<Vec<Point>> {
    let subject = to_pline(ring);
    let clip = to_pline(boundary_ring);
    let result = subject.boolean(&clip, BooleanOp::And);
    result
        .pos_plines
        .iter()
        .map(|piece| {
            let vertices: Vec<Point> = piece
                .pline
                .vertex_data
                .iter()
                .map(|v| Point::new(v.x, v.y))
                .collect();
            dedupe_ring(&vertices, MERGE_TOLERANCE)
        })
        .collect()
}

/// Ring lies strictly inside the boundary ring: every vertex inside and no
/// edge meeting a boundary edge.
fn ring_within(ring: &[Point], boundary_ring: &[Point]) -> bool {
    if !ring.iter().all(|p| point_in_ring(p, boundary_ring)) {
        return false;
    }
    let n = ring.len();
    let m = boundary_ring.len();
    (0..n).all(|i| {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        (0..m).all(|j| {
            segment_intersection(a, b, boundary_ring[j], boundary_ring[(j + 1) % m]).is_none()
        })
    })
}

/// Maximal runs of `path` lying inside the boundary, in path order.
fn inside_runs(path: &[Point], boundary: &BoundaryPolygon) -> Vec<Vec<Point>> {
    let mut runs = Vec::new();
    let mut run: Vec<Point> = Vec::new();

    for w in path.windows(2) {
        let (a, b) = (w[0], w[1]);
        let mut params = vec![0.0, 1.0];
        for ring in boundary.rings() {
            let n = ring.len();
            for i in 0..n {
                if let Some((t, _)) = segment_intersection(a, b, ring[i], ring[(i + 1) % n]) {
                    params.push(t);
                }
            }
        }
        params.sort_by(f64::total_cmp);
        params.dedup_by(|x, y| (*x - *y).abs() < 1e-12);

        for pair in params.windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            let mid = a.lerp(&b, (t0 + t1) / 2.0);
            if boundary.contains(&mid) {
                if run.is_empty() {
                    run.push(a.lerp(&b, t0));
                }
                run.push(a.lerp(&b, t1));
            } else if !run.is_empty() {
                runs.push(std::mem::take(&mut run));
            }
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}
