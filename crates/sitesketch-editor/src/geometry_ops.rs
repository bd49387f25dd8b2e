//! Planar helpers shared by the clipper, hit testing and sessions.

use sitesketch_core::data::geometry::ring_signed_area;
pub use sitesketch_core::data::geometry::{point_in_rings, ring_is_simple};
use sitesketch_core::{Geometry, Point};

/// Drops consecutive vertices closer than `tolerance`.
pub fn dedupe(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().map_or(true, |last| last.distance_to(p) > tolerance) {
            out.push(*p);
        }
    }
    out
}

/// [`dedupe`] for rings: also drops a last vertex that repeats the first.
pub fn dedupe_ring(ring: &[Point], tolerance: f64) -> Vec<Point> {
    let mut out = dedupe(ring, tolerance);
    while out.len() > 1 && out[0].distance_to(&out[out.len() - 1]) <= tolerance {
        out.pop();
    }
    out
}

pub fn is_ccw(ring: &[Point]) -> bool {
    ring_signed_area(ring) > 0.0
}

/// Intersection parameters `(t, u)` of segments `p1-p2` and `q1-q2`, both in
/// `[0, 1]`. Parallel and collinear segments yield `None`.
pub fn segment_intersection(p1: Point, p2: Point, q1: Point, q2: Point) -> Option<(f64, f64)> {
    let r = (p2.x - p1.x, p2.y - p1.y);
    let s = (q2.x - q1.x, q2.y - q1.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let qp = (q1.x - p1.x, q1.y - p1.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some((t, u))
}

pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&a.lerp(b, t))
}

pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Nearest vertex of `geometry` within `tolerance`, as `(part, index)`.
pub fn nearest_vertex(geometry: &Geometry, point: &Point, tolerance: f64) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (part, vertices) in geometry.parts().into_iter().enumerate() {
        for (index, v) in vertices.iter().enumerate() {
            let d = v.distance_to(point);
            if d <= tolerance && best.map_or(true, |(_, bd)| d < bd) {
                best = Some(((part, index), d));
            }
        }
    }
    best.map(|(address, _)| address)
}

/// Whether `point` lies on `geometry` within `tolerance`.
///
/// Polygons also hit anywhere inside a ring.
pub fn geometry_hit(geometry: &Geometry, point: &Point, tolerance: f64) -> bool {
    match geometry {
        Geometry::Point { point: p, .. } => p.distance_to(point) <= tolerance,
        Geometry::Polyline { paths, .. } => paths.iter().any(|path| {
            path.windows(2)
                .any(|w| distance_to_segment(point, &w[0], &w[1]) <= tolerance)
                || (path.len() == 1 && path[0].distance_to(point) <= tolerance)
        }),
        Geometry::Polygon { rings, .. } => {
            point_in_rings(point, rings)
                || rings.iter().any(|ring| {
                    let n = ring.len();
                    (0..n).any(|i| {
                        distance_to_segment(point, &ring[i], &ring[(i + 1) % n]) <= tolerance
                    })
                })
        }
    }
}
