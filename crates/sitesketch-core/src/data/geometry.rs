//! Geometry primitives.
//!
//! Geometries are plain values in map units tagged with a spatial reference.
//! Polygon rings are stored open: the closing vertex is implied and a
//! duplicate closing vertex is stripped on construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in map units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl From<[f64; 2]> for Point {
    fn from(xy: [f64; 2]) -> Self {
        Self::new(xy[0], xy[1])
    }
}

/// Coordinate reference system, identified by its well-known id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl SpatialReference {
    /// Web Mercator (auxiliary sphere)
    pub const WEB_MERCATOR: SpatialReference = SpatialReference { wkid: 3857 };
    /// Geographic WGS 84
    pub const WGS84: SpatialReference = SpatialReference { wkid: 4326 };

    pub fn new(wkid: u32) -> Self {
        Self { wkid }
    }
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self::WEB_MERCATOR
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wkid:{}", self.wkid)
    }
}

/// Geometry family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    Point,
    Polyline,
    Polygon,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Polyline => write!(f, "polyline"),
            Self::Polygon => write!(f, "polygon"),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin: xmin.min(xmax),
            ymin: ymin.min(ymax),
            xmax: xmin.max(xmax),
            ymax: ymin.max(ymax),
        }
    }

    /// Bounding box of a point set, `None` when the set is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Extent::new(first.x, first.y, first.x, first.y);
        for p in iter {
            extent.xmin = extent.xmin.min(p.x);
            extent.ymin = extent.ymin.min(p.y);
            extent.xmax = extent.xmax.max(p.x);
            extent.ymax = extent.ymax.max(p.y);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.xmin && point.x <= self.xmax && point.y >= self.ymin && point.y <= self.ymax
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    /// Grows the box by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Extent {
        Extent::new(
            self.xmin - amount,
            self.ymin - amount,
            self.xmax + amount,
            self.ymax + amount,
        )
    }
}

/// Signed area of an open ring; positive for counter-clockwise winding.
pub fn ring_signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..ring.len() {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % ring.len()];
        twice_area += p1.x * p2.y - p2.x * p1.y;
    }
    twice_area / 2.0
}

fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

pub(crate) fn strip_closing_vertex(mut ring: Vec<Point>) -> Vec<Point> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segments `p1-p2` and `q1-q2` cross or touch.
pub fn segments_touch(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// True when no two non-adjacent edges of the closed ring touch.
pub fn ring_is_simple(ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let (a1, a2) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            let (b1, b2) = (ring[j], ring[(j + 1) % n]);
            if segments_touch(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// Whether any edge of ring `a` touches any edge of ring `b`.
pub fn rings_touch(a: &[Point], b: &[Point]) -> bool {
    ring_edges(a).any(|(a1, a2)| ring_edges(b).any(|(b1, b2)| segments_touch(a1, a2, b1, b2)))
}

/// Crossing-number test against one closed ring. Points on an edge may
/// fall either way.
pub fn point_in_ring(point: &Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (ring[i], ring[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Even-odd containment over a set of rings.
pub fn point_in_rings(point: &Point, rings: &[Vec<Point>]) -> bool {
    rings.iter().filter(|ring| point_in_ring(point, ring)).count() % 2 == 1
}

/// A point, polyline or polygon with its spatial reference.
///
/// Polylines carry one or more paths and polygons one or more rings. Rings
/// are treated as independent outer rings; holes are not modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Point {
        point: Point,
        spatial_reference: SpatialReference,
    },
    Polyline {
        paths: Vec<Vec<Point>>,
        spatial_reference: SpatialReference,
    },
    Polygon {
        rings: Vec<Vec<Point>>,
        spatial_reference: SpatialReference,
    },
}

impl Geometry {
    pub fn point(point: Point, spatial_reference: SpatialReference) -> Self {
        Geometry::Point {
            point,
            spatial_reference,
        }
    }

    pub fn polyline(paths: Vec<Vec<Point>>, spatial_reference: SpatialReference) -> Self {
        Geometry::Polyline {
            paths,
            spatial_reference,
        }
    }

    /// Creates a polygon, dropping any duplicated closing vertex per ring.
    pub fn polygon(rings: Vec<Vec<Point>>, spatial_reference: SpatialReference) -> Self {
        Geometry::Polygon {
            rings: rings.into_iter().map(strip_closing_vertex).collect(),
            spatial_reference,
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::Polyline { .. } => GeometryType::Polyline,
            Geometry::Polygon { .. } => GeometryType::Polygon,
        }
    }

    pub fn spatial_reference(&self) -> SpatialReference {
        match self {
            Geometry::Point {
                spatial_reference, ..
            }
            | Geometry::Polyline {
                spatial_reference, ..
            }
            | Geometry::Polygon {
                spatial_reference, ..
            } => *spatial_reference,
        }
    }

    /// Vertex lists of every part. A point is a single part of one vertex.
    pub fn parts(&self) -> Vec<&[Point]> {
        match self {
            Geometry::Point { point, .. } => vec![std::slice::from_ref(point)],
            Geometry::Polyline { paths, .. } => paths.iter().map(Vec::as_slice).collect(),
            Geometry::Polygon { rings, .. } => rings.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 1,
            Geometry::Polyline { paths, .. } => paths.len(),
            Geometry::Polygon { rings, .. } => rings.len(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.parts().iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::from_points(self.parts().into_iter().flatten())
    }

    /// Total unsigned area of all rings; zero for points and polylines.
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Polygon { rings, .. } => {
                rings.iter().map(|r| ring_signed_area(r).abs()).sum()
            }
            _ => 0.0,
        }
    }

    /// Total path length, or ring perimeter for polygons.
    pub fn length(&self) -> f64 {
        match self {
            Geometry::Point { .. } => 0.0,
            Geometry::Polyline { paths, .. } => paths.iter().map(|p| path_length(p)).sum(),
            Geometry::Polygon { rings, .. } => rings
                .iter()
                .filter(|r| !r.is_empty())
                .map(|r| path_length(r) + r[r.len() - 1].distance_to(&r[0]))
                .sum(),
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        let shift = |p: &mut Point| {
            p.x += dx;
            p.y += dy;
        };
        match self {
            Geometry::Point { point, .. } => shift(point),
            Geometry::Polyline { paths, .. } => paths.iter_mut().flatten().for_each(shift),
            Geometry::Polygon { rings, .. } => rings.iter_mut().flatten().for_each(shift),
        }
    }

    pub fn vertex(&self, part: usize, index: usize) -> Option<Point> {
        match self {
            Geometry::Point { point, .. } => (part == 0 && index == 0).then_some(*point),
            Geometry::Polyline { paths, .. } => paths.get(part)?.get(index).copied(),
            Geometry::Polygon { rings, .. } => rings.get(part)?.get(index).copied(),
        }
    }

    /// Moves one vertex. Returns false when the address does not exist.
    pub fn set_vertex(&mut self, part: usize, index: usize, value: Point) -> bool {
        let slot = match self {
            Geometry::Point { point, .. } => (part == 0 && index == 0).then_some(point),
            Geometry::Polyline { paths, .. } => {
                paths.get_mut(part).and_then(|p| p.get_mut(index))
            }
            Geometry::Polygon { rings, .. } => {
                rings.get_mut(part).and_then(|r| r.get_mut(index))
            }
        };
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Structural equality within `tolerance` on every coordinate.
    pub fn approx_eq(&self, other: &Geometry, tolerance: f64) -> bool {
        if self.geometry_type() != other.geometry_type()
            || self.spatial_reference() != other.spatial_reference()
        {
            return false;
        }
        let a = self.parts();
        let b = other.parts();
        a.len() == b.len()
            && a.iter().zip(b.iter()).all(|(pa, pb)| {
                pa.len() == pb.len()
                    && pa
                        .iter()
                        .zip(pb.iter())
                        .all(|(p, q)| p.approx_eq(q, tolerance))
            })
    }
}
