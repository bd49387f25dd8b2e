use super::symbol::Symbol;
use serde::{Deserialize, Serialize};
use sitesketch_core::GeometryType;
use std::fmt;

/// What a create session sketches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SketchKind {
    Point,
    Polyline,
    Polygon,
    /// A mesh is placed as a point carrying a mesh symbol.
    Mesh,
}

impl SketchKind {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            SketchKind::Point | SketchKind::Mesh => GeometryType::Point,
            SketchKind::Polyline => GeometryType::Polyline,
            SketchKind::Polygon => GeometryType::Polygon,
        }
    }

    /// Vertices needed before the sketch may complete
    pub fn min_vertices(&self) -> usize {
        match self {
            SketchKind::Point | SketchKind::Mesh => 1,
            SketchKind::Polyline => 2,
            SketchKind::Polygon => 3,
        }
    }

    /// Whether a single click places the whole shape
    pub fn is_single_click(&self) -> bool {
        matches!(self, SketchKind::Point | SketchKind::Mesh)
    }

    pub fn supports(&self, symbol: &Symbol) -> bool {
        matches!(
            (self, symbol),
            (SketchKind::Point, Symbol::Marker { .. })
                | (SketchKind::Polyline, Symbol::Line { .. })
                | (SketchKind::Polygon, Symbol::Fill { .. })
                | (SketchKind::Mesh, Symbol::Mesh { .. })
        )
    }
}

impl fmt::Display for SketchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchKind::Point => write!(f, "point"),
            SketchKind::Polyline => write!(f, "polyline"),
            SketchKind::Polygon => write!(f, "polygon"),
            SketchKind::Mesh => write!(f, "mesh"),
        }
    }
}
