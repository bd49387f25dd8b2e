//! Data models for SiteSketch
//!
//! Geometry primitives, the planning boundary and the identifiers used to
//! address graphics, layers and operations.

pub mod boundary;
pub mod geometry;
pub mod ids;

pub use boundary::BoundaryPolygon;
pub use geometry::{Extent, Geometry, GeometryType, Point, SpatialReference};
pub use ids::{GraphicId, LayerId, OperationId};
