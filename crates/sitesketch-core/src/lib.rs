//! # SiteSketch Core
//!
//! Core types and utilities shared by the SiteSketch crates.
//! Provides the geometry data model, the planning boundary, identifiers,
//! the error taxonomy and the application event bus.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod types;

pub use data::{
    BoundaryPolygon, Extent, Geometry, GeometryType, GraphicId, LayerId, OperationId, Point,
    SpatialReference,
};

pub use error::{EditorError, Error, GeometryError, Result};

// Re-export event bus for convenience
pub use event_bus::{
    AppEvent, ErrorEvent, EventBus, EventBusConfig, EventCategory, EventFilter,
    LayerEvent, OperationEvent, OutcomeKind, SettingsEvent, SubscriptionId,
};

// Re-export type aliases for convenience
pub use types::{shared, LocalCallback, Shared, SharedVec};
