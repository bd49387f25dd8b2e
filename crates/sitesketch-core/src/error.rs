//! Error handling for SiteSketch
//!
//! Provides the error types shared by every layer of the editor:
//! - Editor errors (precondition violations reported to the requester)
//! - Geometry errors (clipping failures, absorbed locally by the editor)
//!
//! Interruption and cancellation of an operation are outcomes, not errors,
//! and never appear here. All error types use `thiserror`.

use thiserror::Error;

/// Editor precondition error
///
/// Reported synchronously to whoever requested an operation. When one of
/// these is returned no operation was created and the active one (if any)
/// was left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// No view surface is bound to the editor
    #[error("No view bound to the editor")]
    NoView,

    /// The requested target layer is not registered with the editor
    #[error("Target layer not found: {layer}")]
    NoTargetLayer {
        /// The layer identifier that was requested.
        layer: String,
    },

    /// The geometry type cannot be drawn with the given symbol
    #[error("Unsupported combination: {kind} cannot be drawn with a {symbol} symbol")]
    UnsupportedCombination {
        /// The requested sketch kind.
        kind: String,
        /// The symbol family supplied.
        symbol: String,
    },

    /// The graphic is not owned by the layer it was requested from
    #[error("Graphic {graphic} is not owned by layer {layer}")]
    GraphicNotOwned {
        /// The graphic identifier.
        graphic: String,
        /// The layer identifier.
        layer: String,
    },

    /// The anchor index does not address a graphic in the layer
    #[error("Anchor index {index} out of range for layer of length {len}")]
    AnchorOutOfRange {
        /// The requested anchor index.
        index: usize,
        /// The current layer length.
        len: usize,
    },

    /// A layer-wide rewrite was requested while an operation is live
    #[error("Operation {operation} is in progress")]
    OperationInProgress {
        /// The live operation id.
        operation: u64,
    },
}

/// Geometry error type
///
/// Represents failures of the clipping step. The editor treats every one of
/// these as an empty intersection: the shape is dropped, nothing is thrown.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The geometry and the boundary use different spatial references
    #[error("Spatial reference mismatch: boundary is {expected}, geometry is {actual}")]
    SpatialReferenceMismatch {
        /// WKID of the boundary.
        expected: u32,
        /// WKID of the geometry.
        actual: u32,
    },

    /// A polygon ring crosses itself
    #[error("Polygon ring {ring} is self-intersecting")]
    SelfIntersecting {
        /// Index of the offending ring.
        ring: usize,
    },

    /// Geometry has too few distinct vertices or no extent
    #[error("Degenerate geometry: {reason}")]
    Degenerate {
        /// Why the geometry is degenerate.
        reason: String,
    },

    /// Two boundary rings cross, touch or nest
    #[error("Boundary rings {first} and {second} overlap; rings must be disjoint")]
    OverlappingRings {
        /// Index of the first ring.
        first: usize,
        /// Index of the second ring.
        second: usize,
    },

    /// The boundary polygon could not be constructed
    #[error("Invalid boundary: {reason}")]
    InvalidBoundary {
        /// Why the boundary was rejected.
        reason: String,
    },
}

/// Main error type for SiteSketch
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Editor precondition error
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a precondition violation surfaced to the UI
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::Editor(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
