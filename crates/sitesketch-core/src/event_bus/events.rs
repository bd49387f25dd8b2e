//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so they can be logged and replayed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{LayerId, OperationId};

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Operation lifecycle
    Operation(OperationEvent),
    /// Layer content changes
    Layer(LayerEvent),
    /// Settings and configuration
    Settings(SettingsEvent),
    /// Error and diagnostic events
    Error(ErrorEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Operation(_) => EventCategory::Operation,
            AppEvent::Layer(_) => EventCategory::Layer,
            AppEvent::Settings(_) => EventCategory::Settings,
            AppEvent::Error(_) => EventCategory::Error,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Operation(e) => e.description(),
            AppEvent::Layer(e) => e.description(),
            AppEvent::Settings(e) => e.description(),
            AppEvent::Error(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Operation lifecycle events.
    Operation,
    /// Layer content events.
    Layer,
    /// Settings and configuration events.
    Settings,
    /// Error and diagnostic events.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Operation => write!(f, "Operation"),
            EventCategory::Layer => write!(f, "Layer"),
            EventCategory::Settings => write!(f, "Settings"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// Terminal outcome of an operation, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Completed,
    Cancelled,
    Interrupted,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Completed => write!(f, "completed"),
            OutcomeKind::Cancelled => write!(f, "cancelled"),
            OutcomeKind::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Operation lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationEvent {
    /// An operation took control and began sketching.
    Started {
        /// Operation sequence number.
        operation: OperationId,
        /// Mode label, e.g. `create polygon` or `update`.
        mode: String,
        /// Target layer.
        layer: LayerId,
    },
    /// An operation reached a terminal state.
    Settled {
        /// Operation sequence number.
        operation: OperationId,
        /// Terminal outcome.
        outcome: OutcomeKind,
        /// Number of graphics committed (zero unless completed).
        graphics: usize,
    },
}

impl OperationEvent {
    /// Get a short description of this event
    pub fn description(&self) -> String {
        match self {
            OperationEvent::Started {
                operation,
                mode,
                layer,
            } => format!("{} started ({}) on {}", operation, mode, layer),
            OperationEvent::Settled {
                operation,
                outcome,
                graphics,
            } => format!("{} {} with {} graphic(s)", operation, outcome, graphics),
        }
    }
}

/// Layer content events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerEvent {
    /// Clipped graphics were written to a layer.
    GraphicsCommitted {
        /// Layer written to.
        layer: LayerId,
        /// Index of the first committed graphic.
        index: usize,
        /// Number of graphics committed.
        count: usize,
    },
    /// A graphic was removed with the delete key.
    GraphicDeleted {
        /// Layer the graphic was removed from.
        layer: LayerId,
    },
    /// Every graphic of a layer was re-normalized against the boundary.
    Reclipped {
        /// Layer rewritten.
        layer: LayerId,
        /// Graphics whose geometry changed.
        changed: usize,
        /// Graphics dropped entirely.
        dropped: usize,
    },
}

impl LayerEvent {
    /// Get a short description of this event
    pub fn description(&self) -> String {
        match self {
            LayerEvent::GraphicsCommitted {
                layer,
                index,
                count,
            } => format!("{} graphic(s) committed to {} at {}", count, layer, index),
            LayerEvent::GraphicDeleted { layer } => format!("Graphic deleted from {}", layer),
            LayerEvent::Reclipped {
                layer,
                changed,
                dropped,
            } => format!(
                "{} reclipped: {} changed, {} dropped",
                layer, changed, dropped
            ),
        }
    }
}

/// Settings events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingsEvent {
    /// Settings were loaded from disk.
    Loaded {
        /// File the settings came from, if any.
        path: Option<PathBuf>,
    },
    /// The planning boundary was replaced or removed.
    BoundaryChanged {
        /// Number of rings in the new boundary, zero when removed.
        rings: usize,
    },
}

impl SettingsEvent {
    /// Get a short description of this event
    pub fn description(&self) -> String {
        match self {
            SettingsEvent::Loaded { path: Some(path) } => {
                format!("Settings loaded from {}", path.display())
            }
            SettingsEvent::Loaded { path: None } => "Default settings loaded".to_string(),
            SettingsEvent::BoundaryChanged { rings: 0 } => "Boundary removed".to_string(),
            SettingsEvent::BoundaryChanged { rings } => {
                format!("Boundary changed ({} ring(s))", rings)
            }
        }
    }
}

/// Error and diagnostic events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorEvent {
    /// A request was rejected before any operation was created.
    Precondition {
        /// Error message.
        message: String,
    },
    /// A shape was dropped by the clipping step.
    ShapeDropped {
        /// Layer the shape was headed for.
        layer: LayerId,
        /// Why it was dropped.
        reason: String,
    },
}

impl ErrorEvent {
    /// Get a short description of this event
    pub fn description(&self) -> String {
        match self {
            ErrorEvent::Precondition { message } => format!("Precondition failed: {}", message),
            ErrorEvent::ShapeDropped { layer, reason } => {
                format!("Shape for {} dropped: {}", layer, reason)
            }
        }
    }
}
