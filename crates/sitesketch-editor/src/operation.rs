//! Operations
//!
//! An [`Operation`] is one create or update request from start to its
//! terminal outcome. It carries the boundary snapshot taken when it started
//! and a single-assignment outcome that can be awaited.

use crate::model::{Graphic, SketchKind, Symbol};
use serde::Serialize;
use sitesketch_core::{BoundaryPolygon, GraphicId, LayerId, OperationId, OutcomeKind};
use std::cell::Cell;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    Pending,
    Sketching,
    Completed,
    Cancelled,
    Interrupted,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Completed | OperationState::Cancelled | OperationState::Interrupted
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: OperationState) -> bool {
        use OperationState::*;
        matches!(
            (self, next),
            (Pending, Sketching)
                | (Pending, Cancelled)
                | (Pending, Interrupted)
                | (Sketching, Completed)
                | (Sketching, Cancelled)
                | (Sketching, Interrupted)
        )
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationState::Pending => "pending",
            OperationState::Sketching => "sketching",
            OperationState::Completed => "completed",
            OperationState::Cancelled => "cancelled",
            OperationState::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// What an operation is doing
#[derive(Debug, Clone, PartialEq)]
pub enum OperationMode {
    /// Sketch a new graphic
    Create { kind: SketchKind, symbol: Symbol },
    /// Edit an existing graphic in place
    Update {
        graphic: GraphicId,
        anchor_index: usize,
    },
}

impl OperationMode {
    /// Short label for logs and UI, e.g. `create polygon`
    pub fn label(&self) -> String {
        match self {
            OperationMode::Create { kind, .. } => format!("create {}", kind),
            OperationMode::Update { .. } => "update".to_string(),
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, OperationMode::Update { .. })
    }
}

/// Payload delivered to completion callbacks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedEdit {
    pub operation: OperationId,
    pub layer: LayerId,
    /// Clipped graphics as written to the layer; empty when the shape fell
    /// outside the boundary.
    pub graphics: Vec<Graphic>,
    /// Index of the replaced graphic in update mode
    pub anchor_index: Option<usize>,
}

/// Terminal outcome of an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Completed(CompletedEdit),
    Cancelled,
    Interrupted,
}

impl OperationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            OperationOutcome::Completed(_) => OutcomeKind::Completed,
            OperationOutcome::Cancelled => OutcomeKind::Cancelled,
            OperationOutcome::Interrupted => OutcomeKind::Interrupted,
        }
    }

    fn state(&self) -> OperationState {
        match self {
            OperationOutcome::Completed(_) => OperationState::Completed,
            OperationOutcome::Cancelled => OperationState::Cancelled,
            OperationOutcome::Interrupted => OperationState::Interrupted,
        }
    }

    pub fn completed(&self) -> Option<&CompletedEdit> {
        match self {
            OperationOutcome::Completed(edit) => Some(edit),
            _ => None,
        }
    }
}

/// Cloneable snapshot of an operation for UI binding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationInfo {
    pub id: OperationId,
    pub mode: String,
    pub layer: LayerId,
    pub state: OperationState,
}

/// A single create or update request.
pub struct Operation {
    id: OperationId,
    mode: OperationMode,
    target_layer: LayerId,
    boundary: Option<Arc<BoundaryPolygon>>,
    state: Cell<OperationState>,
    sketch_valid: Cell<bool>,
    outcome: watch::Sender<Option<OperationOutcome>>,
}

impl Operation {
    pub fn new(
        id: OperationId,
        mode: OperationMode,
        target_layer: LayerId,
        boundary: Option<Arc<BoundaryPolygon>>,
    ) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            id,
            mode,
            target_layer,
            boundary,
            state: Cell::new(OperationState::Pending),
            sketch_valid: Cell::new(true),
            outcome,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn mode(&self) -> &OperationMode {
        &self.mode
    }

    pub fn target_layer(&self) -> &LayerId {
        &self.target_layer
    }

    /// Boundary captured when the operation was created
    pub fn boundary(&self) -> Option<&Arc<BoundaryPolygon>> {
        self.boundary.as_ref()
    }

    pub fn anchor_index(&self) -> Option<usize> {
        match self.mode {
            OperationMode::Update { anchor_index, .. } => Some(anchor_index),
            OperationMode::Create { .. } => None,
        }
    }

    pub fn state(&self) -> OperationState {
        self.state.get()
    }

    pub fn is_settled(&self) -> bool {
        self.state.get().is_terminal()
    }

    /// Pending -> Sketching. Returns false if the operation already moved on.
    pub fn begin_sketching(&self) -> bool {
        self.transition(OperationState::Sketching)
    }

    /// Assigns the terminal outcome. Only the first call has any effect.
    pub fn settle(&self, outcome: OperationOutcome) -> bool {
        if !self.transition(outcome.state()) {
            tracing::debug!(
                "{} already {}, ignoring {}",
                self.id,
                self.state.get(),
                outcome.kind()
            );
            return false;
        }
        tracing::info!("{} {}", self.id, outcome.kind());
        self.outcome.send_replace(Some(outcome));
        true
    }

    /// The outcome, if already settled
    pub fn outcome_now(&self) -> Option<OperationOutcome> {
        self.outcome.borrow().clone()
    }

    /// Waits for the terminal outcome.
    pub async fn outcome(&self) -> OperationOutcome {
        let mut rx = self.outcome.subscribe();
        let settled = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or(OperationOutcome::Interrupted),
            Err(_) => OperationOutcome::Interrupted,
        };
        settled
    }

    pub fn info(&self) -> OperationInfo {
        OperationInfo {
            id: self.id,
            mode: self.mode.label(),
            layer: self.target_layer.clone(),
            state: self.state.get(),
        }
    }

    /// Whether the sketch in progress would produce a valid shape
    pub fn sketch_valid(&self) -> bool {
        self.sketch_valid.get()
    }

    pub fn set_sketch_valid(&self, valid: bool) {
        self.sketch_valid.set(valid);
    }

    fn transition(&self, next: OperationState) -> bool {
        let current = self.state.get();
        if !current.can_transition_to(next) {
            return false;
        }
        self.state.set(next);
        true
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("target_layer", &self.target_layer)
            .field("state", &self.state.get())
            .finish()
    }
}
