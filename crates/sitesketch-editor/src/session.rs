//! Sketch sessions
//!
//! A [`SketchSession`] turns captured input into one graphic. It is created
//! active (input focus is captured in the constructor) and consumed by
//! [`SketchSession::run`], which resolves to a [`SessionOutcome`].
//!
//! Teardown lives in one place: removing the create-mode preview, restoring
//! the original geometry of a cancelled update and releasing input focus.
//! It runs when `run` returns, or on drop if the session never finished.

use crate::arbiter::{CancelReason, CancellationSignal};
use crate::geometry_ops::{dedupe, dedupe_ring, geometry_hit, nearest_vertex, ring_is_simple};
use crate::input::{InputCapture, InputEvent, KeyAction, KeyMap, PointerButton, ScreenPoint};
use crate::layer::LayerRef;
use crate::model::{Attributes, Graphic, SketchKind, Symbol};
use crate::view::MapView;
use sitesketch_core::{EditorError, Geometry, GraphicId, LayerId, Point, SpatialReference};
use std::cell::RefCell;
use std::rc::Rc;

/// Why a session ended without a graphic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelCause {
    /// The cancel key was pressed
    Escape,
    /// The graphic being updated was deleted
    Deleted,
    /// Another operation took control
    Interrupted,
    /// Cancelled from outside the session
    Cancelled,
    /// Input focus was taken without a cancellation signal
    InputClosed,
    /// The graphic being updated left its layer
    Detached,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The sketched graphic, unclipped
    Complete(Graphic),
    Cancel(CancelCause),
}

/// Per-session input settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub keys: KeyMap,
    /// Grab distance for vertices and graphic bodies, in map units
    pub vertex_tolerance: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            keys: KeyMap::default(),
            vertex_tolerance: 1.0,
        }
    }
}

/// Listener for mid-sketch validity changes
pub type ValidityListener = Rc<dyn Fn(bool)>;

/// Puts an edited graphic's geometry back to what it was when its update
/// session started.
///
/// Clones share one slot, so the restore happens at most once whichever
/// clone runs it first. A disarmed handle does nothing.
#[derive(Clone)]
pub struct PendingRestore {
    slot: Rc<RefCell<Option<(LayerRef, GraphicId, Geometry)>>>,
}

impl PendingRestore {
    fn new(layer: LayerRef, graphic: GraphicId, original: Geometry) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some((layer, graphic, original)))),
        }
    }

    /// Writes the original geometry back. Returns false if already spent.
    pub fn run(&self) -> bool {
        let Some((layer, graphic, original)) = self.slot.borrow_mut().take() else {
            return false;
        };
        match layer.try_borrow_mut() {
            Ok(mut layer) => {
                if let Some(target) = layer.get_mut(graphic) {
                    target.geometry = original;
                    tracing::debug!("Restored {} on {}", graphic, layer.id());
                }
            }
            Err(_) => tracing::warn!("Layer busy, {} not restored", graphic),
        }
        true
    }

    /// Drops the pending restore without applying it.
    pub fn disarm(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_armed(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl std::fmt::Debug for PendingRestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRestore")
            .field("armed", &self.is_armed())
            .finish()
    }
}

enum Step {
    Continue,
    Complete(Graphic),
    Cancel(CancelCause),
}

enum Wake {
    Signal(CancelReason),
    Input(Option<InputEvent>),
}

struct CreateState {
    kind: SketchKind,
    symbol: Symbol,
    attributes: Attributes,
    vertices: Vec<Point>,
    hover: Option<Point>,
    preview: Option<GraphicId>,
}

#[derive(Debug, Clone, Copy)]
enum Drag {
    Vertex { part: usize, index: usize },
    Move { last: Point },
}

struct UpdateState {
    graphic: GraphicId,
    restore: PendingRestore,
    drag: Option<Drag>,
    dragged: bool,
    suppress_click: bool,
}

enum SessionState {
    Create(CreateState),
    Update(UpdateState),
}

/// Interactive sketch or edit of a single graphic.
pub struct SketchSession {
    view: Rc<dyn MapView>,
    layer: LayerRef,
    layer_id: LayerId,
    capture: InputCapture,
    options: SessionOptions,
    state: SessionState,
    on_validity: Option<ValidityListener>,
    last_valid: bool,
    finished: bool,
}

impl SketchSession {
    /// Starts sketching a new graphic of `kind` into `layer`.
    pub fn create(
        view: Rc<dyn MapView>,
        layer: LayerRef,
        kind: SketchKind,
        symbol: Symbol,
        attributes: Attributes,
        options: SessionOptions,
    ) -> Self {
        let layer_id = layer.borrow().id().clone();
        let capture = view.input().capture();
        tracing::debug!("Create session for {} on {}", kind, layer_id);
        Self {
            view,
            layer,
            layer_id,
            capture,
            options,
            state: SessionState::Create(CreateState {
                kind,
                symbol,
                attributes,
                vertices: Vec::new(),
                hover: None,
                preview: None,
            }),
            on_validity: None,
            last_valid: true,
            finished: false,
        }
    }

    /// Starts editing `graphic` in place. The graphic must be owned by `layer`.
    pub fn update(
        view: Rc<dyn MapView>,
        layer: LayerRef,
        graphic: GraphicId,
        options: SessionOptions,
    ) -> Result<Self, EditorError> {
        let (layer_id, original) = {
            let layer = layer.borrow();
            let original = layer
                .get(graphic)
                .map(|g| g.geometry.clone())
                .ok_or_else(|| EditorError::GraphicNotOwned {
                    graphic: graphic.to_string(),
                    layer: layer.id().to_string(),
                })?;
            (layer.id().clone(), original)
        };
        let restore = PendingRestore::new(layer.clone(), graphic, original);
        let capture = view.input().capture();
        tracing::debug!("Update session for {} on {}", graphic, layer_id);
        Ok(Self {
            view,
            layer,
            layer_id,
            capture,
            options,
            state: SessionState::Update(UpdateState {
                graphic,
                restore,
                drag: None,
                dragged: false,
                suppress_click: false,
            }),
            on_validity: None,
            last_valid: true,
            finished: false,
        })
    }

    /// Report validity changes of the sketch in progress.
    pub fn on_validity(mut self, listener: ValidityListener) -> Self {
        self.on_validity = Some(listener);
        self
    }

    pub fn layer_id(&self) -> &LayerId {
        &self.layer_id
    }

    /// Restore handle of an update session, `None` in create mode.
    pub fn pending_restore(&self) -> Option<PendingRestore> {
        match &self.state {
            SessionState::Update(update) => Some(update.restore.clone()),
            SessionState::Create(_) => None,
        }
    }

    /// Drives the session until it completes or is cancelled.
    ///
    /// Cancellation is checked before every input event.
    pub async fn run(mut self, mut signal: CancellationSignal) -> SessionOutcome {
        let outcome = loop {
            let wake = tokio::select! {
                biased;
                reason = signal.cancelled() => Wake::Signal(reason),
                event = self.capture.next() => Wake::Input(event),
            };

            let step = match wake {
                Wake::Signal(CancelReason::Interrupted) => Step::Cancel(CancelCause::Interrupted),
                Wake::Signal(CancelReason::Cancelled) => Step::Cancel(CancelCause::Cancelled),
                Wake::Input(None) => Step::Cancel(CancelCause::InputClosed),
                Wake::Input(Some(event)) => self.handle(event),
            };

            match step {
                Step::Continue => {}
                Step::Complete(graphic) => break SessionOutcome::Complete(graphic),
                Step::Cancel(cause) => break SessionOutcome::Cancel(cause),
            }
        };

        tracing::debug!("Session on {} ended: {:?}", self.layer_id, outcome);
        self.finalize(Some(&outcome));
        outcome
    }

    fn handle(&mut self, event: InputEvent) -> Step {
        tracing::trace!("Session input {:?}", event);
        if let InputEvent::KeyDown { key } = &event {
            return match self.options.keys.action(key) {
                Some(KeyAction::Cancel) => Step::Cancel(CancelCause::Escape),
                Some(action) => self.handle_key(action),
                None => Step::Continue,
            };
        }
        match self.state {
            SessionState::Create(_) => self.handle_create(event),
            SessionState::Update(_) => self.handle_update(event),
        }
    }

    fn handle_key(&mut self, action: KeyAction) -> Step {
        match (&self.state, action) {
            (SessionState::Create(_), KeyAction::Complete) => match self.finish_create() {
                Some(graphic) => Step::Complete(graphic),
                None => {
                    tracing::debug!("Sketch incomplete, ignoring complete request");
                    Step::Continue
                }
            },
            (SessionState::Update(_), KeyAction::Complete) => self.finish_update(),
            (SessionState::Update(update), KeyAction::Delete) => {
                let id = update.graphic;
                if self.layer.borrow_mut().remove(id).is_none() {
                    return Step::Cancel(CancelCause::Detached);
                }
                tracing::info!("Deleted {} from {}", id, self.layer_id);
                Step::Cancel(CancelCause::Deleted)
            }
            _ => Step::Continue,
        }
    }

    fn map_point(&self, at: ScreenPoint) -> Option<Point> {
        self.view.to_map(at)
    }

    fn handle_create(&mut self, event: InputEvent) -> Step {
        match event {
            InputEvent::Click {
                at,
                button: PointerButton::Primary,
            } => {
                let Some(point) = self.map_point(at) else {
                    return Step::Continue;
                };
                if self.create_state().is_some_and(|c| c.kind.is_single_click()) {
                    if let Some(create) = self.create_state_mut() {
                        create.vertices = vec![point];
                    }
                    return self.finish_create().map_or(Step::Continue, Step::Complete);
                }
                self.push_vertex(point);
                Step::Continue
            }
            InputEvent::DoubleClick { at } => {
                let Some(point) = self.map_point(at) else {
                    return Step::Continue;
                };
                if self.create_state().is_some_and(|c| c.kind.is_single_click()) {
                    if let Some(create) = self.create_state_mut() {
                        create.vertices = vec![point];
                    }
                } else {
                    self.push_vertex(point);
                }
                self.finish_create().map_or(Step::Continue, Step::Complete)
            }
            InputEvent::PointerMove { at } => {
                let Some(point) = self.map_point(at) else {
                    return Step::Continue;
                };
                let tracking = self
                    .create_state()
                    .is_some_and(|c| !c.kind.is_single_click() && !c.vertices.is_empty());
                if tracking {
                    if let Some(create) = self.create_state_mut() {
                        create.hover = Some(point);
                    }
                    self.sync_preview();
                }
                Step::Continue
            }
            _ => Step::Continue,
        }
    }

    fn push_vertex(&mut self, point: Point) {
        let Some(create) = self.create_state_mut() else {
            return;
        };
        create.hover = None;
        if create
            .vertices
            .last()
            .is_some_and(|last| last.approx_eq(&point, 1e-9))
        {
            return;
        }
        create.vertices.push(point);
        tracing::debug!("Vertex {} at ({}, {})", create.vertices.len(), point.x, point.y);
        self.sync_preview();
    }

    fn create_state(&self) -> Option<&CreateState> {
        match &self.state {
            SessionState::Create(create) => Some(create),
            SessionState::Update(_) => None,
        }
    }

    fn create_state_mut(&mut self) -> Option<&mut CreateState> {
        match &mut self.state {
            SessionState::Create(create) => Some(create),
            SessionState::Update(_) => None,
        }
    }

    fn sketch_geometry(create: &CreateState, vertices: Vec<Point>, sr: SpatialReference) -> Geometry {
        match create.kind {
            SketchKind::Point | SketchKind::Mesh => {
                Geometry::point(vertices.first().copied().unwrap_or_default(), sr)
            }
            SketchKind::Polyline => Geometry::polyline(vec![vertices], sr),
            SketchKind::Polygon => Geometry::polygon(vec![vertices], sr),
        }
    }

    /// Mirrors the vertices (plus hover) into a preview graphic on the layer.
    fn sync_preview(&mut self) {
        let sr = self.view.spatial_reference();
        let Some(create) = self.create_state() else {
            return;
        };
        let mut vertices = create.vertices.clone();
        vertices.extend(create.hover);
        if vertices.is_empty() {
            return;
        }
        let valid = match create.kind {
            SketchKind::Polygon if vertices.len() >= 3 => {
                ring_is_simple(&dedupe_ring(&vertices, 1e-9))
            }
            _ => true,
        };
        let geometry = Self::sketch_geometry(create, vertices, sr);

        let added = match create.preview {
            Some(id) => {
                if let Some(graphic) = self.layer.borrow_mut().get_mut(id) {
                    graphic.geometry = geometry;
                }
                None
            }
            None => {
                let graphic = Graphic::new(geometry, create.symbol.clone());
                let id = graphic.id();
                self.layer.borrow_mut().add(graphic);
                Some(id)
            }
        };
        if let (Some(id), Some(create)) = (added, self.create_state_mut()) {
            create.preview = Some(id);
        }
        self.report_validity(valid);
    }

    fn finish_create(&self) -> Option<Graphic> {
        let sr = self.view.spatial_reference();
        let create = self.create_state()?;
        let vertices = dedupe(&create.vertices, 1e-9);
        if vertices.len() < create.kind.min_vertices() {
            return None;
        }
        let geometry = Self::sketch_geometry(create, vertices, sr);
        Some(Graphic::new(geometry, create.symbol.clone()).with_attributes(create.attributes.clone()))
    }

    fn update_state_mut(&mut self) -> Option<&mut UpdateState> {
        match &mut self.state {
            SessionState::Update(update) => Some(update),
            SessionState::Create(_) => None,
        }
    }

    fn current_geometry(&self, id: GraphicId) -> Option<Geometry> {
        self.layer.borrow().get(id).map(|g| g.geometry.clone())
    }

    fn handle_update(&mut self, event: InputEvent) -> Step {
        let tolerance = self.options.vertex_tolerance;
        let Some(id) = self.update_state_mut().map(|u| u.graphic) else {
            return Step::Continue;
        };

        match event {
            InputEvent::PointerDown {
                at,
                button: PointerButton::Primary,
            } => {
                let Some(point) = self.map_point(at) else {
                    return Step::Continue;
                };
                let Some(geometry) = self.current_geometry(id) else {
                    return Step::Cancel(CancelCause::Detached);
                };
                let drag = match nearest_vertex(&geometry, &point, tolerance) {
                    Some((part, index)) => Some(Drag::Vertex { part, index }),
                    None if geometry_hit(&geometry, &point, tolerance) => {
                        Some(Drag::Move { last: point })
                    }
                    None => None,
                };
                if let Some(update) = self.update_state_mut() {
                    tracing::debug!("Drag start {:?}", drag);
                    update.drag = drag;
                    update.dragged = false;
                }
                Step::Continue
            }
            InputEvent::PointerMove { at } => {
                let Some(drag) = self.update_state_mut().and_then(|u| u.drag) else {
                    return Step::Continue;
                };
                let Some(point) = self.map_point(at) else {
                    return Step::Continue;
                };
                let valid = {
                    let mut layer = self.layer.borrow_mut();
                    let Some(graphic) = layer.get_mut(id) else {
                        tracing::warn!("{} left {} mid-drag", id, self.layer_id);
                        return Step::Cancel(CancelCause::Detached);
                    };
                    match drag {
                        Drag::Vertex { part, index } => {
                            graphic.geometry.set_vertex(part, index, point);
                        }
                        Drag::Move { last } => {
                            graphic.geometry.translate(point.x - last.x, point.y - last.y);
                        }
                    }
                    match &graphic.geometry {
                        Geometry::Polygon { rings, .. } => rings.iter().all(|r| ring_is_simple(r)),
                        _ => true,
                    }
                };
                if let Some(update) = self.update_state_mut() {
                    update.dragged = true;
                    if let Some(Drag::Move { last }) = &mut update.drag {
                        *last = point;
                    }
                }
                self.report_validity(valid);
                Step::Continue
            }
            InputEvent::PointerUp { .. } => {
                if let Some(update) = self.update_state_mut() {
                    if update.drag.take().is_some() && update.dragged {
                        update.suppress_click = true;
                    }
                    update.dragged = false;
                }
                Step::Continue
            }
            InputEvent::Click {
                at,
                button: PointerButton::Primary,
            } => {
                if let Some(update) = self.update_state_mut() {
                    if std::mem::take(&mut update.suppress_click) {
                        return Step::Continue;
                    }
                }
                let Some(point) = self.map_point(at) else {
                    return Step::Continue;
                };
                let Some(geometry) = self.current_geometry(id) else {
                    return Step::Cancel(CancelCause::Detached);
                };
                if geometry_hit(&geometry, &point, tolerance) {
                    Step::Continue
                } else {
                    self.finish_update()
                }
            }
            InputEvent::DoubleClick { .. } => self.finish_update(),
            _ => Step::Continue,
        }
    }

    fn finish_update(&self) -> Step {
        let SessionState::Update(update) = &self.state else {
            return Step::Continue;
        };
        let id = update.graphic;
        match self.layer.borrow().get(id) {
            Some(graphic) => Step::Complete(graphic.clone()),
            None => Step::Cancel(CancelCause::Detached),
        }
    }

    fn report_validity(&mut self, valid: bool) {
        if valid == self.last_valid {
            return;
        }
        self.last_valid = valid;
        tracing::debug!("Sketch on {} is {}", self.layer_id, if valid { "valid" } else { "invalid" });
        if let Some(listener) = &self.on_validity {
            listener(valid);
        }
    }

    fn finalize(&mut self, outcome: Option<&SessionOutcome>) {
        if self.finished {
            return;
        }
        self.finished = true;

        match &mut self.state {
            SessionState::Create(create) => {
                if let Some(id) = create.preview.take() {
                    if let Ok(mut layer) = self.layer.try_borrow_mut() {
                        layer.remove(id);
                    }
                }
            }
            SessionState::Update(update) => {
                let keep = matches!(
                    outcome,
                    Some(SessionOutcome::Complete(_))
                        | Some(SessionOutcome::Cancel(CancelCause::Deleted))
                );
                if keep {
                    update.restore.disarm();
                } else {
                    update.restore.run();
                }
            }
        }

        self.capture.release();
    }
}

impl Drop for SketchSession {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("Session on {} dropped while active", self.layer_id);
            self.finalize(None);
        }
    }
}
