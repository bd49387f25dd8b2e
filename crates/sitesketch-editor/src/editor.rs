//! Editor
//!
//! The [`Editor`] validates requests, arbitrates control, drives one
//! [`SketchSession`] per operation on a local task and writes the clipped
//! result back to the target layer.
//!
//! Everything here is single-threaded. `create`, `update`, `handle_click`,
//! `listen` and a deferred `reclip_when_idle` spawn with
//! `tokio::task::spawn_local` and must be called from inside a
//! `tokio::task::LocalSet`.

use crate::arbiter::{CancellationSignal, OperationArbiter};
use crate::clipper::GeometryClipper;
use crate::input::{InputEvent, KeyMap, PointerButton, ScreenPoint};
use crate::layer::LayerRef;
use crate::layer_writer::OrderedLayerWriter;
use crate::model::{Attributes, Graphic, SketchKind, Symbol};
use crate::operation::{CompletedEdit, Operation, OperationInfo, OperationMode, OperationOutcome};
use crate::session::{CancelCause, SessionOptions, SessionOutcome, SketchSession};
use crate::view::{FocusTarget, MapView};
use serde::Serialize;
use sitesketch_core::{
    AppEvent, BoundaryPolygon, EditorError, ErrorEvent, EventBus, GraphicId, LayerEvent, LayerId,
    LocalCallback, OperationEvent, OperationId,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Editor behaviour settings
#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub keys: KeyMap,
    /// Vertex and body grab distance in map units
    pub vertex_tolerance: f64,
    /// Focus the target layer or graphic when an operation starts
    pub focus_on_start: bool,
    /// Area/length below which clipped parts are dropped
    pub clip_epsilon: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            keys: KeyMap::default(),
            vertex_tolerance: 1.0,
            focus_on_start: true,
            clip_epsilon: 1e-9,
        }
    }
}

/// Request to sketch a new graphic
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub layer: LayerId,
    pub kind: SketchKind,
    pub symbol: Symbol,
    pub attributes: Attributes,
}

impl CreateRequest {
    pub fn new(layer: impl Into<LayerId>, kind: SketchKind, symbol: Symbol) -> Self {
        Self {
            layer: layer.into(),
            kind,
            symbol,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Result of [`Editor::reclip_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReclipReport {
    pub layers: usize,
    pub changed: usize,
    pub dropped: usize,
}

struct EditorInner {
    options: EditorOptions,
    view: RefCell<Option<Rc<dyn MapView>>>,
    layers: RefCell<Vec<LayerRef>>,
    boundary: RefCell<Option<Arc<BoundaryPolygon>>>,
    arbiter: OperationArbiter,
    next_id: Cell<u64>,
    completion: RefCell<Vec<LocalCallback<CompletedEdit>>>,
    bus: RefCell<Option<Arc<EventBus>>>,
    idle_task: RefCell<Option<JoinHandle<()>>>,
    reclip_pending: Cell<bool>,
}

/// Interactive graphics editor. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Editor {
    inner: Rc<EditorInner>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}

impl Editor {
    pub fn new(options: EditorOptions) -> Self {
        Self {
            inner: Rc::new(EditorInner {
                options,
                view: RefCell::new(None),
                layers: RefCell::new(Vec::new()),
                boundary: RefCell::new(None),
                arbiter: OperationArbiter::new(),
                next_id: Cell::new(0),
                completion: RefCell::new(Vec::new()),
                bus: RefCell::new(None),
                idle_task: RefCell::new(None),
                reclip_pending: Cell::new(false),
            }),
        }
    }

    /// Publish lifecycle events to `bus`
    pub fn with_event_bus(self, bus: Arc<EventBus>) -> Self {
        *self.inner.bus.borrow_mut() = Some(bus);
        self
    }

    pub fn options(&self) -> &EditorOptions {
        &self.inner.options
    }

    pub fn bind_view(&self, view: Rc<dyn MapView>) {
        *self.inner.view.borrow_mut() = Some(view);
    }

    fn view(&self) -> Option<Rc<dyn MapView>> {
        self.inner.view.borrow().clone()
    }

    /// Register a target layer. A layer with the same id is replaced.
    pub fn add_layer(&self, layer: LayerRef) {
        let id = layer.borrow().id().clone();
        let mut layers = self.inner.layers.borrow_mut();
        layers.retain(|l| l.borrow().id() != &id);
        layers.push(layer);
    }

    pub fn layer(&self, id: &LayerId) -> Option<LayerRef> {
        self.inner
            .layers
            .borrow()
            .iter()
            .find(|l| l.borrow().id() == id)
            .cloned()
    }

    pub fn layers(&self) -> Vec<LayerRef> {
        self.inner.layers.borrow().clone()
    }

    /// Boundary for operations started from now on. Running operations keep
    /// the boundary they started with.
    pub fn set_boundary(&self, boundary: Option<Arc<BoundaryPolygon>>) {
        *self.inner.boundary.borrow_mut() = boundary;
    }

    pub fn boundary(&self) -> Option<Arc<BoundaryPolygon>> {
        self.inner.boundary.borrow().clone()
    }

    /// Called once per completed operation, in completion order.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: Fn(&CompletedEdit) + 'static,
    {
        self.inner.completion.borrow_mut().push(Rc::new(callback));
    }

    /// Asks the live operation to cancel
    pub fn cancel(&self) -> bool {
        self.inner.arbiter.cancel_current()
    }

    pub fn current_operation(&self) -> Option<Rc<Operation>> {
        self.inner.arbiter.current_operation()
    }

    pub fn is_active(&self) -> bool {
        self.inner.arbiter.is_active()
    }

    pub fn watch_operation(&self) -> watch::Receiver<Option<OperationInfo>> {
        self.inner.arbiter.subscribe()
    }

    /// Starts sketching a new graphic.
    ///
    /// Any live operation is interrupted. Precondition failures leave it
    /// untouched.
    pub fn create(&self, request: CreateRequest) -> Result<Rc<Operation>, EditorError> {
        let (view, layer) = self.preconditions(&request.layer)?;
        if !request.kind.supports(&request.symbol) {
            return Err(self.reject(EditorError::UnsupportedCombination {
                kind: request.kind.to_string(),
                symbol: request.symbol.family().to_string(),
            }));
        }

        let CreateRequest {
            layer: layer_id,
            kind,
            symbol,
            attributes,
        } = request;
        let operation = self.new_operation(
            OperationMode::Create {
                kind,
                symbol: symbol.clone(),
            },
            layer_id.clone(),
        );
        let signal = self.inner.arbiter.request_control(&operation);
        let session = SketchSession::create(
            Rc::clone(&view),
            layer,
            kind,
            symbol,
            attributes,
            self.session_options(),
        );
        Ok(self.start(operation, session, signal, view, FocusTarget::Layer(layer_id)))
    }

    /// Starts editing `graphic` of layer `layer_id`.
    pub fn update(&self, layer_id: &LayerId, graphic: GraphicId) -> Result<Rc<Operation>, EditorError> {
        let (view, layer) = self.preconditions(layer_id)?;
        let anchor_index = layer.borrow().index_of(graphic).ok_or_else(|| {
            self.reject(EditorError::GraphicNotOwned {
                graphic: graphic.to_string(),
                layer: layer_id.to_string(),
            })
        })?;

        let operation = self.new_operation(
            OperationMode::Update {
                graphic,
                anchor_index,
            },
            layer_id.clone(),
        );
        let signal = self.inner.arbiter.request_control(&operation);
        let session = match SketchSession::update(
            Rc::clone(&view),
            layer,
            graphic,
            self.session_options(),
        ) {
            Ok(session) => session,
            Err(err) => {
                operation.settle(OperationOutcome::Cancelled);
                self.inner.arbiter.release(operation.id());
                return Err(self.reject(err));
            }
        };
        if let Some(restore) = session.pending_restore() {
            self.inner.arbiter.on_interrupt(
                operation.id(),
                Box::new(move || {
                    restore.run();
                }),
            );
        }
        Ok(self.start(operation, session, signal, view, FocusTarget::Graphic(graphic)))
    }

    /// Starts an update on the top-most editable graphic under `at`.
    pub fn handle_click(&self, at: ScreenPoint) -> Result<Option<Rc<Operation>>, EditorError> {
        let view = self.view().ok_or_else(|| self.reject(EditorError::NoView))?;
        let hit = view
            .hit_test(at)
            .into_iter()
            .find(|hit| self.layer(&hit.layer).is_some());
        match hit {
            Some(hit) => {
                tracing::debug!("Click hit {} on {}", hit.graphic, hit.layer);
                self.update(&hit.layer, hit.graphic).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Turns clicks that no session captured into updates.
    ///
    /// Replaces a previous idle loop.
    pub fn listen(&self) -> Result<(), EditorError> {
        let view = self.view().ok_or_else(|| self.reject(EditorError::NoView))?;
        let mut rx = view.input().listen_idle();
        let weak = Rc::downgrade(&self.inner);

        let handle = tokio::task::spawn_local(async move {
            while let Some(event) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if let InputEvent::Click {
                    at,
                    button: PointerButton::Primary,
                } = event
                {
                    if let Err(err) = (Editor { inner }).handle_click(at) {
                        tracing::debug!("Idle click ignored: {}", err);
                    }
                }
            }
            tracing::debug!("Idle input loop ended");
        });

        if let Some(previous) = self.inner.idle_task.borrow_mut().replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    /// Re-clips every graphic of every layer against the current boundary.
    ///
    /// Graphics that come back unchanged keep their identity.
    pub fn reclip_all(&self) -> Result<ReclipReport, EditorError> {
        if let Some(info) = self.inner.arbiter.current() {
            return Err(EditorError::OperationInProgress {
                operation: info.id.0,
            });
        }

        let clipper = self.clipper(self.boundary());
        let mut report = ReclipReport::default();
        for layer in self.layers() {
            let mut layer = layer.borrow_mut();
            let summary = OrderedLayerWriter::rewrite(&mut layer, |graphic| {
                let parts = clipper.clip_graphic(graphic);
                let unchanged =
                    parts.len() == 1 && parts[0].geometry.approx_eq(&graphic.geometry, 1e-9);
                (!unchanged).then_some(parts)
            });
            report.layers += 1;
            report.changed += summary.changed;
            report.dropped += summary.dropped;

            if summary.changed > 0 || summary.dropped > 0 {
                tracing::info!(
                    "Re-clipped {}: {} changed, {} dropped",
                    layer.id(),
                    summary.changed,
                    summary.dropped
                );
                self.publish(AppEvent::Layer(LayerEvent::Reclipped {
                    layer: layer.id().clone(),
                    changed: summary.changed,
                    dropped: summary.dropped,
                }));
            }
        }
        Ok(report)
    }

    /// [`reclip_all`](Self::reclip_all) now if no operation is live,
    /// otherwise as soon as the arbiter goes idle.
    ///
    /// Returns the report when the re-clip ran immediately. Repeated calls
    /// while one is queued share it. Deferring spawns with
    /// `tokio::task::spawn_local`.
    pub fn reclip_when_idle(&self) -> Option<ReclipReport> {
        match self.reclip_all() {
            Ok(report) => return Some(report),
            Err(err) => tracing::info!("Re-clip queued: {}", err),
        }
        if self.inner.reclip_pending.replace(true) {
            return None;
        }

        let mut rx = self.watch_operation();
        let weak = Rc::downgrade(&self.inner);
        tokio::task::spawn_local(async move {
            loop {
                if rx.wait_for(Option::is_none).await.is_err() {
                    break;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let editor = Editor { inner };
                match editor.reclip_all() {
                    Ok(report) => {
                        editor.inner.reclip_pending.set(false);
                        tracing::debug!("Queued re-clip ran: {:?}", report);
                        break;
                    }
                    Err(err) => tracing::debug!("Queued re-clip still blocked: {}", err),
                }
                drop(editor);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        None
    }

    pub fn reclip_pending(&self) -> bool {
        self.inner.reclip_pending.get()
    }

    /// Interrupts the live operation and stops the idle loop.
    pub fn destroy(&self) {
        self.inner.arbiter.shutdown();
        if let Some(handle) = self.inner.idle_task.borrow_mut().take() {
            handle.abort();
        }
    }

    fn preconditions(&self, layer_id: &LayerId) -> Result<(Rc<dyn MapView>, LayerRef), EditorError> {
        let view = self.view().ok_or_else(|| self.reject(EditorError::NoView))?;
        let layer = self.layer(layer_id).ok_or_else(|| {
            self.reject(EditorError::NoTargetLayer {
                layer: layer_id.to_string(),
            })
        })?;
        Ok((view, layer))
    }

    fn reject(&self, err: EditorError) -> EditorError {
        tracing::warn!("Request rejected: {}", err);
        self.publish(AppEvent::Error(ErrorEvent::Precondition {
            message: err.to_string(),
        }));
        err
    }

    fn new_operation(&self, mode: OperationMode, layer: LayerId) -> Rc<Operation> {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        Rc::new(Operation::new(OperationId(id), mode, layer, self.boundary()))
    }

    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            keys: self.inner.options.keys.clone(),
            vertex_tolerance: self.inner.options.vertex_tolerance,
        }
    }

    fn clipper(&self, boundary: Option<Arc<BoundaryPolygon>>) -> GeometryClipper {
        GeometryClipper::new(boundary).with_epsilon(self.inner.options.clip_epsilon)
    }

    fn publish(&self, event: AppEvent) {
        let bus = self.inner.bus.borrow().clone();
        if let Some(bus) = bus {
            bus.notify(event);
        }
    }

    fn start(
        &self,
        operation: Rc<Operation>,
        session: SketchSession,
        signal: CancellationSignal,
        view: Rc<dyn MapView>,
        focus: FocusTarget,
    ) -> Rc<Operation> {
        let validity = Rc::clone(&operation);
        let session = session.on_validity(Rc::new(move |valid| validity.set_sketch_valid(valid)));

        operation.begin_sketching();
        self.inner.arbiter.refresh();
        tracing::info!(
            "{} started ({}) on {}",
            operation.id(),
            operation.mode().label(),
            operation.target_layer()
        );
        self.publish(AppEvent::Operation(OperationEvent::Started {
            operation: operation.id(),
            mode: operation.mode().label(),
            layer: operation.target_layer().clone(),
        }));

        let weak: Weak<EditorInner> = Rc::downgrade(&self.inner);
        let driven = Rc::clone(&operation);
        let focus_on_start = self.inner.options.focus_on_start;
        tokio::task::spawn_local(async move {
            if focus_on_start {
                view.focus(focus).await;
            }
            let outcome = session.run(signal).await;
            match weak.upgrade() {
                Some(inner) => Editor { inner }.resolve(&driven, outcome),
                None => {
                    driven.settle(OperationOutcome::Interrupted);
                }
            }
        });

        operation
    }

    fn resolve(&self, operation: &Rc<Operation>, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Complete(graphic) => self.commit(operation, graphic),
            SessionOutcome::Cancel(cause) => {
                let settled = match cause {
                    CancelCause::Interrupted => OperationOutcome::Interrupted,
                    _ => OperationOutcome::Cancelled,
                };
                operation.settle(settled);
                if cause == CancelCause::Deleted {
                    self.publish(AppEvent::Layer(LayerEvent::GraphicDeleted {
                        layer: operation.target_layer().clone(),
                    }));
                }
                self.finish(operation, 0);
            }
        }
    }

    fn commit(&self, operation: &Rc<Operation>, graphic: Graphic) {
        if operation.is_settled() {
            tracing::warn!("{} completed after it settled, discarding", operation.id());
            self.finish(operation, 0);
            return;
        }
        let layer_id = operation.target_layer().clone();
        let Some(layer) = self.layer(&layer_id) else {
            tracing::warn!("{} lost its layer {}", operation.id(), layer_id);
            operation.settle(OperationOutcome::Cancelled);
            self.finish(operation, 0);
            return;
        };

        let clipper = self.clipper(operation.boundary().cloned());
        let graphics: Vec<Graphic> = match clipper.clip(&graphic.geometry) {
            Ok(parts) => parts.into_iter().map(|g| graphic.derive(g)).collect(),
            Err(err) => {
                tracing::warn!("Dropping shape for {}: {}", layer_id, err);
                self.publish(AppEvent::Error(ErrorEvent::ShapeDropped {
                    layer: layer_id.clone(),
                    reason: err.to_string(),
                }));
                Vec::new()
            }
        };

        let written = {
            let mut layer = layer.borrow_mut();
            match operation.mode() {
                OperationMode::Create { .. } => {
                    Some((OrderedLayerWriter::append(&mut layer, graphics.clone()), None))
                }
                OperationMode::Update { graphic: id, .. } => match layer.index_of(*id) {
                    Some(index) => OrderedLayerWriter::replace(&mut layer, index, graphics.clone())
                        .map(|summary| (summary.anchor_index, Some(summary.anchor_index)))
                        .map_err(|err| tracing::warn!("Write to {} failed: {}", layer_id, err))
                        .ok(),
                    None => {
                        tracing::warn!("{} left {} before commit", id, layer_id);
                        None
                    }
                },
            }
        };
        let Some((index, anchor_index)) = written else {
            operation.settle(OperationOutcome::Cancelled);
            self.finish(operation, 0);
            return;
        };

        let count = graphics.len();
        let edit = CompletedEdit {
            operation: operation.id(),
            layer: layer_id.clone(),
            graphics,
            anchor_index,
        };
        operation.settle(OperationOutcome::Completed(edit.clone()));
        self.inner.arbiter.release(operation.id());

        let callbacks: Vec<LocalCallback<CompletedEdit>> = self.inner.completion.borrow().clone();
        for callback in callbacks {
            callback(&edit);
        }

        if count > 0 {
            self.publish(AppEvent::Layer(LayerEvent::GraphicsCommitted {
                layer: layer_id,
                index,
                count,
            }));
        } else {
            tracing::info!("Shape for {} fell outside the boundary", layer_id);
        }
        self.finish(operation, count);
    }

    /// Releases control if still held and publishes the settled event.
    fn finish(&self, operation: &Rc<Operation>, graphics: usize) {
        self.inner.arbiter.release(operation.id());
        let outcome = operation
            .outcome_now()
            .map(|o| o.kind())
            .unwrap_or(sitesketch_core::OutcomeKind::Interrupted);
        self.publish(AppEvent::Operation(OperationEvent::Settled {
            operation: operation.id(),
            outcome,
            graphics,
        }));
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("layers", &self.inner.layers.borrow().len())
            .field("current", &self.inner.arbiter.current())
            .finish()
    }
}
