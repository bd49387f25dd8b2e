//! # SiteSketch Editor
//!
//! Interactive sketching and editing of map graphics, constrained to a
//! planning boundary.
//!
//! ## Core Components
//!
//! - **Arbiter**: grants exclusive control to one operation at a time and
//!   interrupts the previous one
//! - **Sessions**: turn captured pointer and key input into a graphic
//! - **Clipper**: intersects sketched geometry with the boundary and splits
//!   the result into single-part geometries
//! - **Layer writer**: replaces a graphic by its parts without disturbing
//!   draw order
//! - **Editor**: ties the above together behind `create`, `update` and
//!   click-to-update
//!
//! ## Architecture
//!
//! ```text
//! Editor
//!   ├── OperationArbiter (one live Operation)
//!   ├── SketchSession (spawn_local task per operation)
//!   │     └── InputCapture (exclusive view input)
//!   ├── GeometryClipper (boundary snapshot of the operation)
//!   └── OrderedLayerWriter (append / replace at anchor)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitesketch_editor::{CreateRequest, Editor, HeadlessView, SketchKind, Symbol, Color};
//!
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let editor = Editor::default();
//!     editor.bind_view(view.clone());
//!     editor.add_layer(layer.clone());
//!     let op = editor.create(CreateRequest::new("sketches", SketchKind::Polygon, Symbol::fill(Color::ORANGE)))?;
//!     // ... feed input through the view ...
//!     let outcome = op.outcome().await;
//! }).await;
//! ```

pub mod arbiter;
pub mod clipper;
pub mod editor;
pub mod geometry_ops;
pub mod input;
pub mod layer;
pub mod layer_writer;
pub mod model;
pub mod operation;
pub mod session;
pub mod view;

pub use arbiter::{CancelReason, CancellationSignal, InterruptHook, OperationArbiter};
pub use clipper::GeometryClipper;
pub use editor::{CreateRequest, Editor, EditorOptions, ReclipReport};
pub use input::{
    Delivery, InputCapture, InputEvent, InputRouter, KeyAction, KeyMap, PointerButton, ScreenPoint,
};
pub use layer::{GraphicsLayer, LayerRef};
pub use layer_writer::{OrderedLayerWriter, ReplaceSummary, RewriteSummary};
pub use model::{Attributes, Color, Graphic, SketchKind, Symbol};
pub use operation::{
    CompletedEdit, Operation, OperationInfo, OperationMode, OperationOutcome, OperationState,
};
pub use session::{
    CancelCause, PendingRestore, SessionOptions, SessionOutcome, SketchSession, ValidityListener,
};
pub use view::{FocusTarget, HeadlessView, HitResult, MapView};
