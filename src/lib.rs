//! # SiteSketch
//!
//! Boundary-clipped interactive sketching for planning maps:
//! - Create points, polylines, polygons and placed meshes
//! - Reshape and move existing graphics in place
//! - One live operation at a time; starting another interrupts it
//! - Every committed shape is clipped to the planning boundary
//!
//! ## Architecture
//!
//! SiteSketch is organized as a workspace with multiple crates:
//!
//! 1. **sitesketch-core** - Geometry, boundary, identifiers, errors, events
//! 2. **sitesketch-settings** - Configuration, boundary loading, persistence
//! 3. **sitesketch-editor** - Arbiter, sessions, clipper, layer writer, editor
//! 4. **sitesketch** - Session wiring, scripted replay and the CLI binary

pub mod script;

pub use sitesketch_core::{
    AppEvent, BoundaryPolygon, EditorError, Error, EventBus, EventBusConfig, Geometry,
    GeometryError, GraphicId, LayerId, Point, Result, SpatialReference,
};

pub use sitesketch_editor::{
    Color, CompletedEdit, CreateRequest, Editor, EditorOptions, Graphic, GraphicsLayer,
    HeadlessView, KeyMap, LayerRef, MapView, Operation, OperationOutcome, ReclipReport,
    SketchKind, Symbol,
};

pub use sitesketch_settings::{
    Config, LoggingSettings, SettingsController, SettingsError, SettingsPersistence,
};

pub use script::{run_script, ReplayReport, Script, Step, StepError};

use std::rc::Rc;
use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// Sets up structured logging with:
/// - `RUST_LOG` support, falling back to the configured level
/// - Pretty or JSON output on stderr, keeping stdout for reports
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Editor options from the configuration
pub fn editor_options(config: &Config) -> EditorOptions {
    EditorOptions {
        keys: KeyMap {
            complete: config.keys.complete.clone(),
            cancel: config.keys.cancel.clone(),
            delete: config.keys.delete.clone(),
        },
        vertex_tolerance: config.editor.vertex_tolerance,
        focus_on_start: config.editor.focus_on_start,
        clip_epsilon: config.editor.clip_epsilon,
    }
}

/// An editor bound to a headless view and driven by the settings.
///
/// Boundary changes from the controller are pushed into the editor and
/// existing graphics are re-clipped, after the live operation settles if
/// there is one.
pub struct PlanningSession {
    pub editor: Editor,
    pub view: Rc<HeadlessView>,
    pub controller: Rc<SettingsController>,
    pub bus: Arc<EventBus>,
}

impl PlanningSession {
    pub fn new(persistence: SettingsPersistence) -> anyhow::Result<Self> {
        let bus = Arc::new(EventBus::with_config(EventBusConfig {
            enable_history: true,
            ..Default::default()
        }));
        let controller = SettingsController::new(persistence)?.with_event_bus(bus.clone());
        let config = controller.config();

        let view = Rc::new(
            HeadlessView::new(
                Point::new(config.view.origin[0], config.view.origin[1]),
                config.view.resolution,
                SpatialReference::new(config.view.wkid),
            )
            .with_hit_tolerance(config.editor.hit_tolerance_px),
        );

        let editor = Editor::new(editor_options(&config)).with_event_bus(bus.clone());
        editor.bind_view(view.clone());
        editor.set_boundary(controller.boundary());

        let target = editor.clone();
        controller.on_boundary_changed(move |boundary| {
            target.set_boundary(boundary.clone());
            match target.reclip_when_idle() {
                Some(report) => tracing::debug!("Re-clipped after boundary change: {:?}", report),
                None => tracing::info!("Boundary changed mid-operation, re-clip queued"),
            }
        });

        Ok(Self {
            editor,
            view,
            controller: Rc::new(controller),
            bus,
        })
    }

    /// Register a layer with both the editor and the view
    pub fn add_layer(&self, layer: GraphicsLayer) -> LayerRef {
        let layer = layer.into_ref();
        self.view.add_layer(layer.clone());
        self.editor.add_layer(layer.clone());
        layer
    }

    /// Snapshot of every layer, bottom first
    pub fn layers(&self) -> Vec<GraphicsLayer> {
        self.editor
            .layers()
            .iter()
            .map(|layer| layer.borrow().clone())
            .collect()
    }
}
