//! Scripted input replay
//!
//! A script seeds layers and then feeds operations and input through a
//! [`PlanningSession`]. Steps run in order; after each one the local tasks
//! get a chance to drain their queues.
//!
//! ```json
//! {
//!   "layers": [{ "id": "sketches" }],
//!   "steps": [
//!     { "op": "create", "layer": "sketches", "kind": "polygon",
//!       "symbol": { "type": "fill", "color": [255, 140, 0, 255] } },
//!     { "op": "click", "at": { "x": 0, "y": 0 } },
//!     { "op": "click", "at": { "x": 4, "y": 0 } },
//!     { "op": "double_click", "at": { "x": 4, "y": 3 } }
//!   ]
//! }
//! ```

use crate::PlanningSession;
use serde::{Deserialize, Serialize};
use sitesketch_core::{AppEvent, Geometry, LayerId, Point};
use sitesketch_editor::{Attributes, CreateRequest, Graphic, GraphicsLayer, SketchKind, Symbol};
use sitesketch_settings::BoundarySettings;
use std::path::Path;

/// Yields granted to local tasks after every step
const SETTLE_YIELDS: usize = 32;

/// A graphic seeded into a layer before replay
#[derive(Debug, Clone, Deserialize)]
pub struct GraphicSpec {
    pub geometry: Geometry,
    pub symbol: Symbol,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub graphics: Vec<GraphicSpec>,
}

/// One replay step, tagged by `op`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Create {
        layer: String,
        kind: SketchKind,
        symbol: Symbol,
        #[serde(default)]
        attributes: Attributes,
    },
    /// Update the graphic at `index` in `layer`
    Update { layer: String, index: usize },
    Click { at: Point },
    DoubleClick { at: Point },
    Move { at: Point },
    Drag { from: Point, to: Point },
    Key { key: String },
    Cancel,
    Reclip,
    /// Switch the boundary source; existing graphics are re-clipped
    Boundary { boundary: BoundarySettings },
    Settle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }
}

/// A step that was refused
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepError {
    pub step: usize,
    pub message: String,
}

/// Layers and events after replay
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub layers: Vec<GraphicsLayer>,
    pub events: Vec<AppEvent>,
    pub errors: Vec<StepError>,
}

async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}

/// Replays `script` against `session`.
///
/// Must run inside a `tokio::task::LocalSet`. A refused step is recorded
/// and replay continues. Whatever operation is still live at the end is
/// interrupted.
pub async fn run_script(session: &PlanningSession, script: Script) -> ReplayReport {
    for seed in script.layers {
        let mut layer = GraphicsLayer::new(seed.id);
        if let Some(title) = seed.title {
            layer = layer.with_title(title);
        }
        for graphic in seed.graphics {
            layer.add(Graphic::new(graphic.geometry, graphic.symbol).with_attributes(graphic.attributes));
        }
        session.add_layer(layer);
    }

    let mut errors = Vec::new();
    if let Err(err) = session.editor.listen() {
        errors.push(StepError {
            step: 0,
            message: err.to_string(),
        });
    }

    for (index, step) in script.steps.into_iter().enumerate() {
        tracing::debug!("Step {}: {:?}", index, step);
        if let Err(message) = apply(session, step) {
            tracing::warn!("Step {} refused: {}", index, message);
            errors.push(StepError {
                step: index,
                message,
            });
        }
        settle().await;
    }

    session.editor.destroy();
    settle().await;

    ReplayReport {
        layers: session.layers(),
        events: session.bus.history(None),
        errors,
    }
}

fn apply(session: &PlanningSession, step: Step) -> Result<(), String> {
    let editor = &session.editor;
    let view = &session.view;

    match step {
        Step::Create {
            layer,
            kind,
            symbol,
            attributes,
        } => {
            let request = CreateRequest::new(layer, kind, symbol).with_attributes(attributes);
            editor.create(request).map_err(|e| e.to_string())?;
        }
        Step::Update { layer, index } => {
            let layer_id = LayerId::new(layer);
            let graphic = editor.layer(&layer_id).and_then(|layer| {
                let layer = layer.borrow();
                layer.at(index).map(Graphic::id)
            });
            let graphic = graphic
                .ok_or_else(|| format!("no graphic at {} in layer '{}'", index, layer_id))?;
            editor.update(&layer_id, graphic).map_err(|e| e.to_string())?;
        }
        Step::Click { at } => {
            view.click_at(at);
        }
        Step::DoubleClick { at } => {
            view.double_click_at(at);
        }
        Step::Move { at } => {
            view.move_to(at);
        }
        Step::Drag { from, to } => view.drag(from, to),
        Step::Key { key } => {
            view.press_key(&key);
        }
        Step::Cancel => {
            if !editor.cancel() {
                return Err("no operation to cancel".to_string());
            }
        }
        Step::Reclip => {
            let report = editor.reclip_all().map_err(|e| e.to_string())?;
            tracing::info!(
                "Re-clipped {} layer(s): {} changed, {} dropped",
                report.layers,
                report.changed,
                report.dropped
            );
        }
        Step::Boundary { boundary } => {
            session
                .controller
                .set_boundary_settings(boundary)
                .map_err(|e| e.to_string())?;
        }
        Step::Settle => {}
    }
    Ok(())
}
