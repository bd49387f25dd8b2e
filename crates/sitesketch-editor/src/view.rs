//! View surface
//!
//! [`MapView`] is the narrow interface the editor needs from whatever draws
//! the map: focusing, hit testing, screen to map conversion and an input
//! router. [`HeadlessView`] implements it in memory for scripted replay and
//! tests.

use crate::geometry_ops::geometry_hit;
use crate::input::{Delivery, InputEvent, InputRouter, PointerButton, ScreenPoint};
use crate::layer::LayerRef;
use async_trait::async_trait;
use serde::Serialize;
use sitesketch_core::{Extent, GraphicId, LayerId, Point, SpatialReference};
use std::cell::RefCell;
use std::rc::Rc;

/// What the view should bring into focus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FocusTarget {
    Layer(LayerId),
    Graphic(GraphicId),
    Extent(Extent),
}

/// One graphic under a screen position, top-most first
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub graphic: GraphicId,
    pub layer: LayerId,
    pub index: usize,
}

/// Map surface the editor draws on.
#[async_trait(?Send)]
pub trait MapView {
    /// Bring `target` into view. Resolves once the view settled.
    async fn focus(&self, target: FocusTarget);

    /// Graphics under `at`, top-most first
    fn hit_test(&self, at: ScreenPoint) -> Vec<HitResult>;

    /// Convert a screen position to map coordinates
    fn to_map(&self, at: ScreenPoint) -> Option<Point>;

    /// Router that delivers this view's input
    fn input(&self) -> Rc<InputRouter>;

    fn spatial_reference(&self) -> SpatialReference;
}

/// In-memory view with an affine screen/map transform.
///
/// Screen `y` grows downwards, map `y` upwards.
pub struct HeadlessView {
    origin: Point,
    resolution: f64,
    spatial_reference: SpatialReference,
    hit_tolerance_px: f64,
    layers: RefCell<Vec<LayerRef>>,
    router: Rc<InputRouter>,
    focus_log: RefCell<Vec<FocusTarget>>,
}

impl HeadlessView {
    /// `origin` is the map position of the top-left screen pixel and
    /// `resolution` the map units per pixel.
    pub fn new(origin: Point, resolution: f64, spatial_reference: SpatialReference) -> Self {
        Self {
            origin,
            resolution,
            spatial_reference,
            hit_tolerance_px: 6.0,
            layers: RefCell::new(Vec::new()),
            router: InputRouter::new(),
            focus_log: RefCell::new(Vec::new()),
        }
    }

    pub fn with_hit_tolerance(mut self, pixels: f64) -> Self {
        self.hit_tolerance_px = pixels;
        self
    }

    /// Layers are hit tested in reverse order of addition.
    pub fn add_layer(&self, layer: LayerRef) {
        self.layers.borrow_mut().push(layer);
    }

    pub fn to_screen(&self, point: &Point) -> ScreenPoint {
        ScreenPoint::new(
            (point.x - self.origin.x) / self.resolution,
            (self.origin.y - point.y) / self.resolution,
        )
    }

    /// Everything passed to [`MapView::focus`], oldest first
    pub fn focus_history(&self) -> Vec<FocusTarget> {
        self.focus_log.borrow().clone()
    }

    pub fn dispatch(&self, event: InputEvent) -> Delivery {
        tracing::trace!("Dispatching {:?}", event);
        self.router.dispatch(event)
    }

    pub fn click_at(&self, at: Point) -> Delivery {
        self.dispatch(InputEvent::Click {
            at: self.to_screen(&at),
            button: PointerButton::Primary,
        })
    }

    /// Emits a lone double-click without the preceding clicks.
    pub fn double_click_at(&self, at: Point) -> Delivery {
        self.dispatch(InputEvent::DoubleClick {
            at: self.to_screen(&at),
        })
    }

    pub fn move_to(&self, at: Point) -> Delivery {
        self.dispatch(InputEvent::PointerMove {
            at: self.to_screen(&at),
        })
    }

    pub fn pointer_down_at(&self, at: Point) -> Delivery {
        self.dispatch(InputEvent::PointerDown {
            at: self.to_screen(&at),
            button: PointerButton::Primary,
        })
    }

    pub fn pointer_up_at(&self, at: Point) -> Delivery {
        self.dispatch(InputEvent::PointerUp {
            at: self.to_screen(&at),
            button: PointerButton::Primary,
        })
    }

    /// Press, move, release, then the click a browser fires after a drag.
    pub fn drag(&self, from: Point, to: Point) {
        self.pointer_down_at(from);
        self.move_to(to);
        self.pointer_up_at(to);
        self.click_at(to);
    }

    pub fn press_key(&self, key: &str) -> Delivery {
        self.dispatch(InputEvent::KeyDown {
            key: key.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl MapView for HeadlessView {
    async fn focus(&self, target: FocusTarget) {
        tracing::debug!("Focusing {:?}", target);
        self.focus_log.borrow_mut().push(target);
        tokio::task::yield_now().await;
    }

    fn hit_test(&self, at: ScreenPoint) -> Vec<HitResult> {
        let Some(point) = self.to_map(at) else {
            return Vec::new();
        };
        let tolerance = self.hit_tolerance_px * self.resolution;

        let mut hits = Vec::new();
        for layer in self.layers.borrow().iter().rev() {
            let layer = layer.borrow();
            for (index, graphic) in layer.graphics().iter().enumerate().rev() {
                if geometry_hit(&graphic.geometry, &point, tolerance) {
                    hits.push(HitResult {
                        graphic: graphic.id(),
                        layer: layer.id().clone(),
                        index,
                    });
                }
            }
        }
        hits
    }

    fn to_map(&self, at: ScreenPoint) -> Option<Point> {
        if !at.x.is_finite() || !at.y.is_finite() {
            return None;
        }
        Some(Point::new(
            self.origin.x + at.x * self.resolution,
            self.origin.y - at.y * self.resolution,
        ))
    }

    fn input(&self) -> Rc<InputRouter> {
        Rc::clone(&self.router)
    }

    fn spatial_reference(&self) -> SpatialReference {
        self.spatial_reference
    }
}
