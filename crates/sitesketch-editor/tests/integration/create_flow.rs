use crate::support::{fixture, pts, settle, u_boundary, SR};
use sitesketch_core::{AppEvent, EventCategory, EventFilter, Geometry, LayerEvent, OutcomeKind, OperationEvent, Point};
use sitesketch_editor::{
    Color, CompletedEdit, CreateRequest, FocusTarget, OperationOutcome, OperationState, SketchKind,
    Symbol,
};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::LocalSet;

#[tokio::test]
async fn test_create_triangle() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let edits: Rc<RefCell<Vec<CompletedEdit>>> = Rc::new(RefCell::new(Vec::new()));
            let sink = edits.clone();
            fx.editor.on_complete(move |edit| sink.borrow_mut().push(edit.clone()));

            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polygon,
                    Symbol::fill(Color::TRANSLUCENT_ORANGE),
                ))
                .expect("create");
            assert_eq!(op.state(), OperationState::Sketching);
            assert!(fx.editor.is_active());

            fx.view.click_at(Point::new(2.0, 2.0));
            fx.view.move_to(Point::new(8.0, 2.5));
            fx.view.click_at(Point::new(8.0, 2.0));
            fx.view.double_click_at(Point::new(5.0, 4.0));

            let outcome = op.outcome().await;
            let edit = outcome.completed().expect("completed").clone();
            assert_eq!(edit.graphics.len(), 1);
            assert_eq!(edit.anchor_index, None);
            assert!((edit.graphics[0].geometry.area() - 6.0).abs() < 1e-9);

            settle().await;
            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 1, "preview must be gone, result written");
            assert_eq!(layer.at(0).map(|g| g.id()), Some(edit.graphics[0].id()));
            assert_eq!(*edits.borrow(), vec![edit]);
            assert!(!fx.editor.is_active());
            assert_eq!(
                fx.view.focus_history(),
                vec![FocusTarget::Layer("sketches".into())]
            );
        })
        .await;
}

#[tokio::test]
async fn test_create_point_on_single_click() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Point,
                    Symbol::marker(Color::BLACK, 6.0),
                ))
                .expect("create");
            fx.view.click_at(Point::new(3.0, 4.0));

            let outcome = op.outcome().await;
            let edit = outcome.completed().expect("completed");
            assert_eq!(
                edit.graphics[0].geometry,
                Geometry::point(Point::new(3.0, 4.0), SR)
            );
        })
        .await;
}

#[tokio::test]
async fn test_place_mesh_on_single_click() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let mut attributes = sitesketch_editor::Attributes::new();
            attributes.insert("species".to_string(), "oak".into());
            let op = fx
                .editor
                .create(
                    CreateRequest::new("sketches", SketchKind::Mesh, Symbol::mesh("tree.glb"))
                        .with_attributes(attributes.clone()),
                )
                .expect("create");
            assert_eq!(op.info().mode, "create mesh");

            fx.view.move_to(Point::new(4.0, 4.0));
            fx.view.click_at(Point::new(5.0, 12.0));

            let outcome = op.outcome().await;
            let edit = outcome.completed().expect("completed").clone();
            assert_eq!(edit.graphics.len(), 1);
            let placed = &edit.graphics[0];
            assert_eq!(placed.geometry, Geometry::point(Point::new(5.0, 12.0), SR));
            assert_eq!(placed.symbol, Symbol::mesh("tree.glb"));
            assert_eq!(placed.attributes, attributes);

            settle().await;
            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 1);
            assert_eq!(layer.at(0).map(|g| g.id()), Some(placed.id()));
            assert!(!fx.editor.is_active());
        })
        .await;
}

#[tokio::test]
async fn test_mesh_in_notch_is_dropped() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Mesh,
                    Symbol::mesh("bench.glb"),
                ))
                .expect("create");
            fx.view.click_at(Point::new(15.0, 12.0));

            let outcome = op.outcome().await;
            assert!(outcome.completed().expect("completed").graphics.is_empty());
            settle().await;
            assert!(fx.layer.borrow().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_polyline_across_notch_becomes_two_graphics() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polyline,
                    Symbol::line(Color::BLACK, 2.0),
                ))
                .expect("create");
            fx.view.click_at(Point::new(-5.0, 12.0));
            fx.view.click_at(Point::new(35.0, 12.0));
            fx.view.press_key("c");

            let outcome = op.outcome().await;
            assert_eq!(outcome.completed().map(|e| e.graphics.len()), Some(2));
            settle().await;

            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 2);
            let first = Geometry::polyline(vec![pts(&[(0.0, 12.0), (10.0, 12.0)])], SR);
            assert!(layer.at(0).unwrap().geometry.approx_eq(&first, 1e-9));
        })
        .await;
}

#[tokio::test]
async fn test_shape_outside_boundary_completes_empty() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polygon,
                    Symbol::fill(Color::ORANGE),
                ))
                .expect("create");
            fx.view.click_at(Point::new(12.0, 8.0));
            fx.view.click_at(Point::new(18.0, 8.0));
            fx.view.double_click_at(Point::new(15.0, 18.0));

            let outcome = op.outcome().await;
            assert_eq!(outcome.completed().map(|e| e.graphics.len()), Some(0));
            settle().await;
            assert!(fx.layer.borrow().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_escape_cancels_and_removes_preview() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polyline,
                    Symbol::line(Color::BLACK, 2.0),
                ))
                .expect("create");
            fx.view.click_at(Point::new(1.0, 1.0));
            fx.view.move_to(Point::new(4.0, 1.0));
            settle().await;
            assert_eq!(fx.layer.borrow().len(), 1, "preview is drawn");

            fx.view.press_key("Escape");
            assert_eq!(op.outcome().await, OperationOutcome::Cancelled);
            settle().await;
            assert!(fx.layer.borrow().is_empty());
            assert!(!fx.editor.is_active());
        })
        .await;
}

#[tokio::test]
async fn test_lifecycle_events_are_published() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Point,
                    Symbol::marker(Color::BLACK, 6.0),
                ))
                .expect("create");
            fx.view.click_at(Point::new(1.0, 1.0));
            op.outcome().await;
            settle().await;

            let history: Vec<AppEvent> = fx
                .bus
                .history(None)
                .into_iter()
                .filter(|e| {
                    EventFilter::Categories(vec![EventCategory::Operation, EventCategory::Layer])
                        .matches(e)
                })
                .collect();
            assert_eq!(
                history,
                vec![
                    AppEvent::Operation(OperationEvent::Started {
                        operation: op.id(),
                        mode: "create point".to_string(),
                        layer: "sketches".into(),
                    }),
                    AppEvent::Layer(LayerEvent::GraphicsCommitted {
                        layer: "sketches".into(),
                        index: 0,
                        count: 1,
                    }),
                    AppEvent::Operation(OperationEvent::Settled {
                        operation: op.id(),
                        outcome: OutcomeKind::Completed,
                        graphics: 1,
                    }),
                ]
            );
        })
        .await;
}
