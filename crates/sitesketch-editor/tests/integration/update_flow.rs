use crate::support::{fixture, pts, settle, u_boundary, Fixture, SR};
use sitesketch_core::{AppEvent, Geometry, GraphicId, LayerEvent, Point};
use sitesketch_editor::{
    Color, CreateRequest, Graphic, OperationOutcome, OperationState, SketchKind, Symbol,
};
use tokio::task::LocalSet;

fn marker(x: f64) -> Graphic {
    Graphic::new(
        Geometry::point(Point::new(x, 1.0), SR),
        Symbol::marker(Color::BLACK, 4.0),
    )
}

/// Five graphics; index 2 is a short line in the left arm of the U.
fn seed(fx: &Fixture) -> (Vec<Graphic>, GraphicId) {
    let line = Graphic::new(
        Geometry::polyline(vec![pts(&[(2.0, 12.0), (8.0, 12.0)])], SR),
        Symbol::line(Color::BLACK, 2.0),
    );
    let line_id = line.id();
    let graphics = vec![marker(1.0), marker(2.0), line, marker(4.0), marker(5.0)];
    let mut layer = fx.layer.borrow_mut();
    for graphic in graphics.clone() {
        layer.add(graphic);
    }
    (graphics, line_id)
}

#[tokio::test]
async fn test_update_stretch_across_notch_splits_at_anchor() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let (originals, line_id) = seed(&fx);

            let op = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            assert_eq!(op.anchor_index(), Some(2));

            fx.view.drag(Point::new(8.0, 12.0), Point::new(28.0, 12.0));
            fx.view.press_key("c");

            let outcome = op.outcome().await;
            let edit = outcome.completed().expect("completed").clone();
            assert_eq!(edit.anchor_index, Some(2));
            assert_eq!(edit.graphics.len(), 2);
            settle().await;

            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 4 + edit.graphics.len());
            assert_eq!(layer.at(0).map(Graphic::id), Some(originals[0].id()));
            assert_eq!(layer.at(1).map(Graphic::id), Some(originals[1].id()));

            let left = Geometry::polyline(vec![pts(&[(2.0, 12.0), (10.0, 12.0)])], SR);
            let right = Geometry::polyline(vec![pts(&[(20.0, 12.0), (28.0, 12.0)])], SR);
            assert!(layer.at(2).unwrap().geometry.approx_eq(&left, 1e-9));
            assert!(layer.at(3).unwrap().geometry.approx_eq(&right, 1e-9));

            assert!(layer.at(4).unwrap().content_eq(&originals[3]));
            assert!(layer.at(5).unwrap().content_eq(&originals[4]));
            assert!(!layer.contains(line_id));
        })
        .await;
}

#[tokio::test]
async fn test_cancel_restores_original_geometry() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let (originals, line_id) = seed(&fx);
            let before: Vec<GraphicId> = fx.layer.borrow().iter().map(Graphic::id).collect();

            let op = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            fx.view.pointer_down_at(Point::new(5.0, 12.0));
            fx.view.move_to(Point::new(5.0, 15.0));
            settle().await;
            let moved = fx.layer.borrow().get(line_id).map(|g| g.geometry.clone());
            let shifted = Geometry::polyline(vec![pts(&[(2.0, 15.0), (8.0, 15.0)])], SR);
            assert!(moved.is_some_and(|g| g.approx_eq(&shifted, 1e-9)));

            fx.view.press_key("Escape");
            assert_eq!(op.outcome().await, OperationOutcome::Cancelled);
            settle().await;

            let layer = fx.layer.borrow();
            let after: Vec<GraphicId> = layer.iter().map(Graphic::id).collect();
            assert_eq!(after, before);
            assert_eq!(
                layer.get(line_id).map(|g| g.geometry.clone()),
                Some(originals[2].geometry.clone())
            );
        })
        .await;
}

#[tokio::test]
async fn test_click_outside_completes_update() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let (_, line_id) = seed(&fx);

            let op = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            fx.view.click_at(Point::new(5.0, 12.0));
            fx.view.click_at(Point::new(25.0, 25.0));

            let outcome = op.outcome().await;
            let edit = outcome.completed().expect("completed");
            assert_eq!(edit.graphics.len(), 1);
            settle().await;
            assert_eq!(fx.layer.borrow().len(), 5);
        })
        .await;
}

#[tokio::test]
async fn test_delete_key_removes_graphic() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let (_, line_id) = seed(&fx);

            let op = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            fx.view.press_key("Delete");

            assert_eq!(op.outcome().await, OperationOutcome::Cancelled);
            settle().await;
            assert_eq!(fx.layer.borrow().len(), 4);
            assert!(!fx.layer.borrow().contains(line_id));
            assert!(fx.bus.history(None).contains(&AppEvent::Layer(LayerEvent::GraphicDeleted {
                layer: "sketches".into(),
            })));
        })
        .await;
}

#[tokio::test]
async fn test_idle_click_starts_update() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let (_, line_id) = seed(&fx);
            fx.editor.listen().expect("listen");

            fx.view.click_at(Point::new(40.0, 40.0));
            settle().await;
            assert!(!fx.editor.is_active());

            fx.view.click_at(Point::new(5.0, 12.3));
            settle().await;
            let op = fx.editor.current_operation().expect("update started");
            assert_eq!(op.anchor_index(), Some(2));
            assert_eq!(op.mode().label(), "update");

            fx.view.double_click_at(Point::new(5.0, 12.0));
            assert!(op.outcome().await.completed().is_some());
            settle().await;
            assert!(fx.layer.borrow().iter().all(|g| g.id() != line_id));
            fx.editor.destroy();
        })
        .await;
}

#[tokio::test]
async fn test_interrupting_update_restores_original() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let (originals, line_id) = seed(&fx);

            let update = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            fx.view.pointer_down_at(Point::new(5.0, 12.0));
            fx.view.move_to(Point::new(5.0, 16.0));
            settle().await;
            assert_ne!(
                fx.layer.borrow().get(line_id).map(|g| g.geometry.clone()),
                Some(originals[2].geometry.clone())
            );

            let create = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Point,
                    Symbol::marker(Color::BLACK, 4.0),
                ))
                .expect("create");
            assert_eq!(update.state(), OperationState::Interrupted);
            assert_eq!(
                fx.layer.borrow().get(line_id).map(|g| g.geometry.clone()),
                Some(originals[2].geometry.clone())
            );

            assert_eq!(update.outcome().await, OperationOutcome::Interrupted);
            fx.view.click_at(Point::new(25.0, 2.0));
            assert!(create.outcome().await.completed().is_some());
            settle().await;

            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 6);
            assert_eq!(
                layer.get(line_id).map(|g| g.geometry.clone()),
                Some(originals[2].geometry.clone())
            );
        })
        .await;
}

#[tokio::test]
async fn test_reupdating_same_graphic_keeps_committed_original() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let (originals, line_id) = seed(&fx);

            let first = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            fx.view.pointer_down_at(Point::new(5.0, 12.0));
            fx.view.move_to(Point::new(5.0, 16.0));
            settle().await;

            // No settle between the drag and the second update.
            let second = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("second update");
            assert_eq!(first.state(), OperationState::Interrupted);
            assert_eq!(second.anchor_index(), Some(2));

            fx.view.press_key("Escape");
            assert_eq!(second.outcome().await, OperationOutcome::Cancelled);
            assert_eq!(first.outcome().await, OperationOutcome::Interrupted);
            settle().await;

            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 5);
            assert_eq!(
                layer.get(line_id).map(|g| g.geometry.clone()),
                Some(originals[2].geometry.clone())
            );
            assert!(!fx.editor.is_active());
        })
        .await;
}

#[tokio::test]
async fn test_reupdate_edits_survive_late_teardown() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let (_, line_id) = seed(&fx);

            fx.editor
                .update(&"sketches".into(), line_id)
                .expect("update");
            fx.view.pointer_down_at(Point::new(5.0, 12.0));
            fx.view.move_to(Point::new(5.0, 16.0));
            settle().await;

            let second = fx
                .editor
                .update(&"sketches".into(), line_id)
                .expect("second update");
            fx.view.pointer_down_at(Point::new(5.0, 12.0));
            fx.view.move_to(Point::new(5.0, 14.0));
            fx.view.press_key("c");

            let edit = second.outcome().await.completed().expect("completed").clone();
            settle().await;

            let moved = Geometry::polyline(vec![pts(&[(2.0, 14.0), (8.0, 14.0)])], SR);
            assert_eq!(edit.graphics.len(), 1);
            assert!(edit.graphics[0].geometry.approx_eq(&moved, 1e-9));
            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 5);
            assert!(layer.at(2).unwrap().geometry.approx_eq(&moved, 1e-9));
        })
        .await;
}
