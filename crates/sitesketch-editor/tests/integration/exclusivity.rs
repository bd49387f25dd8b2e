use crate::support::{fixture, settle, u_boundary};
use sitesketch_core::Point;
use sitesketch_editor::{
    Color, CreateRequest, OperationOutcome, OperationState, SketchKind, Symbol,
};
use tokio::task::LocalSet;

fn polygon_request() -> CreateRequest {
    CreateRequest::new("sketches", SketchKind::Polygon, Symbol::fill(Color::ORANGE))
}

#[tokio::test]
async fn test_new_operation_interrupts_live_one() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(Some(u_boundary()));
            let watch = fx.editor.watch_operation();

            let first = fx.editor.create(polygon_request()).expect("first");
            fx.view.click_at(Point::new(1.0, 1.0));
            fx.view.click_at(Point::new(4.0, 1.0));
            settle().await;
            assert_eq!(fx.layer.borrow().len(), 1, "first preview drawn");

            let second = fx.editor.create(polygon_request()).expect("second");
            assert_eq!(first.state(), OperationState::Interrupted);
            assert_eq!(second.state(), OperationState::Sketching);
            assert_eq!(watch.borrow().as_ref().map(|i| i.id), Some(second.id()));

            assert_eq!(first.outcome().await, OperationOutcome::Interrupted);
            settle().await;
            assert!(fx.layer.borrow().is_empty(), "first preview removed");
            assert_eq!(fx.editor.current_operation().map(|o| o.id()), Some(second.id()));

            fx.view.click_at(Point::new(1.0, 1.0));
            fx.view.click_at(Point::new(4.0, 1.0));
            fx.view.double_click_at(Point::new(2.0, 3.0));
            let outcome = second.outcome().await;
            assert_eq!(outcome.completed().map(|e| e.graphics.len()), Some(1));
            settle().await;
            assert_eq!(fx.layer.borrow().len(), 1);
            assert!(watch.borrow().is_none());
        })
        .await;
}

#[tokio::test]
async fn test_operation_ids_increase() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let a = fx.editor.create(polygon_request()).expect("a");
            let b = fx.editor.create(polygon_request()).expect("b");
            let c = fx.editor.create(polygon_request()).expect("c");
            assert!(a.id() < b.id() && b.id() < c.id());

            settle().await;
            let sketching = [&a, &b, &c]
                .iter()
                .filter(|o| o.state() == OperationState::Sketching)
                .count();
            assert_eq!(sketching, 1);
            fx.editor.destroy();
            assert_eq!(c.outcome().await, OperationOutcome::Interrupted);
        })
        .await;
}

#[tokio::test]
async fn test_external_cancel() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let op = fx.editor.create(polygon_request()).expect("create");
            assert!(fx.editor.cancel());
            assert_eq!(op.outcome().await, OperationOutcome::Cancelled);
            settle().await;
            assert!(!fx.editor.is_active());
            assert!(!fx.editor.cancel());
        })
        .await;
}
