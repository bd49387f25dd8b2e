use crate::support::{fixture, pts, settle, u_boundary, SR};
use sitesketch_core::{AppEvent, EditorError, Geometry, GraphicId, LayerEvent};
use sitesketch_editor::{
    Color, CreateRequest, Graphic, OperationOutcome, ReclipReport, SketchKind, Symbol,
};
use tokio::task::LocalSet;

#[test]
fn test_reclip_after_boundary_change() {
    let fx = fixture(None);
    let inside = Graphic::new(
        Geometry::polyline(vec![pts(&[(2.0, 2.0), (8.0, 2.0)])], SR),
        Symbol::line(Color::BLACK, 2.0),
    );
    let across = Graphic::new(
        Geometry::polyline(vec![pts(&[(-5.0, 12.0), (35.0, 12.0)])], SR),
        Symbol::line(Color::BLACK, 2.0),
    );
    let outside = Graphic::new(
        Geometry::polyline(vec![pts(&[(40.0, 40.0), (50.0, 40.0)])], SR),
        Symbol::line(Color::BLACK, 2.0),
    );
    let inside_id = inside.id();
    {
        let mut layer = fx.layer.borrow_mut();
        layer.add(inside);
        layer.add(across);
        layer.add(outside);
    }

    let untouched = fx.editor.reclip_all().expect("reclip");
    assert_eq!(untouched, ReclipReport { layers: 1, changed: 0, dropped: 0 });

    fx.editor.set_boundary(Some(u_boundary()));
    let report = fx.editor.reclip_all().expect("reclip");
    assert_eq!(report, ReclipReport { layers: 1, changed: 1, dropped: 1 });

    let layer = fx.layer.borrow();
    let order: Vec<GraphicId> = layer.iter().map(Graphic::id).collect();
    assert_eq!(order.len(), 3);
    assert_eq!(order[0], inside_id);
    assert!(fx.bus.history(None).contains(&AppEvent::Layer(LayerEvent::Reclipped {
        layer: "sketches".into(),
        changed: 1,
        dropped: 1,
    })));
}

#[tokio::test]
async fn test_reclip_refused_while_operation_live() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polygon,
                    Symbol::fill(Color::ORANGE),
                ))
                .expect("create");
            assert_eq!(
                fx.editor.reclip_all(),
                Err(EditorError::OperationInProgress { operation: op.id().0 })
            );
            fx.editor.destroy();
        })
        .await;
}

#[tokio::test]
async fn test_reclip_queued_until_operation_settles() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let across = Graphic::new(
                Geometry::polyline(vec![pts(&[(-5.0, 12.0), (35.0, 12.0)])], SR),
                Symbol::line(Color::BLACK, 2.0),
            );
            fx.layer.borrow_mut().add(across);

            let op = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polygon,
                    Symbol::fill(Color::ORANGE),
                ))
                .expect("create");
            fx.editor.set_boundary(Some(u_boundary()));
            assert_eq!(fx.editor.reclip_when_idle(), None);
            assert_eq!(fx.editor.reclip_when_idle(), None);
            assert!(fx.editor.reclip_pending());

            settle().await;
            assert_eq!(fx.layer.borrow().len(), 1, "nothing re-clipped while live");

            fx.view.press_key("Escape");
            assert_eq!(op.outcome().await, OperationOutcome::Cancelled);
            settle().await;

            assert!(!fx.editor.reclip_pending());
            let layer = fx.layer.borrow();
            assert_eq!(layer.len(), 2);
            let reclipped = fx
                .bus
                .history(None)
                .into_iter()
                .filter(|event| matches!(event, AppEvent::Layer(LayerEvent::Reclipped { .. })))
                .count();
            assert_eq!(reclipped, 1);
        })
        .await;
}

#[test]
fn test_reclip_when_idle_runs_immediately() {
    let fx = fixture(Some(u_boundary()));
    fx.layer.borrow_mut().add(Graphic::new(
        Geometry::polyline(vec![pts(&[(40.0, 40.0), (50.0, 40.0)])], SR),
        Symbol::line(Color::BLACK, 2.0),
    ));
    assert_eq!(
        fx.editor.reclip_when_idle(),
        Some(ReclipReport { layers: 1, changed: 0, dropped: 1 })
    );
    assert!(!fx.editor.reclip_pending());
    assert!(fx.layer.borrow().is_empty());
}
