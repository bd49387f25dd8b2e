use crate::support::{fixture, SR};
use sitesketch_core::{AppEvent, EditorError, ErrorEvent, Geometry, Point};
use sitesketch_editor::{
    Color, CreateRequest, Editor, Graphic, OperationState, SketchKind, Symbol,
};
use tokio::task::LocalSet;

#[test]
fn test_no_view() {
    let editor = Editor::default();
    let err = editor
        .create(CreateRequest::new(
            "sketches",
            SketchKind::Point,
            Symbol::marker(Color::BLACK, 4.0),
        ))
        .unwrap_err();
    assert_eq!(err, EditorError::NoView);
    assert!(!editor.is_active());
}

#[test]
fn test_unknown_layer_and_bad_symbol() {
    let fx = fixture(None);
    let err = fx
        .editor
        .create(CreateRequest::new(
            "nowhere",
            SketchKind::Point,
            Symbol::marker(Color::BLACK, 4.0),
        ))
        .unwrap_err();
    assert_eq!(
        err,
        EditorError::NoTargetLayer {
            layer: "nowhere".to_string()
        }
    );

    let err = fx
        .editor
        .create(CreateRequest::new(
            "sketches",
            SketchKind::Point,
            Symbol::fill(Color::ORANGE),
        ))
        .unwrap_err();
    assert!(matches!(err, EditorError::UnsupportedCombination { .. }));
    assert!(err.to_string().contains("fill"));

    let rejected = fx
        .bus
        .history(None)
        .into_iter()
        .filter(|e| matches!(e, AppEvent::Error(ErrorEvent::Precondition { .. })))
        .count();
    assert_eq!(rejected, 2);
}

#[test]
fn test_update_of_foreign_graphic() {
    let fx = fixture(None);
    let stray = Graphic::new(
        Geometry::point(Point::new(0.0, 0.0), SR),
        Symbol::marker(Color::BLACK, 4.0),
    );
    let err = fx
        .editor
        .update(&"sketches".into(), stray.id())
        .unwrap_err();
    assert!(matches!(err, EditorError::GraphicNotOwned { .. }));
}

#[tokio::test]
async fn test_failed_request_leaves_live_operation() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(None);
            let live = fx
                .editor
                .create(CreateRequest::new(
                    "sketches",
                    SketchKind::Polyline,
                    Symbol::line(Color::BLACK, 2.0),
                ))
                .expect("create");

            let result = fx.editor.create(CreateRequest::new(
                "sketches",
                SketchKind::Mesh,
                Symbol::line(Color::BLACK, 2.0),
            ));
            assert!(result.is_err());
            assert_eq!(live.state(), OperationState::Sketching);
            assert_eq!(fx.editor.current_operation().map(|o| o.id()), Some(live.id()));
            fx.editor.destroy();
        })
        .await;
}
