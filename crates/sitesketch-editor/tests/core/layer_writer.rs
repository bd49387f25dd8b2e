use proptest::prelude::*;
use sitesketch_core::{EditorError, Geometry, GraphicId, Point, SpatialReference};
use sitesketch_editor::{Color, Graphic, GraphicsLayer, OrderedLayerWriter, Symbol};

fn marker(x: f64) -> Graphic {
    Graphic::new(
        Geometry::point(Point::new(x, 0.0), SpatialReference::WEB_MERCATOR),
        Symbol::marker(Color::BLACK, 4.0),
    )
}

fn ids(layer: &GraphicsLayer) -> Vec<GraphicId> {
    layer.iter().map(Graphic::id).collect()
}

#[test]
fn test_replace_anchor_keeps_draw_order() {
    let mut layer = GraphicsLayer::new("sketches");
    let (a, b, c, d) = (marker(0.0), marker(1.0), marker(2.0), marker(3.0));
    let (c_copy, d_copy) = (c.clone(), d.clone());
    let a_id = a.id();
    for g in [a, b, c, d] {
        layer.add(g);
    }

    let b1 = marker(10.0);
    let b2 = marker(11.0);
    let (b1_id, b2_id) = (b1.id(), b2.id());
    let summary = OrderedLayerWriter::replace(&mut layer, 1, vec![b1, b2]).unwrap();

    assert_eq!(summary.anchor_index, 1);
    assert_eq!(summary.inserted, vec![b1_id, b2_id]);
    assert_eq!(summary.reappended, 2);

    let order = ids(&layer);
    assert_eq!(order.len(), 5);
    assert_eq!(&order[..3], &[a_id, b1_id, b2_id]);

    let c_prime = layer.at(3).unwrap();
    let d_prime = layer.at(4).unwrap();
    assert!(c_prime.content_eq(&c_copy));
    assert!(d_prime.content_eq(&d_copy));
    assert_ne!(c_prime.id(), c_copy.id());
    assert_ne!(d_prime.id(), d_copy.id());
}

#[test]
fn test_append_returns_first_index() {
    let mut layer = GraphicsLayer::new("sketches");
    layer.add(marker(0.0));
    let start = OrderedLayerWriter::append(&mut layer, vec![marker(1.0), marker(2.0)]);
    assert_eq!(start, 1);
    assert_eq!(layer.len(), 3);
}

#[test]
fn test_replace_rejects_bad_anchor() {
    let mut layer = GraphicsLayer::new("sketches");
    assert_eq!(
        OrderedLayerWriter::replace(&mut layer, 0, vec![marker(0.0)]).unwrap_err(),
        EditorError::AnchorOutOfRange { index: 0, len: 0 }
    );
}

proptest! {
    #[test]
    fn prop_replace_preserves_order(len in 1usize..8, anchor_seed in 0usize..8, k in 0usize..4) {
        let anchor = anchor_seed % len;
        let originals: Vec<Graphic> = (0..len).map(|i| marker(i as f64)).collect();
        let mut layer = GraphicsLayer::new("sketches");
        for g in originals.clone() {
            layer.add(g);
        }
        let replacements: Vec<Graphic> = (0..k).map(|i| marker(100.0 + i as f64)).collect();
        let replacement_ids: Vec<GraphicId> = replacements.iter().map(Graphic::id).collect();

        OrderedLayerWriter::replace(&mut layer, anchor, replacements).unwrap();

        prop_assert_eq!(layer.len(), len - 1 + k);
        let order = ids(&layer);
        let below: Vec<GraphicId> = originals[..anchor].iter().map(Graphic::id).collect();
        prop_assert_eq!(&order[..anchor], &below[..]);
        prop_assert_eq!(&order[anchor..anchor + k], &replacement_ids[..]);
        for (offset, original) in originals[anchor + 1..].iter().enumerate() {
            let copy = layer.at(anchor + k + offset).unwrap();
            prop_assert!(copy.content_eq(original));
        }
    }
}
