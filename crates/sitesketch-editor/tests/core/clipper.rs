use sitesketch_core::data::geometry::ring_signed_area;
use sitesketch_core::{BoundaryPolygon, Geometry, GeometryError, Point, SpatialReference};
use sitesketch_editor::{Color, GeometryClipper, Graphic, Symbol};
use std::sync::Arc;

const SR: SpatialReference = SpatialReference::WEB_MERCATOR;

fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

/// 30 x 20 block with a 10 wide notch cut down to y = 5.
fn u_boundary() -> Arc<BoundaryPolygon> {
    let ring = pts(&[
        (0.0, 0.0),
        (30.0, 0.0),
        (30.0, 20.0),
        (20.0, 20.0),
        (20.0, 5.0),
        (10.0, 5.0),
        (10.0, 20.0),
        (0.0, 20.0),
    ]);
    Arc::new(BoundaryPolygon::new(vec![ring], SR).expect("valid boundary"))
}

fn rect(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Vec<Point> {
    pts(&[(xmin, ymin), (xmax, ymin), (xmax, ymax), (xmin, ymax)])
}

#[test]
fn test_polygon_across_notch_splits_in_two() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let band = Geometry::polygon(vec![rect(-5.0, 10.0, 35.0, 15.0)], SR);

    let parts = clipper.clip(&band).unwrap();
    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert_eq!(part.part_count(), 1);
        assert!((part.area() - 50.0).abs() < 1e-6, "area {}", part.area());
    }

    let mut xmins: Vec<f64> = parts
        .iter()
        .filter_map(|p| p.extent())
        .map(|e| e.xmin)
        .collect();
    xmins.sort_by(f64::total_cmp);
    assert!((xmins[0] - 0.0).abs() < 1e-6);
    assert!((xmins[1] - 20.0).abs() < 1e-6);
}

#[test]
fn test_boundary_with_hole_is_refused() {
    let framed = BoundaryPolygon::new(
        vec![rect(0.0, 0.0, 30.0, 30.0), rect(10.0, 10.0, 20.0, 20.0)],
        SR,
    );
    assert_eq!(
        framed.unwrap_err(),
        GeometryError::OverlappingRings { first: 0, second: 1 }
    );
}

#[test]
fn test_multi_ring_boundary_agrees_with_contains() {
    let boundary = Arc::new(
        BoundaryPolygon::new(
            vec![rect(0.0, 0.0, 10.0, 30.0), rect(20.0, 0.0, 30.0, 30.0)],
            SR,
        )
        .expect("disjoint rings"),
    );
    let clipper = GeometryClipper::new(Some(boundary.clone()));

    let in_gap = Geometry::polygon(vec![rect(12.0, 12.0, 18.0, 18.0)], SR);
    assert!(!boundary.contains(&Point::new(15.0, 15.0)));
    assert!(clipper.clip(&in_gap).unwrap().is_empty());

    let band = Geometry::polygon(vec![rect(-5.0, 12.0, 35.0, 15.0)], SR);
    let parts = clipper.clip(&band).unwrap();
    assert_eq!(parts.len(), 2);
    let total: f64 = parts.iter().map(Geometry::area).sum();
    assert!((total - 60.0).abs() < 1e-6, "total area {}", total);
    for part in &parts {
        let extent = part.extent().expect("extent");
        assert!(boundary.contains(&extent.center()));
    }
}

#[test]
fn test_clockwise_input_stays_clockwise() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let mut ring = rect(-5.0, 10.0, 35.0, 15.0);
    ring.reverse();
    let parts = clipper.clip(&Geometry::polygon(vec![ring], SR)).unwrap();
    assert_eq!(parts.len(), 2);
    for part in &parts {
        let Geometry::Polygon { rings, .. } = part else {
            panic!("expected polygon");
        };
        assert!(ring_signed_area(&rings[0]) < 0.0);
    }
}

#[test]
fn test_interior_polygon_is_unchanged() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let inside = Geometry::polygon(vec![rect(2.0, 1.0, 28.0, 4.0)], SR);
    let parts = clipper.clip(&inside).unwrap();
    assert_eq!(parts, vec![inside.clone()]);

    let again = clipper.clip(&parts[0]).unwrap();
    assert_eq!(again, parts);
}

#[test]
fn test_polygon_outside_is_dropped() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let notch = Geometry::polygon(vec![rect(12.0, 8.0, 18.0, 18.0)], SR);
    assert!(clipper.clip(&notch).unwrap().is_empty());

    let far = Geometry::polygon(vec![rect(100.0, 100.0, 110.0, 110.0)], SR);
    assert!(clipper.clip(&far).unwrap().is_empty());
}

#[test]
fn test_line_across_notch_splits_in_two() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let line = Geometry::polyline(vec![pts(&[(-5.0, 12.0), (35.0, 12.0)])], SR);

    let parts = clipper.clip(&line).unwrap();
    let expected = [
        Geometry::polyline(vec![pts(&[(0.0, 12.0), (10.0, 12.0)])], SR),
        Geometry::polyline(vec![pts(&[(20.0, 12.0), (30.0, 12.0)])], SR),
    ];
    assert_eq!(parts.len(), 2);
    for (part, expected) in parts.iter().zip(&expected) {
        assert!(part.approx_eq(expected, 1e-9), "{:?}", part);
    }

    // Clipping the pieces again is a no-op
    for part in &parts {
        let again = clipper.clip(part).unwrap();
        assert_eq!(again.len(), 1);
        assert!(again[0].approx_eq(part, 1e-9));
    }
}

#[test]
fn test_bent_line_keeps_inside_vertices() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let line = Geometry::polyline(vec![pts(&[(5.0, 25.0), (5.0, 2.0), (25.0, 2.0), (25.0, 25.0)])], SR);
    let parts = clipper.clip(&line).unwrap();
    assert_eq!(parts.len(), 1);
    let expected = Geometry::polyline(
        vec![pts(&[(5.0, 20.0), (5.0, 2.0), (25.0, 2.0), (25.0, 20.0)])],
        SR,
    );
    assert!(parts[0].approx_eq(&expected, 1e-9), "{:?}", parts[0]);
}

#[test]
fn test_slivers_below_epsilon_are_dropped() {
    let clipper = GeometryClipper::new(Some(u_boundary())).with_epsilon(0.5);

    let sliver = Geometry::polygon(vec![rect(-5.0, 1.0, 0.1, 2.0)], SR);
    assert!(clipper.clip(&sliver).unwrap().is_empty());

    let stub = Geometry::polyline(vec![pts(&[(-5.0, 2.0), (0.1, 2.0)])], SR);
    assert!(clipper.clip(&stub).unwrap().is_empty());
}

#[test]
fn test_points_in_notch_are_dropped() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let inside = Geometry::point(Point::new(15.0, 2.0), SR);
    let notch = Geometry::point(Point::new(15.0, 12.0), SR);
    assert_eq!(clipper.clip(&inside).unwrap(), vec![inside]);
    assert!(clipper.clip(&notch).unwrap().is_empty());
}

#[test]
fn test_clip_graphic_absorbs_errors() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let bowtie = Graphic::new(
        Geometry::polygon(vec![pts(&[(1.0, 1.0), (4.0, 4.0), (4.0, 1.0), (1.0, 4.0)])], SR),
        Symbol::fill(Color::ORANGE),
    );
    assert!(matches!(
        clipper.clip(&bowtie.geometry),
        Err(GeometryError::SelfIntersecting { ring: 0 })
    ));
    assert!(clipper.clip_graphic(&bowtie).is_empty());
}

#[test]
fn test_clip_graphic_keeps_style() {
    let clipper = GeometryClipper::new(Some(u_boundary()));
    let line = Graphic::new(
        Geometry::polyline(vec![pts(&[(-5.0, 12.0), (35.0, 12.0)])], SR),
        Symbol::line(Color::BLACK, 2.0),
    )
    .with_attribute("name", serde_json::json!("fence"));

    let parts = clipper.clip_graphic(&line);
    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert_ne!(part.id(), line.id());
        assert_eq!(part.symbol, line.symbol);
        assert_eq!(part.attributes, line.attributes);
    }
}
