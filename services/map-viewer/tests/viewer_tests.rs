//! Viewer context behaviour without a rendering surface.

mod common;

use common::sample_context;
use map_viewer::measure::{GeometryKind, InteractionKind};
use map_viewer::{
    EventOutcome, FitOptions, Geometry, Key, MapEvent, MapView, MeasureMode, MeasurementReport,
    Pixel, SimulatedView, ViewerContext,
};
use map_viewer::layers::LayerRegistry;
use wms_common::{BoundingBox, Coord, LayerDescriptor};

fn constrained() -> (ViewerContext<SimulatedView>, BoundingBox) {
    let view = SimulatedView::new(800, 600, Coord::new(500.0, 500.0), 10.0).with_overshoot(0.25);
    let layers = LayerRegistry::headless(vec![LayerDescriptor::new("webgis:a", "A")]);
    let mut ctx = ViewerContext::new(view, layers);
    let padded = ctx.apply_constraint(
        &BoundingBox::new(0.0, 0.0, 100_000.0, 100_000.0),
        0.05,
        &FitOptions::default(),
    );
    (ctx, padded)
}

// ============================================================================
// Viewport constraint
// ============================================================================

#[test]
fn test_center_stays_inside_after_pans() {
    let (mut ctx, padded) = constrained();
    let pans = [
        (5_000.0, 0.0),
        (-12_000.0, 300.0),
        (0.0, -9_000.0),
        (4_000.0, 4_000.0),
        (-250.0, 90.0),
    ];

    for (dx, dy) in pans {
        ctx.view_mut().pan_by(dx, dy);
        ctx.dispatch(MapEvent::MoveEnd);
        let c = ctx.view().center().unwrap();
        assert!(padded.contains_point(c.x, c.y), "center {:?} escaped", c);
    }
}

#[test]
fn test_overshoot_is_pulled_back() {
    let (mut ctx, padded) = constrained();
    ctx.view_mut().set_center(Coord::new(padded.max_x + 10_000.0, 50_000.0));

    let c = ctx.view().center().unwrap();
    assert!(!padded.contains_point(c.x, c.y));

    assert_eq!(
        ctx.dispatch(MapEvent::MoveEnd),
        EventOutcome::Recentered(Coord::new(padded.max_x, 50_000.0))
    );
}

#[test]
fn test_padded_boundary_contains_raw_extent() {
    let (ctx, padded) = constrained();
    assert!(padded.contains(&BoundingBox::new(0.0, 0.0, 100_000.0, 100_000.0)));
    assert_eq!(ctx.view().boundary(), Some(padded));
    assert_eq!(ctx.constraint().boundary(), Some(&padded));
}

// ============================================================================
// Layer panel
// ============================================================================

#[test]
fn test_double_toggle_restores_visibility_and_opacity() {
    let mut ctx = sample_context();
    let id = "webgis:areas_tudojunto";
    let before = ctx.layers().get(id).unwrap().clone();

    assert_eq!(ctx.toggle_visibility(id), Some(false));
    assert_eq!(ctx.toggle_visibility(id), Some(true));

    assert_eq!(ctx.layers().get(id), Some(&before));
}

#[test]
fn test_opacity_changes_show_in_panel() {
    let mut ctx = sample_context();
    ctx.set_opacity("webgis:linhas_tudojunto", 0.35);

    let panel = ctx.layers().panel();
    let lines = panel
        .iter()
        .find(|e| e.id == "webgis:linhas_tudojunto")
        .unwrap();
    assert_eq!(lines.opacity_percent, 35);
    assert!(panel[0].is_base);
}

// ============================================================================
// Measurement
// ============================================================================

#[test]
fn test_line_and_polygon_measurements() {
    let mut ctx = sample_context();

    ctx.set_measure_mode(MeasureMode::DrawingLine);
    let line = Geometry::line(vec![Coord::new(0.0, 0.0), Coord::new(3.0, 4.0)]).unwrap();
    assert_eq!(
        ctx.dispatch(MapEvent::DrawEnd(line)),
        EventOutcome::Measured(MeasurementReport::Length { meters: 5 })
    );

    ctx.set_measure_mode(MeasureMode::DrawingPolygon);
    let rect = Geometry::polygon(vec![
        Coord::new(0.0, 0.0),
        Coord::new(4.0, 0.0),
        Coord::new(4.0, 3.0),
        Coord::new(0.0, 3.0),
    ])
    .unwrap();
    assert_eq!(
        ctx.dispatch(MapEvent::DrawEnd(rect)),
        EventOutcome::Measured(MeasurementReport::Area { square_meters: 12 })
    );
    assert_eq!(ctx.measurement().geometries().len(), 2);
}

#[test]
fn test_mode_switch_swaps_sessions_and_keeps_drawings() {
    let mut ctx = sample_context();
    ctx.set_measure_mode(MeasureMode::DrawingLine);
    let line = Geometry::line(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)]).unwrap();
    ctx.dispatch(MapEvent::DrawEnd(line));

    ctx.set_measure_mode(MeasureMode::DrawingPolygon);
    let kinds: Vec<InteractionKind> = ctx.view().interactions().iter().map(|(_, k)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            InteractionKind::Draw(GeometryKind::Polygon),
            InteractionKind::Modify
        ]
    );

    ctx.set_measure_mode(MeasureMode::Idle);
    assert!(ctx.view().interactions().is_empty());
    assert_eq!(ctx.measurement().geometries().len(), 1);

    ctx.clear_measurements();
    assert!(ctx.measurement().geometries().is_empty());
}

// ============================================================================
// Popup and teardown
// ============================================================================

#[test]
fn test_escape_key_closes_popup() {
    let mut ctx = sample_context();
    ctx.popup_mut().show(Pixel::new(5.0, 5.0), 12.0, "<p/>");

    assert_eq!(
        ctx.dispatch(MapEvent::KeyDown(Key::from_name("a"))),
        EventOutcome::Unchanged
    );
    assert_eq!(
        ctx.dispatch(MapEvent::KeyDown(Key::from_name("Escape"))),
        EventOutcome::PopupClosed
    );
    assert!(!ctx.popup().open);
}

#[test]
fn test_teardown_detaches_view() {
    let (mut ctx, _) = constrained();
    ctx.set_measure_mode(MeasureMode::DrawingPolygon);

    let view = ctx.teardown();
    assert!(!view.is_attached());
    assert!(view.interactions().is_empty());
    assert_eq!(view.boundary(), None);
}
