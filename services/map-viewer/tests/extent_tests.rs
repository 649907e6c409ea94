//! Extent resolution against canned capabilities documents.

mod common;

use std::sync::Arc;

use common::{sample_context, Reply, StubFetcher, WMS_URL};
use map_viewer::extent::SkipReason;
use map_viewer::{select_target_extent, ExtentResolver, FitOptions, MapView};
use projection::{ExtentTransform, WebMercator};
use test_utils::fixtures::{bbox, capabilities, layers};
use test_utils::{assert_bbox_approx_eq, assert_coords_approx_eq};
use wms_common::BoundingBox;

fn resolver_for(reply: Reply) -> (ExtentResolver, Arc<StubFetcher>) {
    let fetcher = Arc::new(StubFetcher::new().route("GetCapabilities", reply));
    let resolver = ExtentResolver::new(fetcher.clone(), Arc::new(WebMercator));
    (resolver, fetcher)
}

fn mercator(b: (f64, f64, f64, f64)) -> BoundingBox {
    WebMercator
        .transform_extent(&BoundingBox::new(b.0, b.1, b.2, b.3))
        .unwrap()
}

// ============================================================================
// Bounding-box encodings
// ============================================================================

#[tokio::test]
async fn test_both_encodings_resolve_to_same_extent() {
    let doc_a = capabilities::document(&[capabilities::ex_geographic_layer(
        layers::AREAS,
        bbox::AREAS,
    )]);
    let doc_b = capabilities::document(&[capabilities::lat_lon_layer(layers::AREAS, bbox::AREAS)]);

    let (a, _) = resolver_for(Reply::Body(doc_a));
    let (b, _) = resolver_for(Reply::Body(doc_b));

    let from_a = a.resolve_union_extent(&[layers::AREAS], WMS_URL).await.unwrap();
    let from_b = b.resolve_union_extent(&[layers::AREAS], WMS_URL).await.unwrap();

    assert_eq!(from_a, from_b);
    assert_bbox_approx_eq!(from_a, mercator(bbox::AREAS), 1e-6);
}

#[tokio::test]
async fn test_requests_capabilities_url() {
    let (resolver, fetcher) = resolver_for(Reply::Body(capabilities::sample_deployment()));
    resolver
        .resolve_union_extent(&[layers::ORTHOPHOTO], WMS_URL)
        .await
        .unwrap();

    assert_eq!(
        fetcher.requests(),
        vec![format!(
            "{}?service=WMS&version=1.3.0&request=GetCapabilities",
            WMS_URL
        )]
    );
}

// ============================================================================
// Union
// ============================================================================

#[tokio::test]
async fn test_union_contains_every_layer_box() {
    let (resolver, _) = resolver_for(Reply::Body(capabilities::sample_deployment()));
    let names = [
        layers::ORTHOPHOTO,
        layers::AREAS,
        layers::LINES,
        layers::POINTS,
    ];
    let report = resolver.resolve(&names, WMS_URL).await.unwrap();
    let union = report.extent.unwrap();

    assert_eq!(report.resolved.len(), 2);
    for (_, extent) in &report.resolved {
        assert!(union.contains(extent));
    }
    assert_bbox_approx_eq!(
        union,
        mercator(bbox::ORTHOPHOTO).extend(&mercator(bbox::AREAS)),
        1e-6
    );
}

#[tokio::test]
async fn test_duplicate_layer_name_uses_first_node() {
    let doc = capabilities::document(&[
        capabilities::ex_geographic_layer(layers::AREAS, bbox::AREAS),
        capabilities::ex_geographic_layer(layers::AREAS, bbox::GLOBAL),
    ]);
    let (resolver, _) = resolver_for(Reply::Body(doc));

    let extent = resolver
        .resolve_union_extent(&[layers::AREAS], WMS_URL)
        .await
        .unwrap();

    assert_bbox_approx_eq!(extent, mercator(bbox::AREAS), 1e-6);
}

#[tokio::test]
async fn test_unusable_layers_are_reported() {
    let (resolver, _) = resolver_for(Reply::Body(capabilities::sample_deployment()));
    let report = resolver
        .resolve(&[layers::LINES, layers::POINTS], WMS_URL)
        .await
        .unwrap();

    assert!(report.extent.is_none());
    assert_eq!(
        report.skipped,
        vec![
            (
                layers::LINES.to_string(),
                SkipReason::Malformed("LatLonBoundingBox".to_string())
            ),
            (layers::POINTS.to_string(), SkipReason::NotAdvertised),
        ]
    );
}

// ============================================================================
// Failure handling and fallback
// ============================================================================

#[tokio::test]
async fn test_http_500_is_not_found() {
    let (resolver, _) = resolver_for(Reply::Status(500));
    let err = resolver
        .resolve_union_extent(&[layers::AREAS], WMS_URL)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_network_error_is_not_found() {
    let (resolver, _) = resolver_for(Reply::NetworkError);
    let err = resolver
        .resolve_union_extent(&[layers::AREAS], WMS_URL)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_failure_falls_back_to_static_extent() {
    let (resolver, _) = resolver_for(Reply::Status(500));
    let resolved = resolver
        .resolve_union_extent(&[layers::AREAS], WMS_URL)
        .await;
    let fallback = BoundingBox::new(bbox::AREAS.0, bbox::AREAS.1, bbox::AREAS.2, bbox::AREAS.3);

    let target = select_target_extent(resolved, Some(&fallback), &WebMercator).unwrap();
    assert_bbox_approx_eq!(target, mercator(bbox::AREAS), 1e-6);

    let mut ctx = sample_context();
    let padded = ctx
        .constrain_to(Some(target), 0.05, &FitOptions::default())
        .unwrap();
    assert!(padded.contains(&target));
    let center = ctx.view().center().unwrap();
    assert_coords_approx_eq!(
        (center.x, center.y),
        (target.center().x, target.center().y),
        1e-6
    );
}

#[tokio::test]
async fn test_failure_without_fallback_leaves_view_alone() {
    let (resolver, _) = resolver_for(Reply::Status(500));
    let resolved = resolver
        .resolve_union_extent(&[layers::AREAS], WMS_URL)
        .await;

    let mut ctx = sample_context();
    let before = ctx.view().center();
    let target = select_target_extent(resolved, None, &WebMercator);

    assert!(ctx.constrain_to(target, 0.05, &FitOptions::default()).is_none());
    assert_eq!(ctx.view().center(), before);
    assert!(!ctx.constraint().is_active());
}
