//! Feature-info queries from map clicks.

mod common;

use std::sync::Arc;

use common::{sample_context, Reply, StubFetcher, WMS_URL};
use map_viewer::feature_query::FeatureInfoResult;
use map_viewer::{FeatureQueryClient, MapClick, Pixel, StaleResponsePolicy};
use wms_protocol::{InfoFormat, WmsVersion};

fn client(fetcher: Arc<StubFetcher>) -> FeatureQueryClient {
    FeatureQueryClient::new(fetcher, WMS_URL)
}

fn click_at_center(ctx: &map_viewer::ViewerContext<map_viewer::SimulatedView>) -> MapClick {
    MapClick::at_pixel(ctx.view(), Pixel::new(512.0, 384.0)).unwrap()
}

// ============================================================================
// Request construction
// ============================================================================

#[tokio::test]
async fn test_queries_first_visible_layer() {
    let fetcher = Arc::new(StubFetcher::new().route("GetFeatureInfo", Reply::Body("<p>ok</p>".into())));
    let client = client(fetcher.clone());
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);

    assert!(client.query_feature_at(&mut ctx, click).await);

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 1);
    let url = &requests[0];
    assert!(url.starts_with(WMS_URL));
    assert!(url.contains("REQUEST=GetFeatureInfo"));
    assert!(url.contains("VERSION=1.1.1"));
    assert!(url.contains("QUERY_LAYERS=webgis%3AImagem24bits"));
    assert!(url.contains("LAYERS=webgis%3AImagem24bits"));
    assert!(url.contains("TRANSPARENT=false"));
    assert!(url.contains("INFO_FORMAT=text%2Fhtml"));
    assert!(url.contains("WIDTH=256"));
    assert!(url.contains("HEIGHT=256"));
    assert!(url.contains("SRS=EPSG%3A3857"));
    assert!(url.contains("&X="));
    assert!(url.contains("&Y="));
}

#[tokio::test]
async fn test_hidden_base_moves_query_to_next_layer() {
    let fetcher = Arc::new(StubFetcher::new().route("GetFeatureInfo", Reply::Body(String::new())));
    let client = client(fetcher.clone());
    let mut ctx = sample_context();
    ctx.toggle_visibility("webgis:Imagem24bits");
    let click = click_at_center(&ctx);

    client.query_feature_at(&mut ctx, click).await;

    let url = &fetcher.requests()[0];
    assert!(url.contains("QUERY_LAYERS=webgis%3Aareas_tudojunto"));
    assert!(url.contains("TRANSPARENT=true"));
}

#[tokio::test]
async fn test_no_visible_layer_is_noop() {
    let fetcher = Arc::new(StubFetcher::new());
    let client = client(fetcher.clone());
    let mut ctx = sample_context();
    for name in ctx.layers().layer_names() {
        ctx.toggle_visibility(&name);
    }
    let click = click_at_center(&ctx);

    assert!(client.prepare(&mut ctx, click).is_none());
    assert!(!client.query_feature_at(&mut ctx, click).await);
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_wms_1_3_0_uses_i_j_and_crs() {
    let fetcher = Arc::new(StubFetcher::new());
    let config = map_viewer::config::FeatureInfoConfig {
        version: WmsVersion::V1_3_0,
        ..Default::default()
    };
    let client = FeatureQueryClient::from_config(fetcher, WMS_URL, &config);
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);

    let query = client.prepare(&mut ctx, click).unwrap();
    assert!(query.url.contains("VERSION=1.3.0"));
    assert!(query.url.contains("CRS=EPSG%3A3857"));
    assert!(query.url.contains("&I="));
    assert!(query.url.contains("&J="));
    assert!(!query.url.contains("SRS="));
}

// ============================================================================
// Popup
// ============================================================================

#[tokio::test]
async fn test_success_opens_popup_at_offset() {
    let body = "<table><tr><td>nome</td><td>Lote 7</td></tr></table>";
    let fetcher = Arc::new(StubFetcher::new().route("GetFeatureInfo", Reply::Body(body.into())));
    let client = client(fetcher);
    let mut ctx = sample_context();
    let click = MapClick::at_pixel(ctx.view(), Pixel::new(200.0, 150.0)).unwrap();

    assert!(client.query_feature_at(&mut ctx, click).await);

    let popup = ctx.popup();
    assert!(popup.open);
    assert_eq!((popup.x, popup.y), (212.0, 162.0));
    assert_eq!(popup.html, body);
}

#[tokio::test]
async fn test_json_response_rendered_as_table() {
    let body = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":"areas_tudojunto.3","properties":{"nome":"Quadra A"}}]}"#;
    let fetcher = Arc::new(StubFetcher::new().route("GetFeatureInfo", Reply::Body(body.into())));
    let client = client(fetcher.clone()).with_format(InfoFormat::Json);
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);

    assert!(client.query_feature_at(&mut ctx, click).await);
    assert!(fetcher.requests()[0].contains("INFO_FORMAT=application%2Fjson"));
    assert!(ctx.popup().html.contains("<h4>areas_tudojunto.3</h4>"));
    assert!(ctx.popup().html.contains("Quadra A"));
}

#[tokio::test]
async fn test_network_error_leaves_popup_closed() {
    let fetcher = Arc::new(StubFetcher::new().route("GetFeatureInfo", Reply::NetworkError));
    let client = client(fetcher);
    let mut ctx = sample_context();
    ctx.popup_mut().show(Pixel::new(1.0, 1.0), 12.0, "previous");
    let click = click_at_center(&ctx);

    assert!(!client.query_feature_at(&mut ctx, click).await);
    assert!(!ctx.popup().open);
}

#[tokio::test]
async fn test_http_error_and_bad_json_are_swallowed() {
    let fetcher = Arc::new(StubFetcher::new().route("GetFeatureInfo", Reply::Status(503)));
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);
    assert!(!client(fetcher).query_feature_at(&mut ctx, click).await);
    assert!(!ctx.popup().open);

    let fetcher = Arc::new(
        StubFetcher::new().route("GetFeatureInfo", Reply::Body("<ServiceExceptionReport/>".into())),
    );
    let json_client = client(fetcher).with_format(InfoFormat::Json);
    assert!(!json_client.query_feature_at(&mut ctx, click).await);
    assert!(!ctx.popup().open);
}

// ============================================================================
// Out-of-order responses
// ============================================================================

fn result(generation: u64, html: &str) -> FeatureInfoResult {
    FeatureInfoResult {
        generation,
        anchor: Pixel::new(10.0, 10.0),
        html: html.to_string(),
    }
}

#[tokio::test]
async fn test_last_arrival_wins_by_default() {
    let client = client(Arc::new(StubFetcher::new()));
    assert_eq!(client.policy(), StaleResponsePolicy::LastArrivalWins);
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);

    let first = client.prepare(&mut ctx, click).unwrap();
    let second = client.prepare(&mut ctx, click).unwrap();
    assert!(second.generation > first.generation);

    assert!(client.complete(&mut ctx, result(second.generation, "second")));
    assert!(client.complete(&mut ctx, result(first.generation, "first")));
    assert_eq!(ctx.popup().html, "first");
}

#[tokio::test]
async fn test_discard_superseded_drops_stale_response() {
    let client =
        client(Arc::new(StubFetcher::new())).with_policy(StaleResponsePolicy::DiscardSuperseded);
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);

    let first = client.prepare(&mut ctx, click).unwrap();
    let second = client.prepare(&mut ctx, click).unwrap();

    assert!(client.complete(&mut ctx, result(second.generation, "second")));
    assert!(!client.complete(&mut ctx, result(first.generation, "first")));
    assert_eq!(ctx.popup().html, "second");
}

#[tokio::test]
async fn test_click_without_query_still_supersedes_pending_response() {
    let client =
        client(Arc::new(StubFetcher::new())).with_policy(StaleResponsePolicy::DiscardSuperseded);
    let mut ctx = sample_context();
    let click = click_at_center(&ctx);

    let pending = client.prepare(&mut ctx, click).unwrap();

    for name in ctx.layers().layer_names() {
        ctx.toggle_visibility(&name);
    }
    assert!(client.prepare(&mut ctx, click).is_none());
    assert!(ctx.latest_query() > pending.generation);

    assert!(!client.complete(&mut ctx, result(pending.generation, "late")));
    assert!(!ctx.popup().open);
}
