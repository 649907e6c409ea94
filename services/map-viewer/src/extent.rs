//! Union extent of the configured layers from the service capabilities.
//!
//! Per-layer problems (not advertised, no usable bounding box, projection
//! failure) skip that layer. Only an empty result, or a capabilities
//! document that cannot be fetched or parsed, makes resolution fail, and
//! both are reported as [`WmsError::NotFound`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use projection::ExtentTransform;
use wms_common::{BoundingBox, WmsError, WmsResult};
use wms_protocol::{capabilities_url, parse_capabilities, CapabilitiesDocument};

use crate::http::HttpFetcher;

/// Why a requested layer did not contribute to the extent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No layer element carries this name
    NotAdvertised,
    /// The layer has neither bounding-box encoding
    NoBoundingBox,
    /// The chosen encoding does not give four finite numbers
    Malformed(String),
    Projection(String),
}

/// Outcome of resolving one layer set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtentReport {
    /// Union in the target CRS, `None` when nothing resolved
    pub extent: Option<BoundingBox>,
    /// Layers that contributed, with their reprojected box
    pub resolved: Vec<(String, BoundingBox)>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Resolves layer extents against a WMS endpoint.
pub struct ExtentResolver {
    fetcher: Arc<dyn HttpFetcher>,
    transform: Arc<dyn ExtentTransform + Send + Sync>,
}

impl ExtentResolver {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        transform: Arc<dyn ExtentTransform + Send + Sync>,
    ) -> Self {
        Self { fetcher, transform }
    }

    /// Union of the reprojected bounding boxes of `layer_names`.
    pub async fn resolve_union_extent<S: AsRef<str>>(
        &self,
        layer_names: &[S],
        service_base_url: &str,
    ) -> WmsResult<BoundingBox> {
        let report = self.resolve(layer_names, service_base_url).await?;
        report
            .extent
            .ok_or_else(|| WmsError::NotFound("no requested layer has a usable bounding box".into()))
    }

    /// Like [`resolve_union_extent`](Self::resolve_union_extent), keeping the
    /// per-layer outcome.
    #[instrument(skip(self, layer_names), fields(layers = layer_names.len()))]
    pub async fn resolve<S: AsRef<str>>(
        &self,
        layer_names: &[S],
        service_base_url: &str,
    ) -> WmsResult<ExtentReport> {
        let document = self
            .fetch_capabilities(service_base_url)
            .await
            .map_err(|e| {
                warn!(error = %e, "Capabilities unavailable, extent not resolved");
                WmsError::NotFound(format!("capabilities unavailable: {}", e))
            })?;
        Ok(self.union_extent(&document, layer_names))
    }

    /// Fetch and parse the capabilities document.
    pub async fn fetch_capabilities(&self, service_base_url: &str) -> WmsResult<CapabilitiesDocument> {
        let url = capabilities_url(service_base_url);
        let body = self.fetcher.get_text(&url).await?;
        let document = parse_capabilities(&body)?;
        debug!(layers = document.layers.len(), "Parsed capabilities");
        Ok(document)
    }

    /// Union extent of `layer_names` in an already parsed document.
    pub fn union_extent<S: AsRef<str>>(
        &self,
        document: &CapabilitiesDocument,
        layer_names: &[S],
    ) -> ExtentReport {
        let mut report = ExtentReport::default();

        for name in layer_names.iter().map(AsRef::as_ref) {
            match self.layer_extent(document, name) {
                Ok(extent) => report.resolved.push((name.to_string(), extent)),
                Err(reason) => {
                    debug!(layer = name, ?reason, "Skipping layer");
                    report.skipped.push((name.to_string(), reason));
                }
            }
        }

        report.extent = BoundingBox::union_all(report.resolved.iter().map(|(_, e)| e));
        info!(
            resolved = report.resolved.len(),
            skipped = report.skipped.len(),
            "Resolved layer extents"
        );
        report
    }

    fn layer_extent(
        &self,
        document: &CapabilitiesDocument,
        name: &str,
    ) -> Result<BoundingBox, SkipReason> {
        let layer = document
            .find_layer(name)
            .ok_or(SkipReason::NotAdvertised)?;
        let variant = layer.bbox_variant().ok_or(SkipReason::NoBoundingBox)?;
        let geographic = variant
            .to_geographic()
            .ok_or_else(|| SkipReason::Malformed(variant.label().to_string()))?;

        self.transform
            .transform_extent(&geographic)
            .map_err(|e| SkipReason::Projection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use projection::{Identity, WebMercator};
    use wms_common::CrsCode;

    struct Fixed(WmsResult<String>);

    #[async_trait]
    impl HttpFetcher for Fixed {
        async fn get_text(&self, url: &str) -> WmsResult<String> {
            match &self.0 {
                Ok(body) => Ok(body.clone()),
                Err(_) => Err(WmsError::HttpStatus {
                    url: url.to_string(),
                    status: 500,
                }),
            }
        }
    }

    const DOC: &str = r#"<WMS_Capabilities version="1.3.0"><Capability>
      <Layer><Title>root</Title>
        <Layer><Name>ws:a</Name>
          <EX_GeographicBoundingBox>
            <westBoundLongitude>0</westBoundLongitude>
            <eastBoundLongitude>10</eastBoundLongitude>
            <southBoundLatitude>0</southBoundLatitude>
            <northBoundLatitude>10</northBoundLatitude>
          </EX_GeographicBoundingBox>
        </Layer>
        <Layer><Name>ws:b</Name>
          <LatLonBoundingBox minx="5" miny="-5" maxx="20" maxy="5"/>
        </Layer>
        <Layer><Name>ws:c</Name>
          <LatLonBoundingBox minx="abc" miny="-5" maxx="20" maxy="5"/>
        </Layer>
        <Layer><Name>ws:d</Name></Layer>
      </Layer>
    </Capability></WMS_Capabilities>"#;

    fn resolver(body: WmsResult<String>) -> ExtentResolver {
        ExtentResolver::new(
            Arc::new(Fixed(body)),
            Arc::new(Identity(CrsCode::Epsg4326)),
        )
    }

    #[tokio::test]
    async fn test_union_of_both_encodings() {
        let r = resolver(Ok(DOC.to_string()));
        let extent = r
            .resolve_union_extent(&["ws:a", "ws:b"], "http://x/wms")
            .await
            .unwrap();
        assert_eq!(extent, BoundingBox::new(0.0, -5.0, 20.0, 10.0));
    }

    #[tokio::test]
    async fn test_bad_layers_are_skipped() {
        let r = resolver(Ok(DOC.to_string()));
        let report = r
            .resolve(&["ws:c", "ws:d", "ws:missing", "ws:b"], "http://x/wms")
            .await
            .unwrap();

        assert_eq!(report.extent, Some(BoundingBox::new(5.0, -5.0, 20.0, 5.0)));
        assert_eq!(
            report.skipped,
            vec![
                (
                    "ws:c".to_string(),
                    SkipReason::Malformed("LatLonBoundingBox".to_string())
                ),
                ("ws:d".to_string(), SkipReason::NoBoundingBox),
                ("ws:missing".to_string(), SkipReason::NotAdvertised),
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_resolved_is_not_found() {
        let r = resolver(Ok(DOC.to_string()));
        let err = r
            .resolve_union_extent(&["ws:c", "ws:d"], "http://x/wms")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_error_is_not_found() {
        let r = resolver(Err(WmsError::NotFound(String::new())));
        let err = r
            .resolve_union_extent(&["ws:a"], "http://x/wms")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_malformed_document_is_not_found() {
        let r = resolver(Ok("<WMS_Capabilities><Layer>".to_string()));
        let err = r
            .resolve_union_extent(&["ws:a"], "http://x/wms")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_projection_failure_skips_layer() {
        let doc = parse_capabilities(
            r#"<WMS_Capabilities><Capability><Layer><Name>ws:p</Name>
            <LatLonBoundingBox minx="0" miny="-95" maxx="1" maxy="1"/>
            </Layer></Capability></WMS_Capabilities>"#,
        )
        .unwrap();
        let r = ExtentResolver::new(
            Arc::new(Fixed(Ok(String::new()))),
            Arc::new(WebMercator),
        );
        let report = r.union_extent(&doc, &["ws:p"]);
        assert!(report.extent.is_none());
        assert!(matches!(report.skipped[0].1, SkipReason::Projection(_)));
    }
}
