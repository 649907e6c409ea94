//! Feature-info queries on map clicks.
//!
//! A click is handled in three steps so the event loop never waits on the
//! network while holding the viewer state:
//!
//! 1. [`FeatureQueryClient::prepare`] closes the popup, picks the first
//!    visible layer and builds the GetFeatureInfo URL.
//! 2. [`FeatureQueryClient::execute`] fetches and renders the response
//!    without touching the context.
//! 3. [`FeatureQueryClient::complete`] opens the popup, subject to the
//!    stale-response policy.
//!
//! Every failure is swallowed: the popup simply stays closed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use wms_common::{Coord, CrsCode, LayerId, WmsResult};
use wms_protocol::{render_popup_html, GetFeatureInfoRequest, GetMapParams, InfoFormat, WmsVersion};

use crate::config::FeatureInfoConfig;
use crate::context::ViewerContext;
use crate::http::{build_url, HttpFetcher};
use crate::popup::DEFAULT_POPUP_OFFSET_PX;
use crate::view::{MapView, Pixel};

/// What to do with a response that arrives after a newer click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    /// Whichever response arrives last fills the popup
    #[default]
    LastArrivalWins,
    /// Responses to superseded clicks are dropped
    DiscardSuperseded,
}

/// A single click on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapClick {
    /// Clicked position in the view projection
    pub coordinate: Coord,
    pub pixel: Pixel,
}

impl MapClick {
    pub fn at_pixel<V: MapView + ?Sized>(view: &V, pixel: Pixel) -> Option<Self> {
        Some(Self {
            coordinate: view.coordinate_from_pixel(pixel)?,
            pixel,
        })
    }

    pub fn at_coordinate<V: MapView + ?Sized>(view: &V, coordinate: Coord) -> Option<Self> {
        Some(Self {
            coordinate,
            pixel: view.pixel_from_coordinate(coordinate)?,
        })
    }
}

/// A prepared request, detached from the viewer state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    /// Sequence number of the click that produced this query
    pub generation: u64,
    pub layer: LayerId,
    pub url: String,
    /// Clicked pixel
    pub anchor: Pixel,
    pub format: InfoFormat,
}

/// Rendered response of a [`FeatureQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoResult {
    pub generation: u64,
    pub anchor: Pixel,
    pub html: String,
}

/// Issues GetFeatureInfo requests against one WMS endpoint.
pub struct FeatureQueryClient {
    fetcher: Arc<dyn HttpFetcher>,
    wms_url: String,
    format: InfoFormat,
    version: WmsVersion,
    feature_count: Option<u32>,
    popup_offset_px: f64,
    policy: StaleResponsePolicy,
}

impl FeatureQueryClient {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, wms_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            wms_url: wms_url.into(),
            format: InfoFormat::Html,
            version: WmsVersion::V1_1_1,
            feature_count: None,
            popup_offset_px: DEFAULT_POPUP_OFFSET_PX,
            policy: StaleResponsePolicy::default(),
        }
    }

    pub fn from_config(
        fetcher: Arc<dyn HttpFetcher>,
        wms_url: impl Into<String>,
        config: &FeatureInfoConfig,
    ) -> Self {
        Self {
            format: config.format,
            version: config.version,
            feature_count: config.feature_count,
            popup_offset_px: config.popup_offset_px,
            policy: config.stale_responses,
            ..Self::new(fetcher, wms_url)
        }
    }

    pub fn with_format(mut self, format: InfoFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_policy(mut self, policy: StaleResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StaleResponsePolicy {
        self.policy
    }

    /// GetFeatureInfo URL for a click on `layer`.
    pub fn build_url(
        &self,
        source: &GetMapParams,
        layer: &str,
        coordinate: Coord,
        resolution: f64,
        crs: CrsCode,
    ) -> WmsResult<String> {
        let source = source.clone().with_version(self.version);
        let mut request =
            GetFeatureInfoRequest::for_click(&source, layer, coordinate, resolution, crs, self.format)?;
        if let Some(count) = self.feature_count {
            request = request.with_feature_count(count);
        }
        let kvp = request.to_kvp();
        build_url(&self.wms_url, kvp.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// Synchronous half of a click: close the popup, advance the query
    /// generation, select the layer and build the request. `None` when there
    /// is nothing to query.
    pub fn prepare<V: MapView>(
        &self,
        ctx: &mut ViewerContext<V>,
        click: MapClick,
    ) -> Option<FeatureQuery> {
        ctx.popup_mut().close();
        // Every click supersedes earlier ones, even when it queries nothing.
        let generation = ctx.begin_query();

        let (descriptor, source) = match ctx.layers().first_visible() {
            Some(found) => found,
            None => {
                debug!("No visible layer to query");
                return None;
            }
        };
        let layer = descriptor.id.clone();

        let view = ctx.view();
        let resolution = view.resolution()?;
        let url = match self.build_url(
            source,
            layer.as_str(),
            click.coordinate,
            resolution,
            view.projection(),
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(layer = %layer, error = %e, "Could not build feature info request");
                return None;
            }
        };

        debug!(generation, layer = %layer, "Prepared feature info query");
        Some(FeatureQuery {
            generation,
            layer,
            url,
            anchor: click.pixel,
            format: self.format,
        })
    }

    /// Fetch and render. Errors are logged and dropped.
    #[instrument(skip(self, query), fields(generation = query.generation, layer = %query.layer))]
    pub async fn execute(&self, query: &FeatureQuery) -> Option<FeatureInfoResult> {
        let body = match self.fetcher.get_text(&query.url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Feature info request failed");
                return None;
            }
        };
        let html = match render_popup_html(query.format, &body) {
            Ok(html) => html,
            Err(e) => {
                debug!(error = %e, "Feature info response unreadable");
                return None;
            }
        };
        Some(FeatureInfoResult {
            generation: query.generation,
            anchor: query.anchor,
            html,
        })
    }

    /// Show a result in the popup. Returns true if the popup was opened.
    pub fn complete<V>(&self, ctx: &mut ViewerContext<V>, result: FeatureInfoResult) -> bool {
        if self.policy == StaleResponsePolicy::DiscardSuperseded
            && result.generation < ctx.latest_query()
        {
            debug!(
                generation = result.generation,
                latest = ctx.latest_query(),
                "Dropping superseded feature info"
            );
            return false;
        }
        ctx.popup_mut()
            .show(result.anchor, self.popup_offset_px, result.html);
        true
    }

    /// The whole click: prepare, execute, complete.
    pub async fn query_feature_at<V: MapView>(
        &self,
        ctx: &mut ViewerContext<V>,
        click: MapClick,
    ) -> bool {
        let Some(query) = self.prepare(ctx, click) else {
            return false;
        };
        match self.execute(&query).await {
            Some(result) => self.complete(ctx, result),
            None => false,
        }
    }
}
