//! WMS GetFeatureInfo client side.
//!
//! Builds the request for a map click the same way a tiled WMS source does:
//! the query window is the tile of the view's tile grid that contains the
//! clicked coordinate, and the pixel position is taken inside that tile.
//! Responses are turned into HTML for the map popup.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use wms_common::{AxisOrder, BoundingBox, Coord, CrsCode, WmsError, WmsResult};

use crate::getmap::GetMapParams;
use crate::version::WmsVersion;

/// Side of a square tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// GetFeatureInfo request parameters
#[derive(Debug, Clone)]
pub struct GetFeatureInfoRequest {
    /// Tile source the query is issued against
    pub source: GetMapParams,
    /// Layers to query for information
    pub query_layers: Vec<String>,
    /// Coordinate reference system of `bbox`
    pub crs: CrsCode,
    /// Extent of the query window
    pub bbox: BoundingBox,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Pixel column (X coordinate, 0-based from left)
    pub i: u32,
    /// Pixel row (Y coordinate, 0-based from top)
    pub j: u32,
    /// Response format
    pub info_format: InfoFormat,
    /// Maximum number of features to return
    pub feature_count: Option<u32>,
}

impl GetFeatureInfoRequest {
    /// Request for a click at `coordinate` (in `crs`) on a view rendered at
    /// `resolution` map units per pixel.
    pub fn for_click(
        source: &GetMapParams,
        query_layer: &str,
        coordinate: Coord,
        resolution: f64,
        crs: CrsCode,
        info_format: InfoFormat,
    ) -> WmsResult<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(WmsError::InvalidBbox(format!(
                "view resolution must be positive, got {}",
                resolution
            )));
        }
        if !coordinate.x.is_finite() || !coordinate.y.is_finite() {
            return Err(WmsError::InvalidBbox(format!(
                "click coordinate is not finite: ({}, {})",
                coordinate.x, coordinate.y
            )));
        }

        let tile_size = DEFAULT_TILE_SIZE;
        let bbox = tile_extent_containing(coordinate, resolution, crs, tile_size);
        let (i, j) = pixel_in_window(coordinate, &bbox, resolution, tile_size);

        Ok(Self {
            source: source.clone(),
            query_layers: vec![query_layer.to_string()],
            crs,
            bbox,
            width: tile_size,
            height: tile_size,
            i,
            j,
            info_format,
            feature_count: None,
        })
    }

    pub fn with_feature_count(mut self, count: u32) -> Self {
        self.feature_count = Some(count);
        self
    }

    /// Key/value pairs of the request, in the order a tiled source emits them.
    pub fn to_kvp(&self) -> Vec<(&'static str, String)> {
        let version = self.source.version;
        let (col_param, row_param) = version.pixel_params();

        let bbox = match version.axis_order(self.crs) {
            AxisOrder::XY => self.bbox.to_wms_string(),
            AxisOrder::LatLon => self.bbox.to_wms_string_yx(),
        };

        let mut kvp: Vec<(&'static str, String)> = Vec::with_capacity(18);
        kvp.push(("SERVICE", "WMS".to_string()));
        kvp.push(("VERSION", version.as_str().to_string()));
        kvp.push(("REQUEST", "GetFeatureInfo".to_string()));
        for (key, value) in self.source.to_kvp() {
            if !matches!(key, "SERVICE" | "VERSION" | "STYLES") {
                kvp.push((key, value));
            }
        }
        kvp.push(("QUERY_LAYERS", self.query_layers.join(",")));
        kvp.push(("INFO_FORMAT", self.info_format.to_mime().to_string()));
        if let Some(count) = self.feature_count {
            kvp.push(("FEATURE_COUNT", count.to_string()));
        }
        kvp.push((col_param, self.i.to_string()));
        kvp.push((row_param, self.j.to_string()));
        kvp.push(("WIDTH", self.width.to_string()));
        kvp.push(("HEIGHT", self.height.to_string()));
        kvp.push((version.crs_param(), self.crs.to_string()));
        kvp.push(("STYLES", self.source.styles.clone()));
        kvp.push(("BBOX", bbox));
        kvp
    }

    pub fn version(&self) -> WmsVersion {
        self.source.version
    }
}

/// Extent of the `tile_size` pixel tile containing `coordinate` in a grid
/// anchored at the top-left corner of the CRS domain.
pub fn tile_extent_containing(
    coordinate: Coord,
    resolution: f64,
    crs: CrsCode,
    tile_size: u32,
) -> BoundingBox {
    let world = crs.valid_bounds();
    let span = resolution * tile_size as f64;

    let col = ((coordinate.x - world.min_x) / span).floor();
    let row = ((world.max_y - coordinate.y) / span).floor();

    let min_x = world.min_x + col * span;
    let max_y = world.max_y - row * span;
    BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
}

/// Pixel (column, row) of `coordinate` inside a query window.
pub fn pixel_in_window(
    coordinate: Coord,
    window: &BoundingBox,
    resolution: f64,
    size: u32,
) -> (u32, u32) {
    let max = size.saturating_sub(1) as f64;
    let i = ((coordinate.x - window.min_x) / resolution).floor().clamp(0.0, max);
    let j = ((window.max_y - coordinate.y) / resolution).floor().clamp(0.0, max);
    (i as u32, j as u32)
}

/// Supported GetFeatureInfo response formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum InfoFormat {
    /// application/json - Machine-readable JSON
    #[serde(rename = "application/json")]
    Json,
    /// text/html - Human-readable HTML for popups
    #[serde(rename = "text/html")]
    #[default]
    Html,
    /// text/xml - OGC-compliant XML
    #[serde(rename = "text/xml")]
    Xml,
    /// text/plain - Simple text format
    #[serde(rename = "text/plain")]
    Text,
}

impl InfoFormat {
    /// Get MIME type string
    pub fn to_mime(&self) -> &'static str {
        match self {
            InfoFormat::Json => "application/json",
            InfoFormat::Html => "text/html",
            InfoFormat::Xml => "text/xml",
            InfoFormat::Text => "text/plain",
        }
    }
}

/// One feature of a GeoJSON feature-info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInfo {
    /// Feature id, e.g. "areas_tudojunto.12"
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

impl FeatureInfo {
    pub fn id_label(&self) -> Option<String> {
        match &self.id {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// GetFeatureInfo response in the GeoJSON `FeatureCollection` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInfoResponse {
    /// Response type identifier
    #[serde(rename = "type")]
    pub response_type: String,
    /// List of feature information
    #[serde(default)]
    pub features: Vec<FeatureInfo>,
}

impl FeatureInfoResponse {
    /// Parse a JSON response body.
    pub fn from_json(body: &str) -> WmsResult<Self> {
        let response: FeatureInfoResponse = serde_json::from_str(body)?;
        if response.response_type != "FeatureCollection" {
            return Err(WmsError::parse(
                "feature info",
                format!("expected FeatureCollection, got {}", response.response_type),
            ));
        }
        Ok(response)
    }

    /// Format as HTML for popup display
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"feature-info\">\n");

        for feature in &self.features {
            if let Some(id) = feature.id_label() {
                html.push_str(&format!("  <h4>{}</h4>\n", escape(id.as_str())));
            }
            html.push_str("  <table>\n");
            if let Some(properties) = &feature.properties {
                for (key, value) in properties {
                    html.push_str(&format!(
                        "    <tr><td>{}</td><td class=\"value\">{}</td></tr>\n",
                        escape(key.as_str()),
                        escape(display_value(value).as_str())
                    ));
                }
            }
            html.push_str("  </table>\n");
        }

        html.push_str("</div>");
        html
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turn a response body into popup HTML according to the requested format.
pub fn render_popup_html(format: InfoFormat, body: &str) -> WmsResult<String> {
    match format {
        InfoFormat::Html => Ok(body.to_string()),
        InfoFormat::Json => Ok(FeatureInfoResponse::from_json(body)?.to_html()),
        InfoFormat::Xml | InfoFormat::Text => Ok(format!("<pre>{}</pre>", escape(body))),
    }
}
