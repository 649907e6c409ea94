//! Tiled GetMap source parameters for overlay layers.
//!
//! Every overlay is drawn from a tiled WMS source. The same parameter set also
//! seeds GetFeatureInfo requests against that layer.

use wms_common::LayerDescriptor;

use crate::version::WmsVersion;

/// Image format requested for map tiles.
pub const DEFAULT_IMAGE_FORMAT: &str = "image/png";

/// Parameters of a tiled WMS source for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GetMapParams {
    /// Value of LAYERS
    pub layers: String,
    pub version: WmsVersion,
    /// MIME type of the rendered tiles
    pub format: String,
    /// Base layers are requested opaque
    pub transparent: bool,
    /// GeoServer meta-tiling hint
    pub tiled: bool,
    pub styles: String,
}

impl GetMapParams {
    /// Tile source parameters for a registry layer.
    pub fn for_layer(layer: &LayerDescriptor) -> Self {
        Self {
            layers: layer.id.to_string(),
            version: WmsVersion::V1_1_1,
            format: DEFAULT_IMAGE_FORMAT.to_string(),
            transparent: !layer.is_base,
            tiled: true,
            styles: String::new(),
        }
    }

    pub fn with_version(mut self, version: WmsVersion) -> Self {
        self.version = version;
        self
    }

    /// Key/value pairs common to GetMap and GetFeatureInfo.
    pub fn to_kvp(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", self.version.as_str().to_string()),
            ("FORMAT", self.format.clone()),
            ("TRANSPARENT", bool_param(self.transparent)),
            ("LAYERS", self.layers.clone()),
            ("TILED", bool_param(self.tiled)),
            ("STYLES", self.styles.clone()),
        ]
    }
}

fn bool_param(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}
