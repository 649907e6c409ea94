//! Viewer configuration.
//!
//! Loaded from a YAML file when one is given, otherwise the built-in
//! deployment defaults are used. `GEOSERVER_URL` and `WORKSPACE` from the
//! environment (or a `.env` file) override the service section.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use wms_common::{BoundingBox, Coord, LayerDescriptor, LayerId};
use wms_protocol::{InfoFormat, WmsVersion};

use crate::constraint::DEFAULT_PADDING_RATIO;
use crate::feature_query::StaleResponsePolicy;
use crate::popup::DEFAULT_POPUP_OFFSET_PX;
use crate::view::FitOptions;

/// Environment variable overriding `service.base_url`.
pub const ENV_BASE_URL: &str = "GEOSERVER_URL";

/// Environment variable overriding `service.workspace`.
pub const ENV_WORKSPACE: &str = "WORKSPACE";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerConfig {
    pub service: ServiceConfig,
    /// Overlay layers in draw order; the first is the base layer
    pub layers: Vec<LayerConfig>,
    /// Static extent `[west, south, east, north]` in degrees, used when the
    /// capabilities give nothing usable
    #[serde(default)]
    pub fallback_bbox_lonlat: Option<[f64; 4]>,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub feature_info: FeatureInfoConfig,
}

/// WMS service location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Server root, e.g. `http://localhost:8080/geoserver`
    pub base_url: String,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    /// Path of the WMS endpoint below `base_url`
    #[serde(default = "default_wms_path")]
    pub wms_path: String,
}

fn default_workspace() -> String {
    "webgis".to_string()
}

fn default_wms_path() -> String {
    "/wms".to_string()
}

impl ServiceConfig {
    /// Full WMS endpoint URL.
    pub fn wms_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.wms_path.trim_start_matches('/')
        )
    }
}

/// One overlay layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerConfig {
    /// Layer name; unqualified names get the service workspace prefix
    pub name: String,
    /// Panel label, defaults to the name
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Request transparent tiles
    #[serde(default = "default_true")]
    pub transparent: bool,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

impl LayerConfig {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: Some(title.to_string()),
            visible: true,
            opacity: 1.0,
            transparent: true,
        }
    }

    /// Service-qualified name.
    pub fn qualified_name(&self, workspace: &str) -> String {
        match LayerId::parse(&self.name) {
            (Some(_), _) => self.name.clone(),
            (None, name) => format!("{}:{}", workspace, name),
        }
    }
}

/// Initial view and constraint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    #[serde(default = "default_center")]
    pub initial_center_lonlat: [f64; 2],
    #[serde(default = "default_zoom")]
    pub initial_zoom: f64,
    #[serde(default = "default_padding_ratio")]
    pub padding_ratio: f64,
    #[serde(default = "default_fit_padding")]
    pub fit_padding_px: f64,
    #[serde(default = "default_fit_duration")]
    pub fit_duration_ms: u64,
    /// Size of the headless map surface in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_center() -> [f64; 2] {
    [-47.9, -15.8]
}

fn default_zoom() -> f64 {
    5.0
}

fn default_padding_ratio() -> f64 {
    DEFAULT_PADDING_RATIO
}

fn default_fit_padding() -> f64 {
    24.0
}

fn default_fit_duration() -> u64 {
    250
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            initial_center_lonlat: default_center(),
            initial_zoom: default_zoom(),
            padding_ratio: default_padding_ratio(),
            fit_padding_px: default_fit_padding(),
            fit_duration_ms: default_fit_duration(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl ViewConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions::uniform(
            self.fit_padding_px,
            Duration::from_millis(self.fit_duration_ms),
        )
    }

    pub fn initial_center(&self) -> Coord {
        Coord::new(self.initial_center_lonlat[0], self.initial_center_lonlat[1])
    }
}

/// Feature-info query settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureInfoConfig {
    #[serde(default)]
    pub format: InfoFormat,
    #[serde(default = "default_popup_offset")]
    pub popup_offset_px: f64,
    #[serde(default)]
    pub stale_responses: StaleResponsePolicy,
    /// Protocol version of GetFeatureInfo requests; tile sources stay on 1.1.1
    #[serde(default)]
    pub version: WmsVersion,
    #[serde(default)]
    pub feature_count: Option<u32>,
}

fn default_popup_offset() -> f64 {
    DEFAULT_POPUP_OFFSET_PX
}

impl Default for FeatureInfoConfig {
    fn default() -> Self {
        Self {
            format: InfoFormat::default(),
            popup_offset_px: default_popup_offset(),
            stale_responses: StaleResponsePolicy::default(),
            version: WmsVersion::default(),
            feature_count: None,
        }
    }
}

impl Default for ViewerConfig {
    /// The sample deployment: an orthophoto base and three vector overlays.
    fn default() -> Self {
        let mut base = LayerConfig::new("webgis:Imagem24bits", "Ortofoto");
        base.transparent = false;
        let mut areas = LayerConfig::new("webgis:areas_tudojunto", "Áreas");
        areas.opacity = 0.9;

        Self {
            service: ServiceConfig {
                base_url: "http://localhost:8080/geoserver".to_string(),
                workspace: default_workspace(),
                wms_path: default_wms_path(),
            },
            layers: vec![
                base,
                areas,
                LayerConfig::new("webgis:linhas_tudojunto", "Eixos"),
                LayerConfig::new("webgis:pontos_tudojunto", "Pontos"),
            ],
            fallback_bbox_lonlat: None,
            view: ViewConfig::default(),
            feature_info: FeatureInfoConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Failed to parse viewer config")
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        debug!(path = %path.display(), layers = config.layers.len(), "Loaded config file");
        Ok(config)
    }

    /// File (or defaults), then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                info!("No config file given, using built-in defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_BASE_URL) {
            debug!(base_url = %url, "Service URL from environment");
            self.service.base_url = url;
        }
        if let Some(workspace) = non_empty(ENV_WORKSPACE) {
            self.service.workspace = workspace;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.service.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("service.base_url must be an http(s) URL, got '{}'", url);
        }
        if self.layers.is_empty() {
            bail!("at least one layer must be configured");
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            let name = layer.qualified_name(&self.service.workspace);
            if !seen.insert(name.clone()) {
                bail!("duplicate layer '{}'", name);
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                bail!(
                    "layer '{}': opacity must be within [0, 1], got {}",
                    name,
                    layer.opacity
                );
            }
            if let Some(ws) = LayerId::parse(&layer.name).0 {
                if ws != self.service.workspace {
                    warn!(layer = %name, workspace = %self.service.workspace, "Layer outside configured workspace");
                }
            }
        }

        if !self.view.padding_ratio.is_finite() || self.view.padding_ratio < 0.0 {
            bail!(
                "view.padding_ratio must be non-negative, got {}",
                self.view.padding_ratio
            );
        }
        if let Some(values) = self.fallback_bbox_lonlat {
            BoundingBox::try_from_array(values).context("fallback_bbox_lonlat")?;
        }
        Ok(())
    }

    /// Layer descriptors in configuration order.
    pub fn descriptors(&self) -> Vec<LayerDescriptor> {
        self.layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let name = layer.qualified_name(&self.service.workspace);
                let title = layer.title.clone().unwrap_or_else(|| name.clone());
                let mut descriptor = LayerDescriptor::new(name, title);
                descriptor.visible = layer.visible;
                descriptor.opacity = layer.opacity;
                descriptor.is_base = index == 0 && !layer.transparent;
                descriptor
            })
            .collect()
    }

    /// Qualified layer names in configuration order.
    pub fn layer_names(&self) -> Vec<String> {
        self.layers
            .iter()
            .map(|l| l.qualified_name(&self.service.workspace))
            .collect()
    }

    /// Static fallback extent in degrees, if configured and well-formed.
    pub fn fallback_extent(&self) -> Option<BoundingBox> {
        self.fallback_bbox_lonlat
            .and_then(|values| BoundingBox::try_from_array(values).ok())
    }

    pub fn wms_url(&self) -> String {
        self.service.wms_url()
    }
}
