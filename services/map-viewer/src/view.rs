//! The map view seam and a headless implementation.
//!
//! The rendering engine owns the real view. The viewer only needs to read
//! and set the center, read the resolution, fit an extent and register a
//! center-only pan boundary, so those operations form the [`MapView`] trait.
//! [`SimulatedView`] implements it without a drawing surface for the CLI and
//! for tests.

use std::time::Duration;

use projection::{ExtentTransform, WebMercator};
use wms_common::crs::WEB_MERCATOR_HALF_EXTENT;
use wms_common::{BoundingBox, Coord, CrsCode, WmsResult};

use crate::config::ViewConfig;
use crate::measure::{InteractionHost, InteractionId, InteractionKind};

/// Resolution of zoom level 0 in a 256 px Web Mercator tile pyramid.
pub const MAX_RESOLUTION: f64 = 2.0 * WEB_MERCATOR_HALF_EXTENT / 256.0;

/// Screen position in pixels from the top-left corner of the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Options for fitting an extent into the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Margin kept free on each side: top, right, bottom, left
    pub padding_px: [f64; 4],
    /// Animation length
    pub duration: Duration,
}

impl FitOptions {
    pub fn uniform(padding_px: f64, duration: Duration) -> Self {
        Self {
            padding_px: [padding_px; 4],
            duration,
        }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::uniform(24.0, Duration::from_millis(250))
    }
}

/// Zoom level for a resolution in the standard tile pyramid.
pub fn zoom_for_resolution(resolution: f64) -> f64 {
    (MAX_RESOLUTION / resolution).log2()
}

/// Resolution for a zoom level in the standard tile pyramid.
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    MAX_RESOLUTION / 2f64.powf(zoom)
}

/// The map view as the viewer core sees it.
pub trait MapView {
    /// Working projection of the view.
    fn projection(&self) -> CrsCode;

    fn center(&self) -> Option<Coord>;

    fn set_center(&mut self, center: Coord);

    /// Map units per pixel.
    fn resolution(&self) -> Option<f64>;

    fn zoom(&self) -> Option<f64> {
        self.resolution().map(zoom_for_resolution)
    }

    fn fit(&mut self, extent: &BoundingBox, options: &FitOptions);

    /// Register the view's own center-only pan limit, or remove it.
    fn set_center_boundary(&mut self, boundary: Option<BoundingBox>);

    fn coordinate_from_pixel(&self, pixel: Pixel) -> Option<Coord>;

    fn pixel_from_coordinate(&self, coordinate: Coord) -> Option<Pixel>;

    /// Detach the view from its drawing surface.
    fn detach(&mut self);
}

/// A view without a drawing surface.
///
/// The native center constraint is deliberately loose when `overshoot` is
/// non-zero: the boundary is widened by that ratio before clamping, which
/// is how animated renderers behave at the end of a kinetic pan. The
/// post-move correction has to pull the center back.
#[derive(Debug, Clone)]
pub struct SimulatedView {
    width: u32,
    height: u32,
    center: Coord,
    resolution: f64,
    boundary: Option<BoundingBox>,
    overshoot: f64,
    attached: bool,
    last_fit: Option<(BoundingBox, FitOptions)>,
    next_interaction: u64,
    interactions: Vec<(InteractionId, InteractionKind)>,
}

impl SimulatedView {
    pub fn new(width: u32, height: u32, center: Coord, zoom: f64) -> Self {
        Self {
            width,
            height,
            center,
            resolution: resolution_for_zoom(zoom),
            boundary: None,
            overshoot: 0.0,
            attached: true,
            last_fit: None,
            next_interaction: 1,
            interactions: Vec::new(),
        }
    }

    /// Initial view of the configured surface: the lon/lat center projected
    /// to Web Mercator at the configured zoom.
    pub fn from_config(config: &ViewConfig) -> WmsResult<Self> {
        let center = WebMercator.transform_point(config.initial_center())?;
        Ok(Self::new(
            config.width,
            config.height,
            center,
            config.initial_zoom,
        ))
    }

    pub fn with_overshoot(mut self, ratio: f64) -> Self {
        self.overshoot = ratio.max(0.0);
        self
    }

    /// Pan by a screen offset, as a drag gesture would.
    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) -> Coord {
        let target = Coord::new(
            self.center.x - dx_px * self.resolution,
            self.center.y + dy_px * self.resolution,
        );
        self.set_center(target);
        self.center
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.resolution = resolution_for_zoom(zoom);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn boundary(&self) -> Option<BoundingBox> {
        self.boundary
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn last_fit(&self) -> Option<&(BoundingBox, FitOptions)> {
        self.last_fit.as_ref()
    }

    /// Interaction sessions currently attached.
    pub fn interactions(&self) -> &[(InteractionId, InteractionKind)] {
        &self.interactions
    }
}

impl MapView for SimulatedView {
    fn projection(&self) -> CrsCode {
        CrsCode::Epsg3857
    }

    fn center(&self) -> Option<Coord> {
        Some(self.center)
    }

    fn set_center(&mut self, center: Coord) {
        self.center = match &self.boundary {
            Some(boundary) => boundary.padded(self.overshoot).clamp_point(center),
            None => center,
        };
    }

    fn resolution(&self) -> Option<f64> {
        Some(self.resolution)
    }

    fn fit(&mut self, extent: &BoundingBox, options: &FitOptions) {
        let [top, right, bottom, left] = options.padding_px;
        let available_w = (self.width as f64 - left - right).max(1.0);
        let available_h = (self.height as f64 - top - bottom).max(1.0);

        let resolution = (extent.width() / available_w).max(extent.height() / available_h);
        if resolution.is_finite() && resolution > 0.0 {
            self.resolution = resolution;
        }
        self.last_fit = Some((*extent, *options));
        self.set_center(extent.center());
    }

    fn set_center_boundary(&mut self, boundary: Option<BoundingBox>) {
        self.boundary = boundary;
    }

    fn coordinate_from_pixel(&self, pixel: Pixel) -> Option<Coord> {
        Some(Coord::new(
            self.center.x + (pixel.x - self.width as f64 / 2.0) * self.resolution,
            self.center.y - (pixel.y - self.height as f64 / 2.0) * self.resolution,
        ))
    }

    fn pixel_from_coordinate(&self, coordinate: Coord) -> Option<Pixel> {
        Some(Pixel::new(
            (coordinate.x - self.center.x) / self.resolution + self.width as f64 / 2.0,
            (self.center.y - coordinate.y) / self.resolution + self.height as f64 / 2.0,
        ))
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}

impl InteractionHost for SimulatedView {
    fn add_interaction(&mut self, kind: InteractionKind) -> InteractionId {
        let id = InteractionId(self.next_interaction);
        self.next_interaction += 1;
        self.interactions.push((id, kind));
        id
    }

    fn remove_interaction(&mut self, id: InteractionId) {
        self.interactions.retain(|(existing, _)| *existing != id);
    }
}
