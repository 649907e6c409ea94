//! Viewport constraint: frame the data extent and keep the center on it.
//!
//! The target extent is padded, fitted into the view and registered as the
//! view's native center-only limit. Renderers only honour that limit
//! approximately, so every move end also runs [`CenterClamp::correct`],
//! which pulls the center back onto the padded boundary.

use tracing::{debug, info, warn};

use projection::ExtentTransform;
use wms_common::{BoundingBox, Coord, WmsResult};

use crate::view::{FitOptions, MapView};

/// Fraction of each span added on both sides of the target extent.
pub const DEFAULT_PADDING_RATIO: f64 = 0.05;

/// Span assumed for a zero-width axis when padding, in projection units.
pub const MIN_PADDED_SPAN: f64 = 1_000.0;

/// Widen `extent` by `ratio × span` on every side.
///
/// Negative ratios are treated as zero so the result always contains the
/// input. An axis with no span (a single-feature layer) is padded as if it
/// were [`MIN_PADDED_SPAN`] wide, so any positive ratio yields a boundary
/// strictly larger than the input.
pub fn pad(extent: &BoundingBox, ratio: f64) -> BoundingBox {
    let ratio = if ratio.is_finite() { ratio.max(0.0) } else { 0.0 };
    let span = |s: f64| if s > 0.0 { s } else { MIN_PADDED_SPAN };
    let dx = span(extent.width()) * ratio;
    let dy = span(extent.height()) * ratio;
    BoundingBox::new(
        extent.min_x - dx,
        extent.min_y - dy,
        extent.max_x + dx,
        extent.max_y + dy,
    )
}

/// Idempotent post-move correction of the view center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterClamp {
    boundary: BoundingBox,
}

impl CenterClamp {
    pub fn new(boundary: BoundingBox) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> &BoundingBox {
        &self.boundary
    }

    /// The corrected center when `center` lies outside the boundary.
    pub fn correction(&self, center: Coord) -> Option<Coord> {
        if self.boundary.contains_point(center.x, center.y) {
            None
        } else {
            Some(self.boundary.clamp_point(center))
        }
    }

    /// Reapply a clamped center to `view` if needed. Returns the new center
    /// when the view was moved.
    pub fn correct<V: MapView + ?Sized>(&self, view: &mut V) -> Option<Coord> {
        let corrected = self.correction(view.center()?)?;
        view.set_center(corrected);
        debug!(x = corrected.x, y = corrected.y, "Clamped view center");
        Some(corrected)
    }
}

/// Owns the active constraint of a view.
///
/// Applying a new extent replaces the previous constraint entirely.
#[derive(Debug, Clone, Default)]
pub struct ConstraintEnforcer {
    active: Option<CenterClamp>,
}

impl ConstraintEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pad `raw_extent`, fit the view to it, register the padded box as the
    /// native center limit and arm the post-move correction.
    pub fn apply_constraint<V: MapView + ?Sized>(
        &mut self,
        view: &mut V,
        raw_extent: &BoundingBox,
        padding_ratio: f64,
        fit: &FitOptions,
    ) -> BoundingBox {
        let padded = pad(raw_extent, padding_ratio);

        view.fit(&padded, fit);
        view.set_center_boundary(Some(padded));
        let clamp = CenterClamp::new(padded);
        clamp.correct(view);
        self.active = Some(clamp);

        info!(
            min_x = padded.min_x,
            min_y = padded.min_y,
            max_x = padded.max_x,
            max_y = padded.max_y,
            "Applied view constraint"
        );
        padded
    }

    /// Move-end handler.
    pub fn on_move_end<V: MapView + ?Sized>(&self, view: &mut V) -> Option<Coord> {
        self.active.as_ref()?.correct(view)
    }

    pub fn boundary(&self) -> Option<&BoundingBox> {
        self.active.as_ref().map(CenterClamp::boundary)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Remove the constraint from the view and disarm the correction.
    pub fn release<V: MapView + ?Sized>(&mut self, view: &mut V) {
        if self.active.take().is_some() {
            view.set_center_boundary(None);
        }
    }
}

/// Pick the extent to constrain to: the resolved one, else the static
/// fallback reprojected into the view CRS, else nothing.
pub fn select_target_extent(
    resolved: WmsResult<BoundingBox>,
    fallback_lonlat: Option<&BoundingBox>,
    transform: &dyn ExtentTransform,
) -> Option<BoundingBox> {
    match resolved {
        Ok(extent) => Some(extent),
        Err(err) => {
            let fallback = fallback_lonlat?;
            match transform.transform_extent(fallback) {
                Ok(extent) => {
                    info!(error = %err, "Using fallback extent");
                    Some(extent)
                }
                Err(e) => {
                    warn!(error = %e, "Fallback extent could not be projected");
                    None
                }
            }
        }
    }
}
