//! Pluggable point and extent transforms between coordinate systems.

use wms_common::{BoundingBox, Coord, CrsCode, WmsError};

/// Errors raised while reprojecting coordinates.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("cannot project non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("coordinate ({x}, {y}) is outside the source CRS domain")]
    OutOfRange { x: f64, y: f64 },
}

impl From<ProjectionError> for WmsError {
    fn from(err: ProjectionError) -> Self {
        WmsError::ProjectionError(err.to_string())
    }
}

/// A transform from one CRS into another.
///
/// The map-rendering engine normally owns projection math; the viewer only
/// needs this seam to turn geographic boxes into the working projection.
pub trait ExtentTransform {
    fn source_crs(&self) -> CrsCode;

    fn target_crs(&self) -> CrsCode;

    fn transform_point(&self, point: Coord) -> Result<Coord, ProjectionError>;

    /// Transform a box by its four corners and take the envelope.
    fn transform_extent(&self, bbox: &BoundingBox) -> Result<BoundingBox, ProjectionError> {
        let corners = [
            Coord::new(bbox.min_x, bbox.min_y),
            Coord::new(bbox.max_x, bbox.min_y),
            Coord::new(bbox.max_x, bbox.max_y),
            Coord::new(bbox.min_x, bbox.max_y),
        ];

        let mut out = BoundingBox::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for corner in corners {
            let p = self.transform_point(corner)?;
            out.min_x = out.min_x.min(p.x);
            out.min_y = out.min_y.min(p.y);
            out.max_x = out.max_x.max(p.x);
            out.max_y = out.max_y.max(p.y);
        }
        Ok(out)
    }
}

/// Adapts a plain point function into an [`ExtentTransform`].
pub struct FnTransform<F> {
    source: CrsCode,
    target: CrsCode,
    func: F,
}

impl<F> FnTransform<F>
where
    F: Fn(Coord) -> Result<Coord, ProjectionError>,
{
    pub fn new(source: CrsCode, target: CrsCode, func: F) -> Self {
        Self {
            source,
            target,
            func,
        }
    }
}

impl<F> ExtentTransform for FnTransform<F>
where
    F: Fn(Coord) -> Result<Coord, ProjectionError>,
{
    fn source_crs(&self) -> CrsCode {
        self.source
    }

    fn target_crs(&self) -> CrsCode {
        self.target
    }

    fn transform_point(&self, point: Coord) -> Result<Coord, ProjectionError> {
        (self.func)(point)
    }
}

/// No-op transform for when source and target already agree.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub CrsCode);

impl ExtentTransform for Identity {
    fn source_crs(&self) -> CrsCode {
        self.0
    }

    fn target_crs(&self) -> CrsCode {
        self.0
    }

    fn transform_point(&self, point: Coord) -> Result<Coord, ProjectionError> {
        Ok(point)
    }
}
