//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BoundingBox;

/// Half the circumference of the Web Mercator sphere, in meters.
pub const WEB_MERCATOR_HALF_EXTENT: f64 = 20037508.342789244;

/// CRS codes the viewer can work in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Get the axis order for this CRS in WMS 1.3.0.
    ///
    /// WMS 1.3.0 uses the "natural" axis order of the CRS:
    /// - Geographic CRS: lat, lon (y, x)
    /// - Projected CRS: easting, northing (x, y)
    pub fn axis_order_wms_1_3(&self) -> AxisOrder {
        match self {
            CrsCode::Epsg4326 => AxisOrder::LatLon,
            CrsCode::Epsg3857 => AxisOrder::XY,
        }
    }

    /// Get the axis order for WMS 1.1.1 (always x, y regardless of CRS).
    pub fn axis_order_wms_1_1(&self) -> AxisOrder {
        AxisOrder::XY
    }

    /// Get the valid bounds for this CRS.
    pub fn valid_bounds(&self) -> BoundingBox {
        match self {
            CrsCode::Epsg4326 => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            // Web Mercator bounds (approx ±85.06° latitude)
            CrsCode::Epsg3857 => BoundingBox::new(
                -WEB_MERCATOR_HALF_EXTENT,
                -WEB_MERCATOR_HALF_EXTENT,
                WEB_MERCATOR_HALF_EXTENT,
                WEB_MERCATOR_HALF_EXTENT,
            ),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}
