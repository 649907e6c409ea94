//! Spherical Web Mercator projection (EPSG:3857).
//!
//! Forward and inverse transforms between WGS84 longitude/latitude in degrees
//! and Web Mercator meters. Latitudes beyond the projection's ±85.0511° limit
//! map onto the square world edge instead of diverging to infinity.

use std::f64::consts::PI;

use wms_common::crs::WEB_MERCATOR_HALF_EXTENT;
use wms_common::{Coord, CrsCode};

use crate::transform::{ExtentTransform, ProjectionError};

/// Sphere radius used by Web Mercator (WGS84 semi-major axis), meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the projected y equals the world half-extent.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Project longitude/latitude degrees to Web Mercator meters.
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI * (lat + 90.0) / 360.0).tan().ln();
    // Poles diverge (ln(0) = -inf at the south pole); keep the square world.
    (x, y.clamp(-WEB_MERCATOR_HALF_EXTENT, WEB_MERCATOR_HALF_EXTENT))
}

/// Inverse of [`lonlat_to_mercator`].
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Geographic (EPSG:4326, lon/lat order) to Web Mercator.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl ExtentTransform for WebMercator {
    fn source_crs(&self) -> CrsCode {
        CrsCode::Epsg4326
    }

    fn target_crs(&self) -> CrsCode {
        CrsCode::Epsg3857
    }

    fn transform_point(&self, point: Coord) -> Result<Coord, ProjectionError> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(ProjectionError::NonFinite {
                x: point.x,
                y: point.y,
            });
        }
        if !(-90.0..=90.0).contains(&point.y) {
            return Err(ProjectionError::OutOfRange {
                x: point.x,
                y: point.y,
            });
        }
        Ok(lonlat_to_mercator(point.x, point.y).into())
    }
}

/// Web Mercator back to geographic, used for reporting clicks and extents.
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseWebMercator;

impl ExtentTransform for InverseWebMercator {
    fn source_crs(&self) -> CrsCode {
        CrsCode::Epsg3857
    }

    fn target_crs(&self) -> CrsCode {
        CrsCode::Epsg4326
    }

    fn transform_point(&self, point: Coord) -> Result<Coord, ProjectionError> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(ProjectionError::NonFinite {
                x: point.x,
                y: point.y,
            });
        }
        Ok(mercator_to_lonlat(point.x, point.y).into())
    }
}
