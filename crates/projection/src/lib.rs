//! Coordinate reference system transformations.
//!
//! Implements the Web Mercator projection from scratch without external
//! dependencies, behind a small trait so callers can plug in a different
//! transform.

pub mod mercator;
pub mod transform;

pub use mercator::{lonlat_to_mercator, mercator_to_lonlat, InverseWebMercator, WebMercator};
pub use transform::{ExtentTransform, FnTransform, Identity, ProjectionError};
