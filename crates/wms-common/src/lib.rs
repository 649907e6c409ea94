//! Common types shared across the map viewer crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod layer;

pub use bbox::{BoundingBox, Coord};
pub use crs::{AxisOrder, CrsCode};
pub use error::{WmsError, WmsResult};
pub use layer::{LayerDescriptor, LayerId};
