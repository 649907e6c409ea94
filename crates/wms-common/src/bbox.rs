//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A point in map coordinates.
///
/// For geographic CRS (EPSG:4326) `x` is longitude and `y` latitude, in degrees.
/// For projected CRS (EPSG:3857) both are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in coordinate units.
    pub fn distance_to(&self, other: &Coord) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857, etc.), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a box from a `[min_x, min_y, max_x, max_y]` array, rejecting
    /// non-finite values and inverted axes.
    pub fn try_from_array(values: [f64; 4]) -> Result<Self, BboxParseError> {
        let bbox = Self::new(values[0], values[1], values[2], values[3]);
        if !bbox.is_finite() {
            return Err(BboxParseError::NonFinite(bbox.to_wms_string()));
        }
        if !bbox.is_valid() {
            return Err(BboxParseError::Inverted(bbox.to_wms_string()));
        }
        Ok(bbox)
    }

    /// Format as a WMS BBOX parameter value in x,y axis order.
    pub fn to_wms_string(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Format as a WMS BBOX parameter value with the axes swapped
    /// (WMS 1.3.0 with a lat/lon CRS).
    pub fn to_wms_string_yx(&self) -> String {
        format!("{},{},{},{}", self.min_y, self.min_x, self.max_y, self.max_x)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// All four values are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Min corner is not past the max corner on either axis.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Smallest box containing both `self` and `other`.
    pub fn extend(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Union of a sequence of boxes, `None` when the sequence is empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| match acc {
                Some(u) => Some(u.extend(b)),
                None => Some(*b),
            })
    }

    /// Widen each axis by `ratio × span` on both sides.
    ///
    /// A zero ratio returns the box unchanged; the center never moves.
    pub fn padded(&self, ratio: f64) -> BoundingBox {
        let dx = self.width() * ratio;
        let dy = self.height() * ratio;
        BoundingBox {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// `other` lies entirely inside this box (edges included).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Nearest point inside the box.
    pub fn clamp_point(&self, point: Coord) -> Coord {
        Coord::new(
            point.x.max(self.min_x).min(self.max_x),
            point.y.max(self.min_y).min(self.max_y),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("BBOX contains non-finite values: {0}")]
    NonFinite(String),

    #[error("BBOX minimum exceeds maximum: {0}")]
    Inverted(String),
}
