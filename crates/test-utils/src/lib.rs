//! Shared test utilities for the map viewer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate floating-point assertions
//! - Capabilities document fixtures
//! - Temporary configuration files
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures};
//! ```

pub mod fixtures;

use std::io::Write;

pub use fixtures::*;

/// Write `contents` to a temporary `.yaml` file that lives as long as the
/// returned handle.
pub fn temp_config_file(contents: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of coordinate pairs.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_coords_approx_eq;
///
/// assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

/// Macro for approximate equality of two bounding boxes, field by field.
///
/// ```ignore
/// use test_utils::assert_bbox_approx_eq;
///
/// assert_bbox_approx_eq!(a, b, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_bbox_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (l, r) = (&$left, &$right);
        $crate::assert_approx_eq!(l.min_x, r.min_x, $epsilon);
        $crate::assert_approx_eq!(l.min_y, r.min_y, $epsilon);
        $crate::assert_approx_eq!(l.max_x, r.max_x, $epsilon);
        $crate::assert_approx_eq!(l.max_y, r.max_y, $epsilon);
    }};
}
