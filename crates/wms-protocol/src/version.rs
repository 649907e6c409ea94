//! WMS protocol versions and the parameter names that differ between them.

use serde::{Deserialize, Serialize};
use std::fmt;

use wms_common::{AxisOrder, CrsCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WmsVersion {
    /// Always x,y axis order; preferred for tile sources.
    #[serde(rename = "1.1.1")]
    #[default]
    V1_1_1,
    #[serde(rename = "1.3.0")]
    V1_3_0,
}

impl WmsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            WmsVersion::V1_1_1 => "1.1.1",
            WmsVersion::V1_3_0 => "1.3.0",
        }
    }

    /// Name of the CRS request parameter.
    pub fn crs_param(&self) -> &'static str {
        match self {
            WmsVersion::V1_1_1 => "SRS",
            WmsVersion::V1_3_0 => "CRS",
        }
    }

    /// Names of the GetFeatureInfo pixel parameters (column, row).
    pub fn pixel_params(&self) -> (&'static str, &'static str) {
        match self {
            WmsVersion::V1_1_1 => ("X", "Y"),
            WmsVersion::V1_3_0 => ("I", "J"),
        }
    }

    pub fn axis_order(&self, crs: CrsCode) -> AxisOrder {
        match self {
            WmsVersion::V1_1_1 => crs.axis_order_wms_1_1(),
            WmsVersion::V1_3_0 => crs.axis_order_wms_1_3(),
        }
    }
}

impl fmt::Display for WmsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_specific_names() {
        assert_eq!(WmsVersion::V1_1_1.crs_param(), "SRS");
        assert_eq!(WmsVersion::V1_3_0.crs_param(), "CRS");
        assert_eq!(WmsVersion::V1_1_1.pixel_params(), ("X", "Y"));
        assert_eq!(WmsVersion::V1_3_0.pixel_params(), ("I", "J"));
    }

    #[test]
    fn test_axis_order_only_flips_for_geographic_1_3() {
        assert_eq!(
            WmsVersion::V1_3_0.axis_order(CrsCode::Epsg4326),
            AxisOrder::LatLon
        );
        assert_eq!(WmsVersion::V1_3_0.axis_order(CrsCode::Epsg3857), AxisOrder::XY);
        assert_eq!(WmsVersion::V1_1_1.axis_order(CrsCode::Epsg4326), AxisOrder::XY);
    }
}
