//! OGC WMS protocol, client side.
//!
//! Supports:
//! - GetCapabilities request URLs and layer bounding-box extraction for
//!   WMS 1.1.1 and WMS 1.3.0 documents
//! - Tiled GetMap source parameters
//! - GetFeatureInfo request construction and response rendering

pub mod capabilities;
pub mod getfeatureinfo;
pub mod getmap;
pub mod version;

pub use capabilities::{
    capabilities_url, parse_capabilities, BboxVariant, CapabilitiesDocument, CapabilitiesError,
    CapabilityLayer,
};
pub use getfeatureinfo::{
    render_popup_html, FeatureInfoResponse, GetFeatureInfoRequest, InfoFormat,
};
pub use getmap::GetMapParams;
pub use version::WmsVersion;
