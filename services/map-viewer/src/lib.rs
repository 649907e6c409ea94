//! Core of a WMS overlay map viewer.
//!
//! The rendering engine is an external collaborator behind the
//! [`MapView`](view::MapView), [`RenderLayer`](layers::RenderLayer) and
//! [`InteractionHost`](measure::InteractionHost) traits. This crate owns:
//!
//! - extent resolution from the service capabilities ([`extent`])
//! - the padded viewport constraint ([`constraint`])
//! - the layer registry behind the layer panel ([`layers`])
//! - distance and area measurement ([`measure`])
//! - feature-info queries and the popup ([`feature_query`], [`popup`])

pub mod config;
pub mod constraint;
pub mod context;
pub mod extent;
pub mod feature_query;
pub mod http;
pub mod layers;
pub mod measure;
pub mod popup;
pub mod view;

pub use config::ViewerConfig;
pub use constraint::{pad, select_target_extent, CenterClamp, ConstraintEnforcer};
pub use context::{EventOutcome, MapEvent, ViewerContext};
pub use extent::{ExtentReport, ExtentResolver, SkipReason};
pub use feature_query::{FeatureQuery, FeatureQueryClient, MapClick, StaleResponsePolicy};
pub use http::{HttpFetcher, ReqwestFetcher};
pub use layers::{LayerRegistry, PanelEntry, RenderLayer};
pub use measure::{Geometry, MeasureMode, Measurement, MeasurementReport, Notifier};
pub use popup::{Key, PopupState};
pub use view::{FitOptions, MapView, Pixel, SimulatedView};
