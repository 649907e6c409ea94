//! Layer identifiers and descriptors for WMS overlays.

use serde::{Deserialize, Serialize};

/// Service-qualified layer identifier, e.g. "webgis:areas".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a compound layer ID like "webgis:areas" into (workspace, name).
    pub fn parse(s: &str) -> (Option<&str>, &str) {
        match s.split_once(':') {
            Some((workspace, name)) => (Some(workspace), name),
            None => (None, s),
        }
    }

    /// Workspace (namespace) part, if the id is qualified.
    pub fn workspace(&self) -> Option<&str> {
        Self::parse(&self.0).0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An overlay layer as the viewer tracks it.
///
/// Order in the registry is significant: index 0 is the base layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Unique service-qualified identifier
    pub id: LayerId,

    /// Label shown in the layer panel
    pub title: String,

    /// Whether the layer is currently drawn
    pub visible: bool,

    /// Opacity in [0, 1]
    pub opacity: f64,

    /// Base layer: first in order and requested non-transparent
    pub is_base: bool,
}

impl LayerDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(id),
            title: title.into(),
            visible: true,
            opacity: 1.0,
            is_base: false,
        }
    }

    /// Opacity as a whole percentage, for panel labels.
    pub fn opacity_percent(&self) -> u32 {
        (self.opacity * 100.0).round() as u32
    }
}
