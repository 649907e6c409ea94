//! Ordered overlay layers and the panel that controls them.
//!
//! The registry keeps the descriptor state the panel shows and forwards every
//! change to the rendering engine's layer handle.

use serde::Serialize;
use tracing::debug;

use wms_common::{LayerDescriptor, LayerId};
use wms_protocol::GetMapParams;

/// Step of the panel's opacity slider.
pub const OPACITY_STEP: f64 = 0.05;

/// A layer handle owned by the rendering engine.
pub trait RenderLayer {
    fn set_visible(&mut self, visible: bool);

    fn set_opacity(&mut self, opacity: f64);
}

/// Handle for headless use; it keeps the last values it was given.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadlessLayer {
    pub visible: bool,
    pub opacity: f64,
}

impl RenderLayer for HeadlessLayer {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }
}

struct RegisteredLayer {
    descriptor: LayerDescriptor,
    source: GetMapParams,
    handle: Box<dyn RenderLayer>,
}

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelEntry {
    pub id: String,
    pub title: String,
    pub visible: bool,
    pub opacity: f64,
    pub opacity_percent: u32,
    pub is_base: bool,
}

/// Layers in draw order; index 0 is the base layer.
#[derive(Default)]
pub struct LayerRegistry {
    layers: Vec<RegisteredLayer>,
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|l| &l.descriptor))
            .finish()
    }
}

impl LayerRegistry {
    /// Build the registry, asking `factory` for a render handle per layer.
    /// The handle starts with the descriptor's visibility and opacity.
    pub fn new<F>(descriptors: Vec<LayerDescriptor>, mut factory: F) -> Self
    where
        F: FnMut(&LayerDescriptor, &GetMapParams) -> Box<dyn RenderLayer>,
    {
        let layers = descriptors
            .into_iter()
            .map(|descriptor| {
                let source = GetMapParams::for_layer(&descriptor);
                let mut handle = factory(&descriptor, &source);
                handle.set_visible(descriptor.visible);
                handle.set_opacity(descriptor.opacity);
                RegisteredLayer {
                    descriptor,
                    source,
                    handle,
                }
            })
            .collect();
        Self { layers }
    }

    /// Registry with [`HeadlessLayer`] handles.
    pub fn headless(descriptors: Vec<LayerDescriptor>) -> Self {
        Self::new(descriptors, |_, _| {
            Box::new(HeadlessLayer::default()) as Box<dyn RenderLayer>
        })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.find(id.as_str()).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&LayerDescriptor> {
        self.find(id).map(|l| &l.descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().map(|l| &l.descriptor)
    }

    /// Layer ids in registry order.
    pub fn layer_names(&self) -> Vec<String> {
        self.descriptors().map(|d| d.id.to_string()).collect()
    }

    /// Flip visibility. Returns the new flag, or `None` for an unknown id.
    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        let layer = self.find_mut(id)?;
        layer.descriptor.visible = !layer.descriptor.visible;
        layer.handle.set_visible(layer.descriptor.visible);
        debug!(layer = id, visible = layer.descriptor.visible, "Toggled layer");
        Some(layer.descriptor.visible)
    }

    /// Set opacity clamped to [0, 1]. Non-finite values and values equal to
    /// the current one leave the layer untouched. Returns the opacity in
    /// effect, or `None` for an unknown id.
    pub fn set_opacity(&mut self, id: &str, value: f64) -> Option<f64> {
        let layer = self.find_mut(id)?;
        if !value.is_finite() {
            return Some(layer.descriptor.opacity);
        }
        let clamped = value.clamp(0.0, 1.0);
        if clamped != layer.descriptor.opacity {
            layer.descriptor.opacity = clamped;
            layer.handle.set_opacity(clamped);
            debug!(layer = id, opacity = clamped, "Changed layer opacity");
        }
        Some(clamped)
    }

    /// Panel slider input: snap `position` to [`OPACITY_STEP`], then apply it
    /// like [`set_opacity`](Self::set_opacity).
    pub fn slide_opacity(&mut self, id: &str, position: f64) -> Option<f64> {
        self.set_opacity(id, snap_opacity(position))
    }

    /// The first visible layer in registry order with its tile source.
    pub fn first_visible(&self) -> Option<(&LayerDescriptor, &GetMapParams)> {
        self.layers
            .iter()
            .find(|l| l.descriptor.visible)
            .map(|l| (&l.descriptor, &l.source))
    }

    /// Tile source parameters of a layer.
    pub fn source(&self, id: &str) -> Option<&GetMapParams> {
        self.find(id).map(|l| &l.source)
    }

    pub fn panel(&self) -> Vec<PanelEntry> {
        self.descriptors()
            .map(|d| PanelEntry {
                id: d.id.to_string(),
                title: d.title.clone(),
                visible: d.visible,
                opacity: d.opacity,
                opacity_percent: d.opacity_percent(),
                is_base: d.is_base,
            })
            .collect()
    }

    /// Drop all render handles.
    pub fn clear(&mut self) {
        self.layers.clear();
    }

    fn find(&self, id: &str) -> Option<&RegisteredLayer> {
        self.layers.iter().find(|l| l.descriptor.id.as_str() == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut RegisteredLayer> {
        self.layers
            .iter_mut()
            .find(|l| l.descriptor.id.as_str() == id)
    }
}

/// Snap a slider position to the panel's opacity step.
pub fn snap_opacity(value: f64) -> f64 {
    ((value / OPACITY_STEP).round() * OPACITY_STEP).clamp(0.0, 1.0)
}
