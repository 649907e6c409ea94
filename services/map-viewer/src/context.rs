//! Owned viewer state and event dispatch.

use tracing::{debug, info};

use wms_common::{BoundingBox, Coord};

use crate::constraint::ConstraintEnforcer;
use crate::layers::LayerRegistry;
use crate::measure::{
    Geometry, InteractionHost, LogNotifier, MeasureMode, Measurement, MeasurementReport, Notifier,
};
use crate::popup::{Key, PopupState};
use crate::view::{FitOptions, MapView};

/// Map events the core reacts to synchronously.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The view finished a pan, zoom or animation
    MoveEnd,
    KeyDown(Key),
    /// The draw session finished a geometry
    DrawEnd(Geometry),
}

/// What handling an event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Unchanged,
    Recentered(Coord),
    PopupClosed,
    Measured(MeasurementReport),
}

/// View, layers, constraint, measurement tool and popup of one map.
pub struct ViewerContext<V> {
    view: V,
    layers: LayerRegistry,
    constraint: ConstraintEnforcer,
    measurement: Measurement,
    popup: PopupState,
    notifier: Box<dyn Notifier>,
    query_generation: u64,
}

impl<V> ViewerContext<V> {
    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerRegistry {
        &mut self.layers
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn popup_mut(&mut self) -> &mut PopupState {
        &mut self.popup
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn constraint(&self) -> &ConstraintEnforcer {
        &self.constraint
    }

    /// Start a new feature query and return its sequence number.
    pub fn begin_query(&mut self) -> u64 {
        self.query_generation += 1;
        self.query_generation
    }

    /// Sequence number of the most recently started feature query.
    pub fn latest_query(&self) -> u64 {
        self.query_generation
    }

    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        self.layers.toggle_visibility(id)
    }

    pub fn set_opacity(&mut self, id: &str, value: f64) -> Option<f64> {
        self.layers.set_opacity(id, value)
    }

    pub fn slide_opacity(&mut self, id: &str, position: f64) -> Option<f64> {
        self.layers.slide_opacity(id, position)
    }
}

impl<V: MapView + InteractionHost> ViewerContext<V> {
    pub fn new(view: V, layers: LayerRegistry) -> Self {
        Self::with_notifier(view, layers, Box::new(LogNotifier))
    }

    pub fn with_notifier(view: V, layers: LayerRegistry, notifier: Box<dyn Notifier>) -> Self {
        info!(layers = layers.len(), "Viewer context created");
        Self {
            view,
            layers,
            constraint: ConstraintEnforcer::new(),
            measurement: Measurement::new(),
            popup: PopupState::default(),
            notifier,
            query_generation: 0,
        }
    }

    /// Pad, fit and constrain the view to `raw_extent`. Replaces any
    /// previous constraint.
    pub fn apply_constraint(
        &mut self,
        raw_extent: &BoundingBox,
        padding_ratio: f64,
        fit: &FitOptions,
    ) -> BoundingBox {
        self.constraint
            .apply_constraint(&mut self.view, raw_extent, padding_ratio, fit)
    }

    /// Constrain to `target` if there is one; otherwise the view keeps its
    /// initial center and zoom.
    pub fn constrain_to(
        &mut self,
        target: Option<BoundingBox>,
        padding_ratio: f64,
        fit: &FitOptions,
    ) -> Option<BoundingBox> {
        match target {
            Some(extent) => Some(self.apply_constraint(&extent, padding_ratio, fit)),
            None => {
                info!("No extent available, view left unconstrained");
                None
            }
        }
    }

    pub fn set_measure_mode(&mut self, mode: MeasureMode) {
        self.measurement.set_mode(&mut self.view, mode);
    }

    pub fn clear_measurements(&mut self) {
        self.measurement.clear();
    }

    pub fn dispatch(&mut self, event: MapEvent) -> EventOutcome {
        match event {
            MapEvent::MoveEnd => match self.constraint.on_move_end(&mut self.view) {
                Some(center) => EventOutcome::Recentered(center),
                None => EventOutcome::Unchanged,
            },
            MapEvent::KeyDown(key) => {
                if self.popup.handle_key(&key) {
                    EventOutcome::PopupClosed
                } else {
                    EventOutcome::Unchanged
                }
            }
            MapEvent::DrawEnd(geometry) => {
                match self
                    .measurement
                    .finish_drawing(geometry, self.notifier.as_mut())
                {
                    Some(report) => EventOutcome::Measured(report),
                    None => {
                        debug!("Drawing ignored outside its measure mode");
                        EventOutcome::Unchanged
                    }
                }
            }
        }
    }

    /// Release everything attached to the view and hand the view back.
    pub fn teardown(mut self) -> V {
        self.measurement.detach(&mut self.view);
        self.constraint.release(&mut self.view);
        self.popup.close();
        self.layers.clear();
        self.view.detach();
        info!("Viewer context torn down");
        self.view
    }
}
