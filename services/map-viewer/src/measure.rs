//! Interactive distance and area measurement.
//!
//! A small state machine decides which draw session is attached to the map.
//! Finished drawings stay on a scratch layer until cleared; each one is
//! measured in the planar working projection and reported through a
//! [`Notifier`].

use tracing::{debug, info};

use wms_common::Coord;

/// Measurement tool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeasureMode {
    #[default]
    Idle,
    DrawingLine,
    DrawingPolygon,
}

impl MeasureMode {
    fn draw_kind(&self) -> Option<GeometryKind> {
        match self {
            MeasureMode::Idle => None,
            MeasureMode::DrawingLine => Some(GeometryKind::LineString),
            MeasureMode::DrawingPolygon => Some(GeometryKind::Polygon),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    LineString,
    Polygon,
}

/// Kind of interaction session attached to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Draw a new geometry of the given kind onto the scratch layer
    Draw(GeometryKind),
    /// Edit vertices of geometries on the scratch layer
    Modify,
}

/// Handle of an attached interaction session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InteractionId(pub u64);

/// The part of the rendering engine that hosts interaction sessions.
pub trait InteractionHost {
    fn add_interaction(&mut self, kind: InteractionKind) -> InteractionId;

    fn remove_interaction(&mut self, id: InteractionId);
}

/// Receives measurement results for the user.
pub trait Notifier {
    /// Show `message` and wait for the user to acknowledge it.
    fn acknowledge(&mut self, message: &str);
}

/// Notifier that writes results to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn acknowledge(&mut self, message: &str) {
        info!(message, "Measurement");
    }
}

/// A finished drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    LineString(Vec<Coord>),
    /// Outer ring, without the closing vertex
    Polygon(Vec<Coord>),
}

impl Geometry {
    /// A line needs at least two vertices.
    pub fn line(vertices: Vec<Coord>) -> Option<Self> {
        (vertices.len() >= 2).then_some(Geometry::LineString(vertices))
    }

    /// A polygon needs at least three vertices. A closing vertex equal to
    /// the first one is dropped.
    pub fn polygon(mut vertices: Vec<Coord>) -> Option<Self> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        (vertices.len() >= 3).then_some(Geometry::Polygon(vertices))
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn vertices(&self) -> &[Coord] {
        match self {
            Geometry::LineString(v) | Geometry::Polygon(v) => v,
        }
    }

    /// Length or area of the geometry, rounded to whole meters.
    pub fn measure(&self) -> MeasurementReport {
        match self {
            Geometry::LineString(v) => MeasurementReport::Length {
                meters: round_meters(line_length(v)),
            },
            Geometry::Polygon(v) => MeasurementReport::Area {
                square_meters: round_meters(polygon_area(v)),
            },
        }
    }
}

/// Sum of Euclidean segment lengths.
pub fn line_length(vertices: &[Coord]) -> f64 {
    vertices.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Planar area of a ring (shoelace formula), orientation independent.
pub fn polygon_area(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = &ring[(i + 1) % ring.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area.abs() / 2.0
}

fn round_meters(value: f64) -> u64 {
    if value.is_finite() {
        value.round().max(0.0) as u64
    } else {
        0
    }
}

/// Result of measuring one drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementReport {
    Length { meters: u64 },
    Area { square_meters: u64 },
}

impl MeasurementReport {
    /// Message shown to the user, e.g. `Length: 1,234 m (approx.)`.
    pub fn message(&self) -> String {
        match self {
            MeasurementReport::Length { meters } => {
                format!("Length: {} m (approx.)", group_thousands(*meters))
            }
            MeasurementReport::Area { square_meters } => {
                format!("Area: {} m² (approx.)", group_thousands(*square_meters))
            }
        }
    }
}

/// Format with comma thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Measurement tool: mode, attached sessions and the scratch layer.
#[derive(Debug, Default)]
pub struct Measurement {
    mode: MeasureMode,
    sessions: Vec<InteractionId>,
    scratch: Vec<Geometry>,
}

impl Measurement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> MeasureMode {
        self.mode
    }

    /// Geometries drawn so far.
    pub fn geometries(&self) -> &[Geometry] {
        &self.scratch
    }

    /// Switch tool state. Sessions of the previous drawing state are detached;
    /// the scratch layer is left alone. Setting the current mode is a no-op.
    pub fn set_mode(&mut self, host: &mut dyn InteractionHost, mode: MeasureMode) {
        if mode == self.mode {
            return;
        }
        self.detach_sessions(host);

        if let Some(kind) = mode.draw_kind() {
            self.sessions
                .push(host.add_interaction(InteractionKind::Draw(kind)));
            self.sessions.push(host.add_interaction(InteractionKind::Modify));
        }
        debug!(from = ?self.mode, to = ?mode, "Measure mode changed");
        self.mode = mode;
    }

    /// Handle a finished drawing. Drawings that do not match the current
    /// mode are ignored.
    pub fn finish_drawing(
        &mut self,
        geometry: Geometry,
        notifier: &mut dyn Notifier,
    ) -> Option<MeasurementReport> {
        if self.mode.draw_kind() != Some(geometry.kind()) {
            return None;
        }
        let report = geometry.measure();
        self.scratch.push(geometry);
        notifier.acknowledge(&report.message());
        Some(report)
    }

    /// Empty the scratch layer.
    pub fn clear(&mut self) {
        self.scratch.clear();
    }

    /// Detach all sessions and return to idle.
    pub fn detach(&mut self, host: &mut dyn InteractionHost) {
        self.detach_sessions(host);
        self.mode = MeasureMode::Idle;
    }

    fn detach_sessions(&mut self, host: &mut dyn InteractionHost) {
        for id in self.sessions.drain(..) {
            host.remove_interaction(id);
        }
    }
}
