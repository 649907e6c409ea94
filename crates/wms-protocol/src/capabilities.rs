//! WMS GetCapabilities client side: request URL and layer bounding boxes.
//!
//! Only the parts of the document the viewer needs are read: each `Layer`
//! element's own `Name`, `Title` and geographic bounding box. The bounding box
//! comes in one of two encodings:
//!
//! - WMS 1.3.0 `EX_GeographicBoundingBox` with `westBoundLongitude`,
//!   `eastBoundLongitude`, `southBoundLatitude`, `northBoundLatitude` children
//! - WMS 1.1.1 `LatLonBoundingBox` carrying `minx`, `miny`, `maxx`, `maxy`
//!   attributes

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use wms_common::{BoundingBox, WmsError};

/// Protocol version requested for capabilities documents.
pub const CAPABILITIES_VERSION: &str = "1.3.0";

/// Build the GetCapabilities URL for a WMS endpoint.
pub fn capabilities_url(service_base_url: &str) -> String {
    let separator = if service_base_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}service=WMS&version={}&request=GetCapabilities",
        service_base_url, separator, CAPABILITIES_VERSION
    )
}

/// Raw text of the four `EX_GeographicBoundingBox` children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExGeographicBox {
    pub west: Option<String>,
    pub east: Option<String>,
    pub south: Option<String>,
    pub north: Option<String>,
}

/// Raw attribute values of a `LatLonBoundingBox`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatLonBox {
    pub minx: Option<String>,
    pub miny: Option<String>,
    pub maxx: Option<String>,
    pub maxy: Option<String>,
}

/// The two encodings of a layer's geographic bounding box.
#[derive(Debug, Clone, PartialEq)]
pub enum BboxVariant {
    /// WMS 1.3.0 element form
    ExGeographic(ExGeographicBox),
    /// WMS 1.1.1 attribute form
    LatLon(LatLonBox),
}

impl BboxVariant {
    pub fn label(&self) -> &'static str {
        match self {
            BboxVariant::ExGeographic(_) => "EX_GeographicBoundingBox",
            BboxVariant::LatLon(_) => "LatLonBoundingBox",
        }
    }

    /// Geographic box as `[west, south, east, north]`, or `None` unless all
    /// four values are finite numbers.
    pub fn to_geographic(&self) -> Option<BoundingBox> {
        let (west, south, east, north) = match self {
            BboxVariant::ExGeographic(b) => (&b.west, &b.south, &b.east, &b.north),
            BboxVariant::LatLon(b) => (&b.minx, &b.miny, &b.maxx, &b.maxy),
        };

        Some(BoundingBox::new(
            parse_coordinate(west)?,
            parse_coordinate(south)?,
            parse_coordinate(east)?,
            parse_coordinate(north)?,
        ))
    }
}

fn parse_coordinate(raw: &Option<String>) -> Option<f64> {
    raw.as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// One `Layer` element of a capabilities document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityLayer {
    /// Text of the layer's own `Name` child (trimmed)
    pub name: Option<String>,
    pub title: Option<String>,
    pub ex_geographic: Option<ExGeographicBox>,
    pub lat_lon: Option<LatLonBox>,
    /// Nesting level, 0 for the outermost layer
    pub depth: usize,
}

impl CapabilityLayer {
    /// Bounding-box encodings in extraction priority order.
    pub fn bbox_variants(&self) -> Vec<BboxVariant> {
        let mut variants = Vec::with_capacity(2);
        if let Some(ex) = &self.ex_geographic {
            variants.push(BboxVariant::ExGeographic(ex.clone()));
        }
        if let Some(ll) = &self.lat_lon {
            variants.push(BboxVariant::LatLon(ll.clone()));
        }
        variants
    }

    /// The variant used for this layer: the 1.3.0 form when present,
    /// otherwise the 1.1.1 form.
    pub fn bbox_variant(&self) -> Option<BboxVariant> {
        self.bbox_variants().into_iter().next()
    }

    /// Geographic bounding box from the preferred variant.
    pub fn geographic_bbox(&self) -> Option<BoundingBox> {
        self.bbox_variant()?.to_geographic()
    }
}

/// The layer list of a parsed capabilities document, in document order.
#[derive(Debug, Clone, Default)]
pub struct CapabilitiesDocument {
    /// `version` attribute of the root element
    pub version: Option<String>,
    pub layers: Vec<CapabilityLayer>,
}

impl CapabilitiesDocument {
    /// First layer whose name matches exactly.
    pub fn find_layer(&self, name: &str) -> Option<&CapabilityLayer> {
        self.layers
            .iter()
            .find(|layer| layer.name.as_deref() == Some(name))
    }

    /// Names of all named layers.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|l| l.name.as_deref())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CapabilitiesError {
    #[error("XML parsing error at position {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("document ended with {0} unclosed element(s)")]
    Truncated(usize),

    #[error("document has no root element")]
    NoRootElement,

    #[error("service exception: {0}")]
    ServiceException(String),
}

impl From<CapabilitiesError> for WmsError {
    fn from(err: CapabilitiesError) -> Self {
        WmsError::parse("capabilities document", err)
    }
}

/// Which text field the reader is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    Name,
    Title,
    West,
    East,
    South,
    North,
    Exception,
}

/// Parse the layer tree of a capabilities document.
pub fn parse_capabilities(xml: &str) -> Result<CapabilitiesDocument, CapabilitiesError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut doc = CapabilitiesDocument::default();
    let mut buf = Vec::new();
    // Local names of the currently open elements.
    let mut path: Vec<Vec<u8>> = Vec::new();
    // Indices into doc.layers for the currently open Layer elements.
    let mut layer_stack: Vec<usize> = Vec::new();
    let mut seen_root = false;
    let mut exception: Option<String> = None;
    let mut target: Option<TextTarget> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name().as_ref().to_vec();
                if !seen_root {
                    seen_root = true;
                    doc.version = attribute(&e, b"version");
                    if is_exception_root(&local) {
                        exception = Some(String::new());
                    }
                }

                match local.as_slice() {
                    b"Layer" => {
                        doc.layers.push(CapabilityLayer {
                            depth: layer_stack.len(),
                            ..Default::default()
                        });
                        layer_stack.push(doc.layers.len() - 1);
                    }
                    b"EX_GeographicBoundingBox" if parent_is_layer(&path) => {
                        if let Some(&idx) = layer_stack.last() {
                            doc.layers[idx].ex_geographic = Some(ExGeographicBox::default());
                        }
                    }
                    b"LatLonBoundingBox" if parent_is_layer(&path) => {
                        if let Some(&idx) = layer_stack.last() {
                            doc.layers[idx].lat_lon = Some(lat_lon_box(&e));
                        }
                    }
                    _ => {}
                }

                target = text_target(&path, &local, exception.is_some());
                text.clear();
                path.push(local);
            }
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                if !seen_root {
                    seen_root = true;
                    doc.version = attribute(&e, b"version");
                }
                match local.as_ref() {
                    b"LatLonBoundingBox" if parent_is_layer(&path) => {
                        if let Some(&idx) = layer_stack.last() {
                            doc.layers[idx].lat_lon = Some(lat_lon_box(&e));
                        }
                    }
                    b"Layer" => doc.layers.push(CapabilityLayer {
                        depth: layer_stack.len(),
                        ..Default::default()
                    }),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if target.is_some() => {
                let value = t.unescape().map_err(|e| CapabilitiesError::Xml {
                    position: reader.buffer_position(),
                    message: e.to_string(),
                })?;
                text.push_str(&value);
            }
            Ok(Event::CData(t)) if target.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::End(e)) => {
                if let Some(kind) = target.take() {
                    store_text(&mut doc, &layer_stack, &mut exception, kind, text.trim());
                    text.clear();
                }
                if e.local_name().as_ref() == b"Layer" {
                    layer_stack.pop();
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CapabilitiesError::Xml {
                    position: reader.buffer_position(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(CapabilitiesError::NoRootElement);
    }
    if !path.is_empty() {
        return Err(CapabilitiesError::Truncated(path.len()));
    }
    if let Some(message) = exception {
        return Err(CapabilitiesError::ServiceException(message));
    }

    Ok(doc)
}

fn is_exception_root(local: &[u8]) -> bool {
    matches!(local, b"ServiceExceptionReport" | b"ExceptionReport")
}

fn parent_is_layer(path: &[Vec<u8>]) -> bool {
    path.last().map(|p| p.as_slice() == b"Layer").unwrap_or(false)
}

/// Decide whether the element being opened carries text the parser keeps.
fn text_target(path: &[Vec<u8>], local: &[u8], in_exception: bool) -> Option<TextTarget> {
    if in_exception {
        return matches!(local, b"ServiceException" | b"ExceptionText")
            .then_some(TextTarget::Exception);
    }

    let parent = path.last().map(Vec::as_slice);
    match (parent, local) {
        (Some(b"Layer"), b"Name") => Some(TextTarget::Name),
        (Some(b"Layer"), b"Title") => Some(TextTarget::Title),
        (Some(b"EX_GeographicBoundingBox"), b"westBoundLongitude") => Some(TextTarget::West),
        (Some(b"EX_GeographicBoundingBox"), b"eastBoundLongitude") => Some(TextTarget::East),
        (Some(b"EX_GeographicBoundingBox"), b"southBoundLatitude") => Some(TextTarget::South),
        (Some(b"EX_GeographicBoundingBox"), b"northBoundLatitude") => Some(TextTarget::North),
        _ => None,
    }
}

fn store_text(
    doc: &mut CapabilitiesDocument,
    layer_stack: &[usize],
    exception: &mut Option<String>,
    kind: TextTarget,
    value: &str,
) {
    if kind == TextTarget::Exception {
        if let Some(message) = exception {
            if !message.is_empty() {
                message.push_str("; ");
            }
            message.push_str(value);
        }
        return;
    }

    let Some(&idx) = layer_stack.last() else {
        return;
    };
    let layer = &mut doc.layers[idx];
    let owned = Some(value.to_string());
    match kind {
        TextTarget::Name => layer.name = owned,
        TextTarget::Title => layer.title = owned,
        TextTarget::West | TextTarget::East | TextTarget::South | TextTarget::North => {
            if let Some(ex) = layer.ex_geographic.as_mut() {
                match kind {
                    TextTarget::West => ex.west = owned,
                    TextTarget::East => ex.east = owned,
                    TextTarget::South => ex.south = owned,
                    _ => ex.north = owned,
                }
            }
        }
        TextTarget::Exception => {}
    }
}

fn lat_lon_box(e: &BytesStart<'_>) -> LatLonBox {
    LatLonBox {
        minx: attribute(e, b"minx"),
        miny: attribute(e, b"miny"),
        maxx: attribute(e, b"maxx"),
        maxy: attribute(e, b"maxy"),
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
