//! Common test fixtures for map viewer tests.
//!
//! This module provides pre-defined capabilities documents and values that
//! represent the scenarios the viewer meets against a real WMS server.

/// Common bounding box definitions for testing, as
/// `(west, south, east, north)` in degrees.
pub mod bbox {
    /// Orthophoto coverage used by the sample deployment
    pub const ORTHOPHOTO: (f64, f64, f64, f64) = (-48.65, -25.8, -48.25, -25.3);

    /// Vector layers, overlapping the orthophoto toward the east
    pub const AREAS: (f64, f64, f64, f64) = (-48.5, -25.7, -48.1, -25.2);

    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);
}

/// Common layer identifiers for testing.
pub mod layers {
    pub const ORTHOPHOTO: &str = "webgis:Imagem24bits";
    pub const AREAS: &str = "webgis:areas_tudojunto";
    pub const LINES: &str = "webgis:linhas_tudojunto";
    pub const POINTS: &str = "webgis:pontos_tudojunto";
    /// Not advertised by any fixture document
    pub const MISSING: &str = "webgis:does_not_exist";
}

/// Capabilities documents.
pub mod capabilities {
    use super::bbox;

    /// A single layer described with the WMS 1.3.0 element form.
    pub fn ex_geographic_layer(name: &str, b: (f64, f64, f64, f64)) -> String {
        format!(
            r#"<Layer queryable="1">
      <Name>{name}</Name>
      <Title>{name}</Title>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>{w}</westBoundLongitude>
        <eastBoundLongitude>{e}</eastBoundLongitude>
        <southBoundLatitude>{s}</southBoundLatitude>
        <northBoundLatitude>{n}</northBoundLatitude>
      </EX_GeographicBoundingBox>
    </Layer>"#,
            name = name,
            w = b.0,
            s = b.1,
            e = b.2,
            n = b.3
        )
    }

    /// A single layer described with the WMS 1.1.1 attribute form.
    pub fn lat_lon_layer(name: &str, b: (f64, f64, f64, f64)) -> String {
        format!(
            r#"<Layer queryable="1">
      <Name>{name}</Name>
      <Title>{name}</Title>
      <LatLonBoundingBox minx="{w}" miny="{s}" maxx="{e}" maxy="{n}"/>
    </Layer>"#,
            name = name,
            w = b.0,
            s = b.1,
            e = b.2,
            n = b.3
        )
    }

    /// Wrap layer fragments in a WMS 1.3.0 document with a nameless root
    /// layer, the way GeoServer publishes a workspace.
    pub fn document(layers: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>WMS</Name>
    <Title>GeoServer Web Map Service</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>GeoServer Web Map Service</Title>
      <CRS>EPSG:4326</CRS>
      <CRS>EPSG:3857</CRS>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>-180.0</westBoundLongitude>
        <eastBoundLongitude>180.0</eastBoundLongitude>
        <southBoundLatitude>-90.0</southBoundLatitude>
        <northBoundLatitude>90.0</northBoundLatitude>
      </EX_GeographicBoundingBox>
    {}
    </Layer>
  </Capability>
</WMS_Capabilities>"#,
            layers.join("\n    ")
        )
    }

    /// The sample deployment: orthophoto in the 1.3.0 form, areas in the
    /// 1.1.1 form, lines with an unusable box, points absent.
    pub fn sample_deployment() -> String {
        document(&[
            ex_geographic_layer(super::layers::ORTHOPHOTO, bbox::ORTHOPHOTO),
            lat_lon_layer(super::layers::AREAS, bbox::AREAS),
            r#"<Layer>
      <Name>webgis:linhas_tudojunto</Name>
      <LatLonBoundingBox minx="" miny="-25.5" maxx="-48.3" maxy="-25.4"/>
    </Layer>"#
                .to_string(),
        ])
    }

    /// A body that is not well-formed XML.
    pub const MALFORMED: &str = "<WMS_Capabilities><Capability><Layer></Capability>";
}

/// Viewer configuration documents.
pub mod config {
    /// Minimal valid YAML configuration with two layers.
    pub const MINIMAL_YAML: &str = r#"
service:
  base_url: "http://geo.example.com/geoserver"
  workspace: "webgis"
layers:
  - name: "webgis:Imagem24bits"
    title: "Ortofoto"
    transparent: false
  - name: "webgis:areas_tudojunto"
    title: "Areas"
    opacity: 0.9
"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_boxes_are_ordered() {
        for b in [bbox::ORTHOPHOTO, bbox::AREAS, bbox::GLOBAL] {
            assert!(b.0 <= b.2);
            assert!(b.1 <= b.3);
        }
    }

    #[test]
    fn test_document_embeds_layers() {
        let doc = capabilities::sample_deployment();
        assert!(doc.contains(layers::ORTHOPHOTO));
        assert!(doc.contains(layers::AREAS));
        assert!(!doc.contains(layers::POINTS));
    }
}
