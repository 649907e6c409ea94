//! Common test utilities for map-viewer tests
//!
//! Provides an in-memory [`HttpFetcher`] so resolver and feature-query tests
//! run without a WMS server.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use map_viewer::layers::LayerRegistry;
use map_viewer::{HttpFetcher, SimulatedView, ViewerContext};
use wms_common::{Coord, LayerDescriptor, WmsError, WmsResult};

/// Canned reply of the stub.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
    NetworkError,
}

/// Serves canned replies by URL substring, first match wins, and records
/// every requested URL.
#[derive(Default)]
pub struct StubFetcher {
    routes: Vec<(String, Reply)>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url_contains: &str, reply: Reply) -> Self {
        self.routes.push((url_contains.to_string(), reply));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for StubFetcher {
    async fn get_text(&self, url: &str) -> WmsResult<String> {
        self.requests.lock().unwrap().push(url.to_string());

        let reply = self
            .routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Status(404));

        match reply {
            Reply::Body(body) => Ok(body),
            Reply::Status(status) => Err(WmsError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Reply::NetworkError => Err(WmsError::transport(url, "connection refused")),
        }
    }
}

pub const WMS_URL: &str = "http://geo.example.com/geoserver/wms";

/// Headless context with the sample deployment's layer order.
pub fn sample_context() -> ViewerContext<SimulatedView> {
    let mut base = LayerDescriptor::new("webgis:Imagem24bits", "Ortofoto");
    base.is_base = true;
    let mut areas = LayerDescriptor::new("webgis:areas_tudojunto", "Areas");
    areas.opacity = 0.9;
    let layers = LayerRegistry::headless(vec![
        base,
        areas,
        LayerDescriptor::new("webgis:linhas_tudojunto", "Eixos"),
        LayerDescriptor::new("webgis:pontos_tudojunto", "Pontos"),
    ]);
    let view = SimulatedView::new(1024, 768, Coord::new(-5_380_000.0, -2_960_000.0), 12.0);
    ViewerContext::new(view, layers)
}
