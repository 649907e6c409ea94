//! HTTP access to the WMS endpoint.
//!
//! Everything the viewer fetches is a text document (capabilities XML,
//! feature-info HTML or JSON), so the seam is a single `get_text` call that
//! tests replace with an in-memory stub.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use wms_common::{WmsError, WmsResult};

/// Default request timeout for WMS calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches text documents over HTTP.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` and return the body. Network failures map to
    /// [`WmsError::Transport`], non-2xx statuses to [`WmsError::HttpStatus`].
    async fn get_text(&self, url: &str) -> WmsResult<String>;
}

/// [`HttpFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> WmsResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("map-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WmsError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    #[instrument(skip(self))]
    async fn get_text(&self, url: &str) -> WmsResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WmsError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WmsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WmsError::transport(url, e))?;
        debug!(bytes = body.len(), "Fetched document");
        Ok(body)
    }
}

/// Append `params` to `base` as a percent-encoded query string.
pub fn build_url<'a, I>(base: &str, params: I) -> WmsResult<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| WmsError::InvalidUrl {
            url: base.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url(
            "http://geo.example.com/geoserver/wms",
            [("LAYERS", "webgis:areas"), ("STYLES", ""), ("BBOX", "1,2,3,4")],
        )
        .unwrap();

        assert!(url.starts_with("http://geo.example.com/geoserver/wms?"));
        assert!(url.contains("LAYERS=webgis%3Aareas"));
        assert!(url.contains("STYLES=&"));
        assert!(url.contains("BBOX=1%2C2%2C3%2C4"));
    }

    #[test]
    fn test_build_url_rejects_relative_base() {
        let err = build_url("/geoserver/wms", [("A", "b")]).unwrap_err();
        assert!(matches!(err, WmsError::InvalidUrl { .. }));
    }

    #[test]
    fn test_fetcher_builds() {
        assert!(ReqwestFetcher::new(DEFAULT_TIMEOUT).is_ok());
    }
}
