//! Error types for the map viewer.

use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// Primary error type for WMS client operations.
#[derive(Debug, Error)]
pub enum WmsError {
    // === Transport Errors ===
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // === Document Errors ===
    #[error("Failed to parse {document}: {message}")]
    Parse { document: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // === Request Construction Errors ===
    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WmsError {
    pub fn transport(url: impl Into<String>, message: impl ToString) -> Self {
        WmsError::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(document: impl Into<String>, message: impl ToString) -> Self {
        WmsError::Parse {
            document: document.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WmsError::NotFound(_))
    }
}

impl From<crate::bbox::BboxParseError> for WmsError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        WmsError::InvalidBbox(err.to_string())
    }
}

impl From<serde_json::Error> for WmsError {
    fn from(err: serde_json::Error) -> Self {
        WmsError::parse("JSON document", err)
    }
}
