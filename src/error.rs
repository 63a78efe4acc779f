//! Error types for geometry construction, dataset decoding and lookups.

use thiserror::Error;

/// Errors produced by rgeo.
#[derive(Error, Debug)]
pub enum RgeoError {
    /// Malformed ring: too few points, unclosed, or degenerate.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Geometry kind that cannot describe a region (points, lines, ...).
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// Truncated or malformed record in a persisted feature stream.
    #[error("Failed to decode feature {record}: {reason}")]
    Decode { record: usize, reason: String },

    /// No region contains (or lies near) the queried point.
    #[error("Location not found")]
    NotFound,

    /// A geocoder was requested without any dataset.
    #[error("No datasets provided")]
    NoDatasets,

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "geojson")]
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl RgeoError {
    /// Returns true for [`RgeoError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RgeoError::NotFound)
    }
}

/// Result type for rgeo operations.
pub type Result<T> = std::result::Result<T, RgeoError>;
