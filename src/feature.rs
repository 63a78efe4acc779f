//! Features: a region polygon paired with its location metadata.

use crate::compute::polygon::Polygon;
use crate::error::Result;
use crate::storage::codec;
use rgeo_types::Location;

/// One region of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub location: Location,
    pub polygon: Polygon,
}

/// Features in dataset order. Datasets are concatenated without
/// deduplication.
pub type FeatureCollection = Vec<Feature>;

impl Feature {
    pub fn new(location: Location, polygon: Polygon) -> Self {
        Self { location, polygon }
    }

    /// Encode as a single stream record.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        codec::encode_record(self, &mut buf)?;
        Ok(buf)
    }

    /// Decode a single stream record; trailing bytes are an error.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode_single_record(bytes)
    }
}
