//! Geocoder builder
//!
//! Collects datasets and configuration, then builds the shape index eagerly
//! so the first query pays no construction cost.

use crate::config::Config;
use crate::error::{Result, RgeoError};
use crate::feature::FeatureCollection;
use crate::geocoder::Geocoder;
use crate::index::ShapeIndexBuilder;
use std::time::Instant;

/// Builder for a [`Geocoder`] over one or more datasets.
#[derive(Debug, Clone)]
pub struct GeocoderBuilder {
    config: Config,
    datasets: Vec<FeatureCollection>,
}

impl GeocoderBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            datasets: Vec::new(),
        }
    }

    /// Set the geocoder configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Add a dataset. Datasets are indexed in the order they are added.
    pub fn dataset(mut self, features: FeatureCollection) -> Self {
        self.datasets.push(features);
        self
    }

    pub fn datasets<I>(mut self, datasets: I) -> Self
    where
        I: IntoIterator<Item = FeatureCollection>,
    {
        self.datasets.extend(datasets);
        self
    }

    /// Build the index and the geocoder.
    ///
    /// Fails with [`RgeoError::NoDatasets`] if no dataset was added and with
    /// [`RgeoError::InvalidConfig`] if the configuration does not validate.
    pub fn build(self) -> Result<Geocoder> {
        if self.datasets.is_empty() {
            return Err(RgeoError::NoDatasets);
        }
        self.config.validate().map_err(RgeoError::InvalidConfig)?;

        let start = Instant::now();
        let num_datasets = self.datasets.len();
        let mut index = ShapeIndexBuilder::with_config(self.config.index.clone());
        for feature in self.datasets.into_iter().flatten() {
            index.insert(feature.polygon, feature.location);
        }
        let index = index.build();

        log::info!(
            "Geocoder ready: {} datasets, {} regions in {:?}",
            num_datasets,
            index.len(),
            start.elapsed()
        );
        Ok(Geocoder::from_index(index, &self.config))
    }
}

impl Default for GeocoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::polygon::Polygon;
    use crate::config::IndexConfig;
    use crate::feature::Feature;
    use geo::Coord;
    use rgeo_types::Location;

    fn dataset(name: &str, x0: f64) -> FeatureCollection {
        let ring: Vec<Coord<f64>> = [(x0, 0.0), (x0 + 1.0, 0.0), (x0 + 1.0, 1.0), (x0, 1.0), (x0, 0.0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        vec![Feature::new(
            Location {
                country: name.into(),
                ..Location::default()
            },
            Polygon::from_rings(&[ring]).unwrap(),
        )]
    }

    #[test]
    fn test_builder_requires_dataset() {
        let err = GeocoderBuilder::new().build().unwrap_err();
        assert!(matches!(err, RgeoError::NoDatasets));
    }

    #[test]
    fn test_builder_empty_dataset_is_accepted() {
        let geocoder = GeocoderBuilder::new().dataset(Vec::new()).build().unwrap();
        assert_eq!(geocoder.shape_count(), 0);
        assert!(geocoder.reverse_geocode((0.5, 0.5)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_builder_concatenates_datasets_in_order() {
        let geocoder = GeocoderBuilder::new()
            .dataset(dataset("A", 0.0))
            .datasets([dataset("B", 5.0), dataset("C", 10.0)])
            .build()
            .unwrap();
        assert_eq!(geocoder.shape_count(), 3);
        let names: Vec<&str> = geocoder
            .index()
            .iter()
            .map(|(_, _, loc)| loc.country.as_str())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(geocoder.reverse_geocode((5.5, 0.5)).unwrap().country, "B");
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = Config::default();
        config.sphere_radius_km = -1.0;
        let err = GeocoderBuilder::new()
            .config(config)
            .dataset(dataset("A", 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, RgeoError::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_uses_config() {
        let config = Config::default()
            .with_snap_distance_km(50.0)
            .with_index(IndexConfig::default().with_max_edges_per_cell(3));
        let geocoder = GeocoderBuilder::new()
            .config(config)
            .dataset(dataset("A", 0.0))
            .build()
            .unwrap();
        // About 33 km east of the square.
        assert_eq!(
            geocoder.reverse_geocode_snapping((1.3, 0.5)).unwrap().country,
            "A"
        );
        assert!(geocoder.stats().cells > 6);
    }
}
