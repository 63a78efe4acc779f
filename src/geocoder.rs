//! Reverse geocoding on top of the shape index.

use crate::builder::GeocoderBuilder;
use crate::compute::sphere::{Angle, ChordAngle, Point, Rad, chord_degrees, point_from_coord};
use crate::config::Config;
use crate::error::{Result, RgeoError};
use crate::feature::FeatureCollection;
use crate::index::{IndexStats, ShapeId, ShapeIndex};
use geo::Coord;
use rgeo_types::Location;

/// Offline reverse geocoder over one or more region datasets.
///
/// Queries take `&self` and never mutate, so a geocoder can be shared
/// between threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Geocoder {
    index: ShapeIndex<Location>,
    snap_limit: ChordAngle,
}

impl Geocoder {
    pub fn builder() -> GeocoderBuilder {
        GeocoderBuilder::new()
    }

    /// Build a geocoder from datasets with the default configuration.
    ///
    /// Fails with [`RgeoError::NoDatasets`] when `datasets` is empty.
    pub fn new<I>(datasets: I) -> Result<Self>
    where
        I: IntoIterator<Item = FeatureCollection>,
    {
        GeocoderBuilder::new().datasets(datasets).build()
    }

    pub(crate) fn from_index(index: ShapeIndex<Location>, config: &Config) -> Self {
        Self {
            index,
            snap_limit: snap_limit(config.snap_distance_km, config.sphere_radius_km),
        }
    }

    /// Location of the regions containing `point` (longitude, latitude in
    /// degrees).
    ///
    /// Every containing region contributes, in index order; each field takes
    /// the first non-empty value. A point exactly on a region boundary is not
    /// inside that region.
    pub fn reverse_geocode<P: Into<Coord<f64>>>(&self, point: P) -> Result<Location> {
        let coord = point.into();
        let p = query_point(coord)?;

        let shapes = self.index.containing_shapes(&p);
        log::trace!("{:?} is inside {} shapes", coord, shapes.len());
        if shapes.is_empty() {
            return Err(RgeoError::NotFound);
        }

        Ok(self.combine(&shapes))
    }

    /// Like [`Geocoder::reverse_geocode`], but a point outside every region
    /// falls back to the region with the nearest boundary within the snapping
    /// distance.
    pub fn reverse_geocode_snapping<P: Into<Coord<f64>>>(&self, point: P) -> Result<Location> {
        let coord = point.into();
        match self.reverse_geocode(coord) {
            Err(RgeoError::NotFound) => {}
            result => return result,
        }

        let p = query_point(coord)?;
        match self.index.closest_edge_within(&p, self.snap_limit) {
            Some((shape, distance)) => {
                log::debug!(
                    "Snapped {:?} to shape {} at {:.6} degrees",
                    coord,
                    shape.0,
                    chord_degrees(distance)
                );
                Ok(self.combine(&[shape]))
            }
            None => Err(RgeoError::NotFound),
        }
    }

    fn combine(&self, shapes: &[ShapeId]) -> Location {
        Location::combine_all(shapes.iter().filter_map(|id| self.index.data(*id)))
    }

    /// Set the snapping distance in kilometres on Earth.
    pub fn set_snapping_distance_earth(&mut self, distance_km: f64) {
        self.set_snapping_distance_custom(distance_km, Config::EARTH_RADIUS_KM);
    }

    /// Set the snapping distance on a sphere of the given radius, both in the
    /// same unit.
    pub fn set_snapping_distance_custom(&mut self, distance: f64, radius: f64) {
        self.snap_limit = snap_limit(distance, radius);
        log::debug!(
            "Snapping distance set to {} on radius {} ({:.6} degrees)",
            distance,
            radius,
            chord_degrees(self.snap_limit)
        );
    }

    /// Current snapping bound.
    pub fn snap_limit(&self) -> ChordAngle {
        self.snap_limit
    }

    pub fn index(&self) -> &ShapeIndex<Location> {
        &self.index
    }

    pub fn shape_count(&self) -> usize {
        self.index.len()
    }

    pub fn location(&self, id: ShapeId) -> Option<&Location> {
        self.index.data(id)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

/// Chord bound for a linear distance on a sphere: `asin(distance / radius)`,
/// relaxed to the next representable chord so points exactly at the limit
/// still match. Distances beyond the radius saturate at a quarter turn.
pub fn snap_limit(distance: f64, radius: f64) -> ChordAngle {
    let ratio = distance / radius;
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    ChordAngle::from(Angle::from(Rad(ratio.asin()))).successor()
}

fn query_point(coord: Coord<f64>) -> Result<Point> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        log::warn!("Rejecting reverse geocode of non-finite coordinate {:?}", coord);
        return Err(RgeoError::NotFound);
    }
    Ok(point_from_coord(coord))
}
