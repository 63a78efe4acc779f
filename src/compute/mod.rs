//! Spherical geometry: points, predicates, loops and polygons.

#[cfg(feature = "geojson")]
pub mod geojson;
pub mod polygon;
pub mod sphere;

pub use polygon::{Loop, Polygon};
pub use sphere::{Cap, ChordAngle, Point, point_from_degrees, point_to_coord};
