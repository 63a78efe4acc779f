//! Offline reverse geocoding against bundled region polygons.
//!
//! Regions (countries, provinces, urban areas) are loaded as [`Feature`]s,
//! indexed on the sphere, and queried by longitude/latitude with no network
//! access.
//!
//! ```rust
//! use rgeo::prelude::*;
//! use geo::Coord;
//!
//! let ring: Vec<Coord<f64>> = vec![
//!     Coord { x: -5.0, y: 42.0 },
//!     Coord { x: 8.0, y: 42.0 },
//!     Coord { x: 8.0, y: 51.0 },
//!     Coord { x: -5.0, y: 51.0 },
//!     Coord { x: -5.0, y: 42.0 },
//! ];
//! let france = Feature::new(
//!     Location {
//!         country: "France".into(),
//!         country_code_2: "FR".into(),
//!         ..Location::default()
//!     },
//!     Polygon::from_rings(&[ring])?,
//! );
//!
//! let geocoder = Geocoder::builder().dataset(vec![france]).build()?;
//! let location = geocoder.reverse_geocode((2.3522, 48.8566))?;
//! assert_eq!(location.country_code_2, "FR");
//!
//! assert!(geocoder.reverse_geocode((-30.0, 0.0)).unwrap_err().is_not_found());
//! # Ok::<(), rgeo::RgeoError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod feature;
pub mod geocoder;
pub mod index;
pub mod storage;

pub use builder::GeocoderBuilder;
pub use compute::{ChordAngle, Loop, Point, Polygon, point_from_degrees, point_to_coord};
pub use config::{Config, IndexConfig};
pub use error::{Result, RgeoError};
pub use feature::{Feature, FeatureCollection};
pub use geocoder::Geocoder;
pub use index::{IndexStats, ShapeId, ShapeIndex, ShapeIndexBuilder};
pub use storage::{
    decode_feature_stream, encode_feature_stream, load_feature_file, read_feature_stream,
    save_feature_file, write_feature_stream,
};

pub use rgeo_types::Location;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Geocoder, GeocoderBuilder, Result, RgeoError};

    pub use crate::{Feature, FeatureCollection, Location, Polygon};

    pub use crate::Config;

    pub use crate::{ShapeId, ShapeIndex, ShapeIndexBuilder};
}
