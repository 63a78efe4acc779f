//! GeoJSON feature collections to indexable features.
//!
//! Region metadata is taken from Natural Earth style properties:
//!
//! | Location field   | Property              |
//! |------------------|-----------------------|
//! | `country`        | `ADMIN`, else `admin` |
//! | `country_long`   | `FORMAL_EN`           |
//! | `country_code_2` | `ISO_A2_EH`           |
//! | `country_code_3` | `ISO_A3_EH`           |
//! | `continent`      | `CONTINENT`           |
//! | `region`         | `REGION_UN`           |
//! | `subregion`      | `SUBREGION`           |
//! | `province`       | `name`                |
//! | `province_code`  | `iso_3166_2`          |
//! | `city`           | `name_conve`          |
//!
//! Missing or non-string properties leave the field empty.

use crate::compute::polygon::Polygon;
use crate::error::{Result, RgeoError};
use crate::feature::{Feature, FeatureCollection};
use geo::Coord;
use geojson::{GeoJson, Geometry, JsonObject, PolygonType, Position, Value};
use rgeo_types::Location;

/// Parses a GeoJSON document that must be a FeatureCollection.
pub fn parse_feature_collection(json: &str) -> Result<geojson::FeatureCollection> {
    match json.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(RgeoError::UnsupportedGeometry(
            "Expected a FeatureCollection, got a Feature".to_string(),
        )),
        GeoJson::Geometry(_) => Err(RgeoError::UnsupportedGeometry(
            "Expected a FeatureCollection, got a Geometry".to_string(),
        )),
    }
}

/// Converts every feature of a collection, failing on the first feature
/// without a polygonal geometry.
pub fn features_from_geojson(collection: &geojson::FeatureCollection) -> Result<FeatureCollection> {
    let mut features = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.iter().enumerate() {
        let geometry = feature.geometry.as_ref().ok_or_else(|| {
            RgeoError::InvalidGeometry(format!("Feature {} has no geometry", i))
        })?;
        let polygon = polygon_from_geojson(geometry).map_err(|e| with_feature_index(e, i))?;
        features.push(Feature::new(
            location_from_properties(feature.properties.as_ref()),
            polygon,
        ));
    }
    log::debug!("Converted {} GeoJSON features", features.len());
    Ok(features)
}

/// [`parse_feature_collection`] followed by [`features_from_geojson`].
pub fn features_from_geojson_str(json: &str) -> Result<FeatureCollection> {
    features_from_geojson(&parse_feature_collection(json)?)
}

pub fn location_from_properties(properties: Option<&JsonObject>) -> Location {
    let Some(properties) = properties else {
        return Location::default();
    };

    let city = property_string(properties, &["name_conve"]);
    Location {
        country: property_string(properties, &["ADMIN", "admin"]),
        country_long: property_string(properties, &["FORMAL_EN"]),
        country_code_2: property_string(properties, &["ISO_A2_EH"]),
        country_code_3: property_string(properties, &["ISO_A3_EH"]),
        continent: property_string(properties, &["CONTINENT"]),
        region: property_string(properties, &["REGION_UN"]),
        subregion: property_string(properties, &["SUBREGION"]),
        province: property_string(properties, &["name"]),
        province_code: property_string(properties, &["iso_3166_2"]),
        // Natural Earth urban areas carry a stray "2" on some names.
        city: city.strip_suffix('2').unwrap_or(&city).to_string(),
    }
}

/// First of `keys` present with a string value.
fn property_string(properties: &JsonObject, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| properties.get(*key).and_then(|value| value.as_str()))
        .unwrap_or_default()
        .to_string()
}

/// Converts a Polygon or MultiPolygon geometry.
pub fn polygon_from_geojson(geometry: &Geometry) -> Result<Polygon> {
    match &geometry.value {
        Value::Polygon(rings) => Polygon::from_rings(&coord_rings(rings)?),
        Value::MultiPolygon(polygons) => {
            let polygons = polygons
                .iter()
                .map(coord_rings)
                .collect::<Result<Vec<_>>>()?;
            Polygon::from_multi_rings(&polygons)
        }
        other => Err(RgeoError::UnsupportedGeometry(format!(
            "Needs Polygon or MultiPolygon, got {}",
            value_kind(other)
        ))),
    }
}

fn coord_rings(rings: &PolygonType) -> Result<Vec<Vec<Coord<f64>>>> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(coord_from_position)
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn coord_from_position(position: &Position) -> Result<Coord<f64>> {
    if position.len() < 2 {
        return Err(RgeoError::InvalidGeometry(
            "Coordinate must have at least 2 values".to_string(),
        ));
    }
    Ok(Coord {
        x: position[0],
        y: position[1],
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn with_feature_index(err: RgeoError, index: usize) -> RgeoError {
    match err {
        RgeoError::InvalidGeometry(msg) => {
            RgeoError::InvalidGeometry(format!("Feature {}: {}", index, msg))
        }
        RgeoError::UnsupportedGeometry(msg) => {
            RgeoError::UnsupportedGeometry(format!("Feature {}: {}", index, msg))
        }
        other => other,
    }
}
