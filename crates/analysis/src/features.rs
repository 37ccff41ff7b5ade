//! GeoJSON feature sets produced by polygonizing a raster.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use geo_common::{GeoError, GeoResult};

/// Property holding the originating cell value.
pub const OBSERVATION_PROPERTY: &str = "DN";

/// A GeoJSON position; only longitude and latitude are used.
pub type Position = Vec<f64>;

/// Geometry of a feature. Types other than the ones listed deserialize to
/// `Unsupported` and have no representative coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// The point itself, or the arithmetic mean of the first ring / path.
    pub fn representative_coord(&self) -> Option<(f64, f64)> {
        match self {
            Geometry::Point { coordinates } => lon_lat(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                mean_position(coordinates)
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.first().and_then(|ring| mean_position(ring))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|polygon| polygon.first())
                .and_then(|ring| mean_position(ring)),
            Geometry::Unsupported => None,
        }
    }
}

fn lon_lat(position: &[f64]) -> Option<(f64, f64)> {
    match position {
        [lon, lat, ..] => Some((*lon, *lat)),
        _ => None,
    }
}

fn mean_position(positions: &[Position]) -> Option<(f64, f64)> {
    let points: Vec<(f64, f64)> = positions.iter().filter_map(|p| lon_lat(p)).collect();
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_lon, sum_lat) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), (lon, lat)| (x + lon, y + lat));
    Some((sum_lon / n, sum_lat / n))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl GeoFeature {
    /// The `DN` value when it is numeric and strictly positive.
    pub fn observation(&self) -> Option<f64> {
        let value = self.properties.as_ref()?.get(OBSERVATION_PROPERTY)?;
        match value {
            Value::Number(n) => n.as_f64().filter(|v| *v > 0.0),
            _ => None,
        }
    }

    pub fn representative_coord(&self) -> Option<(f64, f64)> {
        self.geometry.as_ref()?.representative_coord()
    }
}

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoFeatureSet {
    #[serde(default)]
    pub features: Vec<GeoFeature>,
}

impl GeoFeatureSet {
    pub fn from_slice(bytes: &[u8]) -> GeoResult<Self> {
        serde_json::from_slice(bytes).map_err(GeoError::from)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features carrying a usable observation, paired with it.
    pub fn observations(&self) -> impl Iterator<Item = (&GeoFeature, f64)> {
        self.features
            .iter()
            .filter_map(|f| f.observation().map(|v| (f, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> GeoFeatureSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_observation_filters_non_positive_and_non_numeric() {
        let set = parse(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"DN": 4}},
                {"type": "Feature", "geometry": null, "properties": {"DN": 0}},
                {"type": "Feature", "geometry": null, "properties": {"DN": -2.5}},
                {"type": "Feature", "geometry": null, "properties": {"DN": "7"}},
                {"type": "Feature", "geometry": null, "properties": {}},
                {"type": "Feature", "geometry": null}
            ]
        }));
        let values: Vec<f64> = set.observations().map(|(_, v)| v).collect();
        assert_eq!(values, vec![4.0]);
    }

    #[test]
    fn test_polygon_uses_first_ring_mean() {
        let geometry: Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]],
                [[10.0, 10.0], [11.0, 11.0]]
            ]
        }))
        .unwrap();
        assert_eq!(geometry.representative_coord(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_point_and_line() {
        let point: Geometry =
            serde_json::from_value(json!({"type": "Point", "coordinates": [-11.5, 16.7, 300.0]}))
                .unwrap();
        assert_eq!(point.representative_coord(), Some((-11.5, 16.7)));

        let line: Geometry = serde_json::from_value(
            json!({"type": "LineString", "coordinates": [[0.0, 1.0], [4.0, 3.0]]}),
        )
        .unwrap();
        assert_eq!(line.representative_coord(), Some((2.0, 2.0)));
    }

    #[test]
    fn test_unsupported_geometry() {
        let geometry: Geometry = serde_json::from_value(json!({
            "type": "GeometryCollection",
            "geometries": []
        }))
        .unwrap();
        assert_eq!(geometry, Geometry::Unsupported);
        assert_eq!(geometry.representative_coord(), None);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(GeoFeatureSet::from_slice(b"{not json").is_err());
    }
}
