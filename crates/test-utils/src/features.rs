//! GeoJSON builders for vector-source tests.

use std::path::Path;

use serde_json::{json, Value};

/// A point feature carrying a `DN` observation.
pub fn point_feature(lon: f64, lat: f64, dn: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": { "DN": dn },
        "geometry": { "type": "Point", "coordinates": [lon, lat] }
    })
}

/// A polygon feature (single closed ring) carrying a `DN` observation.
pub fn polygon_feature(ring: &[(f64, f64)], dn: Value) -> Value {
    let coords: Vec<Value> = ring.iter().map(|(x, y)| json!([x, y])).collect();
    json!({
        "type": "Feature",
        "properties": { "DN": dn },
        "geometry": { "type": "Polygon", "coordinates": [coords] }
    })
}

/// A square polygon of side `size` anchored at (lon, lat).
pub fn square_feature(lon: f64, lat: f64, size: f64, dn: Value) -> Value {
    polygon_feature(
        &[
            (lon, lat),
            (lon + size, lat),
            (lon + size, lat + size),
            (lon, lat + size),
        ],
        dn,
    )
}

/// Wraps features in a FeatureCollection.
pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({ "type": "FeatureCollection", "features": features })
}

/// A collection of point features on a diagonal with the given DN values.
pub fn diagonal_points(origin: (f64, f64), values: &[f64]) -> Value {
    let features = values
        .iter()
        .enumerate()
        .map(|(i, v)| point_feature(origin.0 + i as f64 * 0.1, origin.1 + i as f64 * 0.1, json!(v)))
        .collect();
    feature_collection(features)
}

/// Writes GeoJSON to disk, creating parent directories.
pub fn write_geojson(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    let text = serde_json::to_string(value).expect("Failed to serialize GeoJSON");
    std::fs::write(path, text).expect("Failed to write GeoJSON fixture");
}
