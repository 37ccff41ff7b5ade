//! Descriptive statistics and value-weighted centers of mass.

use serde::Serialize;

use crate::features::GeoFeatureSet;

/// Value-weighted geographic centroid.
///
/// `(0, 0)` is the sentinel for "no qualifying points"; use the
/// accompanying count to tell it apart from a real centroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CenterOfMass {
    pub longitude: f64,
    pub latitude: f64,
}

impl CenterOfMass {
    pub fn is_zero(&self) -> bool {
        self.longitude == 0.0 && self.latitude == 0.0
    }
}

/// Descriptive statistics for one value set. All zero when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatisticsResult {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub center_of_mass: CenterOfMass,
}

/// Observations that are numeric and strictly positive.
pub fn extract_values(features: &GeoFeatureSet) -> Vec<f64> {
    features.observations().map(|(_, v)| v).collect()
}

/// Weighted average of each qualifying feature's representative coordinate.
pub fn center_of_mass(features: &GeoFeatureSet) -> CenterOfMass {
    let (mut sum_lon, mut sum_lat, mut total) = (0.0, 0.0, 0.0);
    for (feature, weight) in features.observations() {
        if let Some((lon, lat)) = feature.representative_coord() {
            sum_lon += lon * weight;
            sum_lat += lat * weight;
            total += weight;
        }
    }
    if total <= 0.0 {
        return CenterOfMass::default();
    }
    CenterOfMass {
        longitude: sum_lon / total,
        latitude: sum_lat / total,
    }
}

/// Count, min, max, mean, median and population std-dev of `values`.
/// The center of mass is computed only when `features` is given.
pub fn statistics(values: &[f64], features: Option<&GeoFeatureSet>) -> StatisticsResult {
    if values.is_empty() {
        return StatisticsResult::default();
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    StatisticsResult {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        mean,
        median,
        std_dev: var.sqrt(),
        center_of_mass: features.map(center_of_mass).unwrap_or_default(),
    }
}

/// Round to `places` decimal places, half away from zero.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
