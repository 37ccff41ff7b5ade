//! Cross-dataset correlation per year.
//!
//! The two value lists are paired by position after truncating to the
//! shorter one. Feature order in two different files is not guaranteed to
//! refer to the same cells, so the coefficient describes list order, not
//! spatial co-location.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use geo_common::GeoError;

use crate::engine::{Fetched, StatisticsEngine, UnitFailure};
use crate::source::FeatureSource;
use crate::statistics::{extract_values, round_to};

/// Fewest paired observations for a year to be used.
pub const MIN_PAIRED_SAMPLES: usize = 10;

pub const DEFAULT_PAIR: (&str, &str) = ("PopDensity", "Precipitation");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Positive,
    Negative,
    Neutral,
}

impl Relationship {
    pub fn classify(r: f64) -> Self {
        if r > 0.1 {
            Relationship::Positive
        } else if r < -0.1 {
            Relationship::Negative
        } else {
            Relationship::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn classify(r: f64) -> Self {
        let r = r.abs();
        if r > 0.7 {
            Strength::Strong
        } else if r > 0.3 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedYear {
    pub year: i32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub region: String,
    pub datasets: (String, String),
    /// Pearson r per year, rounded to 3 decimals.
    pub yearly_correlations: BTreeMap<i32, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_correlation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<Relationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_strength: Option<Strength>,
    pub skipped: Vec<SkippedYear>,
    pub failures: Vec<UnitFailure>,
}

/// Pearson correlation of two equally long samples. `None` when either
/// side has no variance or the lengths differ.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.is_empty() {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

impl<S: FeatureSource> StatisticsEngine<S> {
    /// Correlate population density with precipitation.
    pub fn correlate(&self, region: &str, years: &[i32]) -> CorrelationResult {
        self.correlate_datasets(region, years, DEFAULT_PAIR)
    }

    /// Correlate two datasets year by year and classify the average.
    pub fn correlate_datasets(&self, region: &str, years: &[i32], pair: (&str, &str)) -> CorrelationResult {
        let mut result = CorrelationResult {
            region: region.to_string(),
            datasets: (pair.0.to_string(), pair.1.to_string()),
            yearly_correlations: BTreeMap::new(),
            average_correlation: None,
            relationship_type: None,
            correlation_strength: None,
            skipped: Vec::new(),
            failures: Vec::new(),
        };

        for &year in years {
            let first = self.fetch(pair.0, region, year, format!("{}/{}", pair.0, year));
            let second = self.fetch(pair.1, region, year, format!("{}/{}", pair.1, year));
            let (a, b) = match (first, second) {
                (Fetched::Present(a), Fetched::Present(b)) => (a, b),
                (first, second) => {
                    let mut absent = false;
                    for fetched in [first, second] {
                        match fetched {
                            Fetched::Failed(failure) => result.failures.push(failure),
                            Fetched::Absent => absent = true,
                            Fetched::Present(_) => {}
                        }
                    }
                    if absent {
                        result.skipped.push(SkippedYear {
                            year,
                            reason: "feature set not available for both datasets".to_string(),
                        });
                    }
                    continue;
                }
            };

            let mut xs = extract_values(&a);
            let mut ys = extract_values(&b);
            let paired = xs.len().min(ys.len());
            if paired < MIN_PAIRED_SAMPLES {
                let err = GeoError::InsufficientSamples {
                    required: MIN_PAIRED_SAMPLES,
                    found: paired,
                };
                debug!(region = region, year = year, error = %err, "Skipping year");
                result.skipped.push(SkippedYear {
                    year,
                    reason: err.to_string(),
                });
                continue;
            }
            xs.truncate(paired);
            ys.truncate(paired);

            match pearson(&xs, &ys) {
                Some(r) => {
                    result.yearly_correlations.insert(year, round_to(r, 3));
                }
                None => result.skipped.push(SkippedYear {
                    year,
                    reason: "zero variance in one of the samples".to_string(),
                }),
            }
        }

        if !result.yearly_correlations.is_empty() {
            let avg = result.yearly_correlations.values().sum::<f64>()
                / result.yearly_correlations.len() as f64;
            result.average_correlation = Some(round_to(avg, 3));
            result.relationship_type = Some(Relationship::classify(avg));
            result.correlation_strength = Some(Strength::classify(avg));
        }

        info!(
            region = region,
            years = result.yearly_correlations.len(),
            skipped = result.skipped.len(),
            "Computed correlation"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(pearson(&[], &[]), None);
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(Relationship::classify(0.1), Relationship::Neutral);
        assert_eq!(Relationship::classify(0.11), Relationship::Positive);
        assert_eq!(Relationship::classify(-0.2), Relationship::Negative);
        assert_eq!(Strength::classify(0.3), Strength::Weak);
        assert_eq!(Strength::classify(-0.5), Strength::Moderate);
        assert_eq!(Strength::classify(0.71), Strength::Strong);
    }
}
