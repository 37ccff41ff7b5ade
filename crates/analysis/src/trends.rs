//! Year-over-year trends.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::engine::{describe_set, Fetched, StatisticsEngine, UnitFailure};
use crate::source::FeatureSource;
use crate::statistics::{round_to, CenterOfMass, StatisticsResult};

/// Per-axis movement (degrees) below which a center of mass is considered
/// not to have moved.
pub const SHIFT_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

/// Movement of the center of mass between two consecutive years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterShift {
    pub delta_longitude: f64,
    pub delta_latitude: f64,
    pub direction: &'static str,
}

impl CenterShift {
    pub fn between(from: &CenterOfMass, to: &CenterOfMass) -> Self {
        let delta_longitude = to.longitude - from.longitude;
        let delta_latitude = to.latitude - from.latitude;
        Self {
            delta_longitude,
            delta_latitude,
            direction: shift_direction(delta_longitude, delta_latitude),
        }
    }
}

/// Bucket a movement into one of eight compass labels. Each axis is
/// thresholded on its own; no bearing is computed.
pub fn shift_direction(delta_longitude: f64, delta_latitude: f64) -> &'static str {
    let ns = if delta_latitude > SHIFT_THRESHOLD {
        1
    } else if delta_latitude < -SHIFT_THRESHOLD {
        -1
    } else {
        0
    };
    let ew = if delta_longitude > SHIFT_THRESHOLD {
        1
    } else if delta_longitude < -SHIFT_THRESHOLD {
        -1
    } else {
        0
    };
    match (ns, ew) {
        (1, 1) => "Northeast",
        (1, -1) => "Northwest",
        (1, _) => "North",
        (-1, 1) => "Southeast",
        (-1, -1) => "Southwest",
        (-1, _) => "South",
        (_, 1) => "East",
        (_, -1) => "West",
        _ => "No significant shift",
    }
}

/// Change between the first and last years with a positive mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalChange {
    pub from_year: i32,
    pub to_year: i32,
    pub percent_change: f64,
    /// Compound yearly growth, in percent.
    pub annualized_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub dataset: String,
    pub region: String,
    pub yearly_statistics: BTreeMap<i32, StatisticsResult>,
    /// Percent change of the mean, keyed `"<prev>-<cur>"`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub percent_changes: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub center_shifts: BTreeMap<String, CenterShift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_yearly_change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_direction: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_change: Option<TotalChange>,
    pub missing_years: Vec<i32>,
    pub failures: Vec<UnitFailure>,
}

impl TrendResult {
    /// Fill the change metrics from `yearly_statistics`. Needs at least two
    /// years; otherwise only the per-year statistics are reported.
    fn compute_changes(&mut self) {
        if self.yearly_statistics.len() < 2 {
            return;
        }
        let years: Vec<(&i32, &StatisticsResult)> = self.yearly_statistics.iter().collect();
        for pair in years.windows(2) {
            let (prev_year, prev) = pair[0];
            let (cur_year, cur) = pair[1];
            let key = format!("{}-{}", prev_year, cur_year);
            if prev.mean > 0.0 && cur.mean > 0.0 {
                let change = (cur.mean - prev.mean) / prev.mean * 100.0;
                self.percent_changes.insert(key.clone(), round_to(change, 2));
            }
            if prev.count > 0 && cur.count > 0 {
                self.center_shifts.insert(
                    key,
                    CenterShift::between(&prev.center_of_mass, &cur.center_of_mass),
                );
            }
        }

        let sum: f64 = self.percent_changes.values().sum();
        self.average_yearly_change = Some(if self.percent_changes.is_empty() {
            0.0
        } else {
            round_to(sum / self.percent_changes.len() as f64, 2)
        });
        self.trend_direction = Some(if sum > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        });

        let mut positive = self.yearly_statistics.iter().filter(|(_, s)| s.mean > 0.0);
        let first = positive.next();
        let last = positive.last();
        if let (Some((&y0, s0)), Some((&y1, s1))) = (first, last) {
            let ratio = s1.mean / s0.mean;
            let span = (y1 - y0) as f64;
            self.total_change = Some(TotalChange {
                from_year: y0,
                to_year: y1,
                percent_change: round_to((ratio - 1.0) * 100.0, 2),
                annualized_rate: round_to((ratio.powf(1.0 / span) - 1.0) * 100.0, 2),
            });
        }
    }
}

impl<S: FeatureSource> StatisticsEngine<S> {
    /// Per-year statistics and change metrics for `dataset` in `region`.
    ///
    /// Years are analysed in ascending order; missing and unreadable years
    /// are reported and skipped.
    pub fn temporal_trend(&self, dataset: &str, region: &str, years: &[i32]) -> TrendResult {
        let mut years = years.to_vec();
        years.sort_unstable();
        years.dedup();

        let mut result = TrendResult {
            dataset: dataset.to_string(),
            region: region.to_string(),
            yearly_statistics: BTreeMap::new(),
            percent_changes: BTreeMap::new(),
            center_shifts: BTreeMap::new(),
            average_yearly_change: None,
            trend_direction: None,
            total_change: None,
            missing_years: Vec::new(),
            failures: Vec::new(),
        };

        for year in years {
            match self.fetch(dataset, region, year, year) {
                Fetched::Present(set) => {
                    result.yearly_statistics.insert(year, describe_set(&set));
                }
                Fetched::Absent => result.missing_years.push(year),
                Fetched::Failed(failure) => result.failures.push(failure),
            }
        }
        result.compute_changes();

        info!(
            dataset = dataset,
            region = region,
            years = result.yearly_statistics.len(),
            missing = result.missing_years.len(),
            "Computed temporal trend"
        );
        result
    }
}
