//! Cross-region comparison for one dataset and year.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::info;

use crate::engine::{describe_set, Fetched, StatisticsEngine, UnitFailure};
use crate::source::FeatureSource;
use crate::statistics::{CenterOfMass, StatisticsResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStatistics {
    pub region: String,
    pub statistics: StatisticsResult,
}

/// Region names winning each ranking. Ties go to the region listed first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rankings {
    pub highest_mean: String,
    pub lowest_mean: String,
    pub highest_max: String,
    pub most_variable: String,
    pub highest_median: String,
    pub lowest_median: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub northernmost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub southernmost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easternmost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub westernmost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionComparison {
    pub dataset: String,
    pub year: i32,
    /// In request order.
    pub regional_statistics: Vec<RegionStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rankings: Option<Rankings>,
    pub missing_regions: Vec<String>,
    pub failures: Vec<UnitFailure>,
}

impl RegionComparison {
    pub fn statistics_for(&self, region: &str) -> Option<&StatisticsResult> {
        self.regional_statistics
            .iter()
            .find(|r| r.region == region)
            .map(|r| &r.statistics)
    }

    /// Centers of mass, in request order.
    pub fn centers_of_mass(&self) -> Vec<(&str, CenterOfMass)> {
        self.regional_statistics
            .iter()
            .map(|r| (r.region.as_str(), r.statistics.center_of_mass))
            .collect()
    }
}

/// First item whose key is strictly better than every earlier one.
fn pick<'a, I, F>(items: I, key: F, want: Ordering) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a RegionStatistics>,
    F: Fn(&StatisticsResult) -> f64,
{
    let mut best: Option<(&'a str, f64)> = None;
    for item in items {
        let value = key(&item.statistics);
        match best {
            Some((_, current)) if value.total_cmp(&current) != want => {}
            _ => best = Some((item.region.as_str(), value)),
        }
    }
    best.map(|(region, _)| region)
}

fn rankings(regions: &[RegionStatistics]) -> Option<Rankings> {
    use Ordering::{Greater, Less};

    let name = |o: Option<&str>| o.map(str::to_string);
    let highest_mean = name(pick(regions, |s| s.mean, Greater))?;
    let lowest_mean = name(pick(regions, |s| s.mean, Less))?;
    let highest_max = name(pick(regions, |s| s.max, Greater))?;
    let most_variable = name(pick(regions, |s| s.std_dev, Greater))?;
    let highest_median = name(pick(regions, |s| s.median, Greater))?;
    let lowest_median = name(pick(regions, |s| s.median, Less))?;

    let located: Vec<&RegionStatistics> = regions
        .iter()
        .filter(|r| !r.statistics.center_of_mass.is_zero())
        .collect();
    let directional = |key: fn(&StatisticsResult) -> f64, want| {
        if located.len() >= 2 {
            name(pick(located.iter().copied(), key, want))
        } else {
            None
        }
    };

    Some(Rankings {
        highest_mean,
        lowest_mean,
        highest_max,
        most_variable,
        highest_median,
        lowest_median,
        northernmost: directional(|s| s.center_of_mass.latitude, Greater),
        southernmost: directional(|s| s.center_of_mass.latitude, Less),
        easternmost: directional(|s| s.center_of_mass.longitude, Greater),
        westernmost: directional(|s| s.center_of_mass.longitude, Less),
    })
}

impl<S: FeatureSource> StatisticsEngine<S> {
    /// Statistics for each region plus rankings across the regions that had data.
    pub fn compare_regions<R: AsRef<str>>(&self, dataset: &str, regions: &[R], year: i32) -> RegionComparison {
        let mut comparison = RegionComparison {
            dataset: dataset.to_string(),
            year,
            regional_statistics: Vec::new(),
            rankings: None,
            missing_regions: Vec::new(),
            failures: Vec::new(),
        };

        for region in regions {
            let region = region.as_ref();
            match self.fetch(dataset, region, year, region) {
                Fetched::Present(set) => comparison.regional_statistics.push(RegionStatistics {
                    region: region.to_string(),
                    statistics: describe_set(&set),
                }),
                Fetched::Absent => comparison.missing_regions.push(region.to_string()),
                Fetched::Failed(failure) => comparison.failures.push(failure),
            }
        }
        comparison.rankings = rankings(&comparison.regional_statistics);

        info!(
            dataset = dataset,
            year = year,
            regions = comparison.regional_statistics.len(),
            missing = comparison.missing_regions.len(),
            "Compared regions"
        );
        comparison
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str, mean: f64, lon: f64, lat: f64) -> RegionStatistics {
        RegionStatistics {
            region: name.to_string(),
            statistics: StatisticsResult {
                count: 1,
                min: mean,
                max: mean,
                mean,
                median: mean,
                std_dev: 0.0,
                center_of_mass: CenterOfMass {
                    longitude: lon,
                    latitude: lat,
                },
            },
        }
    }

    #[test]
    fn test_ties_go_to_first_region() {
        let regions = vec![region("A", 5.0, 1.0, 1.0), region("B", 5.0, 2.0, 2.0)];
        let r = rankings(&regions).unwrap();
        assert_eq!(r.highest_mean, "A");
        assert_eq!(r.lowest_mean, "A");
        assert_eq!(r.most_variable, "A");
    }

    #[test]
    fn test_directional_rankings_need_two_located_regions() {
        let regions = vec![region("A", 5.0, 0.0, 0.0), region("B", 9.0, -11.0, 16.0)];
        let r = rankings(&regions).unwrap();
        assert_eq!(r.highest_mean, "B");
        assert!(r.northernmost.is_none());
        assert!(r.westernmost.is_none());
    }

    #[test]
    fn test_no_regions_no_rankings() {
        assert!(rankings(&[]).is_none());
    }
}
