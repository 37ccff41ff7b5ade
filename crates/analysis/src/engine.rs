//! The statistics engine: analyses driven by a [`FeatureSource`].

use serde::Serialize;
use tracing::warn;

use geo_common::{GeoError, GeoResult};

use crate::features::GeoFeatureSet;
use crate::source::FeatureSource;
use crate::statistics::{extract_values, statistics, StatisticsResult};

/// A unit of work (one year or one region) that could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub code: String,
    pub error: String,
}

impl UnitFailure {
    pub(crate) fn new(unit: impl ToString, err: &GeoError) -> Self {
        Self {
            unit: unit.to_string(),
            code: err.code().to_string(),
            error: err.to_string(),
        }
    }
}

/// Outcome of fetching one feature set.
pub(crate) enum Fetched {
    Present(GeoFeatureSet),
    Absent,
    Failed(UnitFailure),
}

/// Runs trend, comparison and correlation analyses over a feature source.
#[derive(Debug, Clone)]
pub struct StatisticsEngine<S> {
    source: S,
}

impl<S: FeatureSource> StatisticsEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub(crate) fn fetch(&self, dataset: &str, region: &str, year: i32, unit: impl ToString) -> Fetched {
        match self.source.features(dataset, region, year) {
            Ok(Some(set)) => Fetched::Present(set),
            Ok(None) => Fetched::Absent,
            Err(e) => {
                warn!(dataset = dataset, region = region, year = year, error = %e, "Failed to read features");
                Fetched::Failed(UnitFailure::new(unit, &e))
            }
        }
    }

    /// Statistics (with center of mass) for one feature set, if present.
    pub fn describe(&self, dataset: &str, region: &str, year: i32) -> GeoResult<Option<StatisticsResult>> {
        Ok(self
            .source
            .features(dataset, region, year)?
            .map(|set| describe_set(&set)))
    }
}

pub(crate) fn describe_set(set: &GeoFeatureSet) -> StatisticsResult {
    statistics(&extract_values(set), Some(set))
}
