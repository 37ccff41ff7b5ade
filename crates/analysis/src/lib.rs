//! Statistics over vectorized raster observations.
//!
//! Feature sets come from a [`FeatureSource`]; everything else in this
//! crate is a pure computation over them:
//! - Descriptive statistics and value-weighted center of mass
//! - Year-over-year trends with center-of-mass shifts
//! - Cross-region rankings
//! - Cross-dataset correlation

pub mod compare;
pub mod correlation;
pub mod engine;
pub mod features;
pub mod source;
pub mod statistics;
pub mod trends;

pub use compare::{RegionComparison, RegionStatistics, Rankings};
pub use correlation::{pearson, CorrelationResult, Relationship, Strength, MIN_PAIRED_SAMPLES};
pub use engine::{StatisticsEngine, UnitFailure};
pub use features::{GeoFeature, GeoFeatureSet, Geometry};
pub use source::{FeatureSource, FeatureSourceConfig, FileFeatureSource, InMemoryFeatureSource};
pub use statistics::{center_of_mass, extract_values, statistics, CenterOfMass, StatisticsResult};
pub use trends::{CenterShift, TotalChange, TrendDirection, TrendResult, SHIFT_THRESHOLD};
