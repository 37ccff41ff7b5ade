//! Lookup of vector feature sets by dataset, region and year.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use geo_common::{default_vector_datasets, GeoError, GeoResult, VectorDatasetSpec};

use crate::features::GeoFeatureSet;

/// Supplies feature sets to the statistics engine.
///
/// `Ok(None)` means there is no data for the combination; `Err` means
/// data exists but could not be read.
pub trait FeatureSource: Send + Sync {
    fn features(&self, dataset: &str, region: &str, year: i32) -> GeoResult<Option<GeoFeatureSet>>;
}

impl<T: FeatureSource + ?Sized> FeatureSource for &T {
    fn features(&self, dataset: &str, region: &str, year: i32) -> GeoResult<Option<GeoFeatureSet>> {
        (**self).features(dataset, region, year)
    }
}

/// Configuration for the file-backed feature source.
#[derive(Debug, Clone)]
pub struct FeatureSourceConfig {
    /// Root of the vector archive tree.
    pub dataset_path: PathBuf,
}

impl Default for FeatureSourceConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("geofiles/"),
        }
    }
}

impl FeatureSourceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = std::env::var("DATASET_PATH") {
            config.dataset_path = PathBuf::from(val);
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err("dataset_path must not be empty".to_string());
        }
        Ok(())
    }
}

/// Reads GeoJSON files laid out as `<root>/<path template>`.
#[derive(Debug, Clone)]
pub struct FileFeatureSource {
    root: PathBuf,
    datasets: Vec<VectorDatasetSpec>,
}

impl FileFeatureSource {
    /// Source over the default vector datasets.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            datasets: default_vector_datasets(),
        }
    }

    pub fn from_config(config: &FeatureSourceConfig) -> Self {
        Self::new(config.dataset_path.clone())
    }

    /// Add or replace a dataset definition.
    pub fn with_dataset(mut self, spec: VectorDatasetSpec) -> Self {
        self.datasets.retain(|d| d.name != spec.name);
        self.datasets.push(spec);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the file for (dataset, region, year) would live, if the
    /// dataset and region are known.
    pub fn path_for(&self, dataset: &str, region: &str, year: i32) -> Option<PathBuf> {
        let spec = self.datasets.iter().find(|d| d.name == dataset)?;
        spec.relative_path(region, year).map(|p| self.root.join(p))
    }
}

impl FeatureSource for FileFeatureSource {
    fn features(&self, dataset: &str, region: &str, year: i32) -> GeoResult<Option<GeoFeatureSet>> {
        let Some(path) = self.path_for(dataset, region, year) else {
            debug!(dataset = dataset, region = region, "No vector dataset for combination");
            return Ok(None);
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Vector file not found");
                return Ok(None);
            }
            Err(e) => return Err(GeoError::Io(e)),
        };
        GeoFeatureSet::from_slice(&bytes)
            .map(Some)
            .map_err(|e| GeoError::decode(format!("{}: {}", path.display(), e)))
    }
}

/// Feature sets held in memory, keyed by (dataset, region, year).
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeatureSource {
    sets: HashMap<(String, String, i32), GeoFeatureSet>,
    broken: HashMap<(String, String, i32), String>,
}

impl InMemoryFeatureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: &str, region: &str, year: i32, set: GeoFeatureSet) {
        self.sets
            .insert((dataset.to_string(), region.to_string(), year), set);
    }

    pub fn with(mut self, dataset: &str, region: &str, year: i32, set: GeoFeatureSet) -> Self {
        self.insert(dataset, region, year, set);
        self
    }

    /// Make a combination report a read error.
    pub fn with_error(mut self, dataset: &str, region: &str, year: i32, reason: &str) -> Self {
        self.broken
            .insert((dataset.to_string(), region.to_string(), year), reason.to_string());
        self
    }
}

impl FeatureSource for InMemoryFeatureSource {
    fn features(&self, dataset: &str, region: &str, year: i32) -> GeoResult<Option<GeoFeatureSet>> {
        let key = (dataset.to_string(), region.to_string(), year);
        if let Some(reason) = self.broken.get(&key) {
            return Err(GeoError::decode(reason.clone()));
        }
        Ok(self.sets.get(&key).cloned())
    }
}
