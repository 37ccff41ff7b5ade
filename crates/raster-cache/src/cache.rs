//! The raster cache and its one-time loader.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use geo_common::{DatasetSpec, GeoError, GeoResult, Region};

use crate::decode::read_layer;
use crate::layer::RasterLayer;

/// Outcome of looking up one (dataset, year).
#[derive(Debug, Clone)]
pub enum LayerLookup {
    Present(Arc<RasterLayer>),
    /// No file for this year was found on disk.
    Absent,
    /// A file was found but could not be decoded.
    Failed(String),
}

/// One file that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub dataset: String,
    pub year: Option<i32>,
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a cache load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub failures: Vec<LoadFailure>,
    /// Configured datasets whose directory does not exist.
    pub missing_directories: Vec<String>,
}

/// Process-wide map of dataset name -> year -> layer.
///
/// Entries are written once while building and never replaced.
#[derive(Debug)]
pub struct RasterCache {
    region: Region,
    specs: Vec<DatasetSpec>,
    layers: HashMap<String, BTreeMap<i32, Arc<RasterLayer>>>,
    failures: HashMap<(String, i32), String>,
}

impl RasterCache {
    /// Start building a cache by hand.
    pub fn builder(region: Region) -> RasterCacheBuilder {
        RasterCacheBuilder {
            region,
            specs: Vec::new(),
            layers: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// Scan `root` for every dataset in `specs` and decode matching files.
    ///
    /// Decode failures are logged and recorded in the report; they never
    /// abort the load.
    pub fn load(root: &Path, region: Region, specs: Vec<DatasetSpec>) -> (Self, LoadReport) {
        let mut builder = Self::builder(region);
        let mut report = LoadReport::default();

        for spec in specs {
            builder = builder.with_dataset(spec.clone());
            let dir = spec.dir_under(root);
            if !dir.is_dir() {
                warn!(dataset = %spec.name, dir = %dir.display(), "Dataset directory not found");
                report.missing_directories.push(spec.name.clone());
                continue;
            }

            let mut candidates = Vec::new();
            for entry in WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(dataset = %spec.name, error = %e, "Failed to read directory entry");
                        report.failures.push(LoadFailure {
                            dataset: spec.name.clone(),
                            year: None,
                            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone()),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(name) = entry.file_name().to_str() else {
                    continue;
                };
                match spec.pattern.year_of(name, &region) {
                    Some(year) => candidates.push((year, entry.into_path())),
                    None => debug!(dataset = %spec.name, file = name, "Skipping non-matching file"),
                }
            }

            let decoded: Vec<(i32, PathBuf, GeoResult<RasterLayer>)> = candidates
                .into_par_iter()
                .map(|(year, path)| {
                    let layer = read_layer(&path, &spec.name, year);
                    (year, path, layer)
                })
                .collect();

            for (year, path, result) in decoded {
                match result {
                    Ok(layer) => {
                        report.loaded += 1;
                        builder = builder.insert_layer(layer);
                    }
                    Err(e) => {
                        warn!(
                            dataset = %spec.name,
                            year = year,
                            path = %path.display(),
                            error = %e,
                            "Failed to load raster, skipping"
                        );
                        builder = builder.record_failure(&spec.name, year, e.to_string());
                        report.failures.push(LoadFailure {
                            dataset: spec.name.clone(),
                            year: Some(year),
                            path,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let cache = builder.build();
        info!(
            region = %cache.region,
            layers = report.loaded,
            failures = report.failures.len(),
            datasets = cache.specs.len(),
            "Raster cache loaded"
        );
        (cache, report)
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Layer for (dataset, year), if loaded.
    pub fn get(&self, dataset: &str, year: i32) -> Option<Arc<RasterLayer>> {
        self.layers.get(dataset)?.get(&year).cloned()
    }

    /// Three-way lookup distinguishing absent from failed entries.
    pub fn lookup(&self, dataset: &str, year: i32) -> LayerLookup {
        if let Some(layer) = self.get(dataset, year) {
            return LayerLookup::Present(layer);
        }
        match self.failures.get(&(dataset.to_string(), year)) {
            Some(reason) => LayerLookup::Failed(reason.clone()),
            None => LayerLookup::Absent,
        }
    }

    /// Like [`get`](Self::get) but with typed errors for unknown datasets
    /// and missing years.
    pub fn require(&self, dataset: &str, year: i32) -> GeoResult<Arc<RasterLayer>> {
        if self.spec(dataset).is_none() {
            return Err(GeoError::UnsupportedDataset(dataset.to_string()));
        }
        self.get(dataset, year)
            .ok_or_else(|| GeoError::missing_layer(dataset, year))
    }

    /// Spec of a configured dataset.
    pub fn spec(&self, dataset: &str) -> Option<&DatasetSpec> {
        self.specs.iter().find(|s| s.name == dataset)
    }

    /// Configured dataset names, in configuration order.
    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Loaded years for a dataset, ascending.
    pub fn years(&self, dataset: &str) -> Vec<i32> {
        self.layers
            .get(dataset)
            .map(|years| years.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of loaded layers.
    pub fn layer_count(&self) -> usize {
        self.layers.values().map(BTreeMap::len).sum()
    }
}

/// Accumulates layers before freezing them into a [`RasterCache`].
#[derive(Debug)]
pub struct RasterCacheBuilder {
    region: Region,
    specs: Vec<DatasetSpec>,
    layers: HashMap<String, BTreeMap<i32, Arc<RasterLayer>>>,
    failures: HashMap<(String, i32), String>,
}

impl RasterCacheBuilder {
    /// Register a dataset (no-op if already registered).
    pub fn with_dataset(mut self, spec: DatasetSpec) -> Self {
        if !self.specs.iter().any(|s| s.name == spec.name) {
            self.specs.push(spec);
        }
        self
    }

    /// Add a layer, registering its dataset by name if needed.
    ///
    /// The first layer inserted for a (dataset, year) wins.
    pub fn insert_layer(mut self, layer: RasterLayer) -> Self {
        if !self.specs.iter().any(|s| s.name == layer.dataset()) {
            self.specs.push(DatasetSpec::named(layer.dataset()));
        }
        self.layers
            .entry(layer.dataset().to_string())
            .or_default()
            .entry(layer.year())
            .or_insert_with(|| Arc::new(layer));
        self
    }

    pub fn record_failure(mut self, dataset: &str, year: i32, reason: impl Into<String>) -> Self {
        self.failures
            .insert((dataset.to_string(), year), reason.into());
        self
    }

    pub fn build(self) -> RasterCache {
        RasterCache {
            region: self.region,
            specs: self.specs,
            layers: self.layers,
            failures: self.failures,
        }
    }
}
