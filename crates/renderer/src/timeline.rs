//! Year-ordered frame sequences for one dataset and region.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use geo_common::{GeoError, GeoResult};
use raster_cache::{read_layer, LayerLookup, LayerSummary, RasterCache, RasterLayer};

/// Payload of a frame.
#[derive(Debug, Clone)]
pub enum FrameData {
    Raster(Arc<RasterLayer>),
    /// The source existed but could not be read.
    Unreadable(String),
}

/// One time step of a timeline.
#[derive(Debug, Clone)]
pub struct TimeSeriesFrame {
    pub year: i32,
    pub region: String,
    pub dataset: String,
    pub data: FrameData,
    /// Min/max/mean of the valid cells, if any.
    pub summary: Option<LayerSummary>,
}

impl TimeSeriesFrame {
    pub fn from_layer(region: &str, layer: Arc<RasterLayer>) -> Self {
        Self {
            year: layer.year(),
            region: region.to_string(),
            dataset: layer.dataset().to_string(),
            summary: layer.summary(),
            data: FrameData::Raster(layer),
        }
    }

    pub fn unreadable(year: i32, region: &str, dataset: &str, reason: impl Into<String>) -> Self {
        Self {
            year,
            region: region.to_string(),
            dataset: dataset.to_string(),
            data: FrameData::Unreadable(reason.into()),
            summary: None,
        }
    }

    pub fn layer(&self) -> Option<&RasterLayer> {
        match &self.data {
            FrameData::Raster(layer) => Some(layer),
            FrameData::Unreadable(_) => None,
        }
    }
}

/// Frames for one dataset/region, kept in ascending year order.
///
/// Duplicate years are kept in insertion order.
#[derive(Debug, Clone)]
pub struct Timeline {
    dataset: String,
    region: String,
    label: Option<String>,
    frames: Vec<TimeSeriesFrame>,
}

impl Timeline {
    pub fn new(dataset: &str, region: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            region: region.to_string(),
            label: None,
            frames: Vec::new(),
        }
    }

    /// Display label used in frame titles.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Insert a frame at its year position.
    pub fn push(&mut self, frame: TimeSeriesFrame) {
        let idx = self.frames.partition_point(|f| f.year <= frame.year);
        self.frames.insert(idx, frame);
    }

    /// Build from cached layers. With `years`, only that range is
    /// considered; cached decode failures become unreadable frames.
    pub fn from_cache(
        cache: &RasterCache,
        dataset: &str,
        years: Option<RangeInclusive<i32>>,
    ) -> GeoResult<Self> {
        let spec = cache
            .spec(dataset)
            .ok_or_else(|| GeoError::UnsupportedDataset(dataset.to_string()))?;
        let region = cache.region().name;
        let mut timeline = Self::new(dataset, region).with_label(spec.label.clone());

        let years: Vec<i32> = match years {
            Some(range) => range.collect(),
            None => cache.years(dataset),
        };
        for year in years {
            match cache.lookup(dataset, year) {
                LayerLookup::Present(layer) => {
                    timeline.push(TimeSeriesFrame::from_layer(region, layer))
                }
                LayerLookup::Failed(reason) => {
                    timeline.push(TimeSeriesFrame::unreadable(year, region, dataset, reason))
                }
                LayerLookup::Absent => debug!(dataset = dataset, year = year, "No layer for year"),
            }
        }
        Ok(timeline)
    }

    /// Build by decoding one file per year. Files that fail to decode
    /// become unreadable frames.
    pub fn from_files<I>(dataset: &str, region: &str, files: I) -> Self
    where
        I: IntoIterator<Item = (i32, PathBuf)>,
    {
        let mut timeline = Self::new(dataset, region);
        for (year, path) in files {
            match read_layer(&path, dataset, year) {
                Ok(layer) => timeline.push(TimeSeriesFrame::from_layer(region, Arc::new(layer))),
                Err(e) => {
                    warn!(dataset = dataset, year = year, path = %path.display(), error = %e, "Unreadable frame");
                    timeline.push(TimeSeriesFrame::unreadable(year, region, dataset, e.to_string()));
                }
            }
        }
        timeline
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn frames(&self) -> &[TimeSeriesFrame] {
        &self.frames
    }

    /// Frames with a readable raster, in year order.
    pub fn readable(&self) -> impl Iterator<Item = (&TimeSeriesFrame, &RasterLayer)> {
        self.frames.iter().filter_map(|f| f.layer().map(|l| (f, l)))
    }

    pub fn years(&self) -> Vec<i32> {
        self.frames.iter().map(|f| f.year).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
