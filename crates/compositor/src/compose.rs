//! Stacking cached layers into one composite raster.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use geo_common::{GeoError, GeoResult, Region};
use raster_cache::{GeoTransform, RasterCache, RasterLayer, SampleType};

use crate::geotiff::GeoTiffWriter;
use crate::interpolation::resample_bilinear;

/// One band of a composite, already at the composite's dimensions.
#[derive(Debug, Clone)]
pub struct Band {
    pub dataset: String,
    /// Sample type of the source layer.
    pub source_type: SampleType,
    /// Source (width, height) before resampling.
    pub source_size: (usize, usize),
    pub data: Vec<f32>,
}

impl Band {
    pub fn was_resampled(&self, width: usize, height: usize) -> bool {
        self.source_size != (width, height)
    }
}

/// Multi-band raster for one (region, year), bands in request order.
#[derive(Debug, Clone)]
pub struct Composite {
    pub region: Region,
    pub year: i32,
    pub width: usize,
    pub height: usize,
    pub sample_type: SampleType,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    pub bands: Vec<Band>,
}

/// Facts about a composite reported back to callers.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeSummary {
    pub region: String,
    pub year: i32,
    pub width: usize,
    pub height: usize,
    pub count: usize,
    pub dtype: SampleType,
    pub bands: Vec<String>,
}

impl Composite {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn summary(&self) -> CompositeSummary {
        CompositeSummary {
            region: self.region.id.to_string(),
            year: self.year,
            width: self.width,
            height: self.height,
            count: self.bands.len(),
            dtype: self.sample_type,
            bands: self.bands.iter().map(|b| b.dataset.clone()).collect(),
        }
    }

    fn writer(&self) -> GeoTiffWriter<'_> {
        self.bands.iter().fold(
            GeoTiffWriter::new(self.width, self.height, self.sample_type, self.transform)
                .nodata(self.nodata),
            |writer, band| writer.band(&band.data),
        )
    }

    /// Serialize as an in-memory GeoTIFF with one band per dataset.
    pub fn to_geotiff(&self) -> GeoResult<Bytes> {
        Ok(Bytes::from(self.writer().to_bytes()?))
    }

    /// Write the GeoTIFF to a file.
    pub fn write_geotiff(&self, path: &Path) -> GeoResult<()> {
        let file = std::fs::File::create(path)?;
        self.writer().write_to(std::io::BufWriter::new(file))
    }
}

/// Builds composites from a loaded cache.
pub struct Compositor<'a> {
    cache: &'a RasterCache,
}

impl<'a> Compositor<'a> {
    pub fn new(cache: &'a RasterCache) -> Self {
        Self { cache }
    }

    /// Compose the requested datasets for (region, year).
    ///
    /// Every band is bilinearly resampled up to the largest width and the
    /// largest height among the inputs. Fails without partial output if
    /// the region is unsupported or any layer is missing.
    pub fn compose<S: AsRef<str>>(
        &self,
        region: &str,
        year: i32,
        datasets: &[S],
    ) -> GeoResult<Composite> {
        let region = Region::resolve(region)?;
        if region != *self.cache.region() {
            return Err(GeoError::UnsupportedRegion(region.id.to_string()));
        }
        if datasets.is_empty() {
            return Err(GeoError::invalid_request("at least one dataset is required"));
        }

        let layers = datasets
            .iter()
            .map(|name| self.cache.require(name.as_ref(), year))
            .collect::<GeoResult<Vec<_>>>()?;

        let width = layers.iter().map(|l| l.width()).max().unwrap_or(0);
        let height = layers.iter().map(|l| l.height()).max().unwrap_or(0);
        let sample_type = SampleType::common(layers.iter().map(|l| l.sample_type()))
            .unwrap_or(SampleType::F32);
        let nodata = shared_nodata(&layers);
        let transform = output_transform(&layers, &region, width, height);

        let bands = layers
            .iter()
            .map(|layer| to_band(layer, width, height, sample_type))
            .collect::<Vec<_>>();

        info!(
            region = region.id,
            year = year,
            bands = bands.len(),
            width = width,
            height = height,
            dtype = %sample_type,
            "Composed multi-band raster"
        );

        Ok(Composite {
            region,
            year,
            width,
            height,
            sample_type,
            transform,
            nodata,
            bands,
        })
    }
}

fn to_band(layer: &RasterLayer, width: usize, height: usize, sample_type: SampleType) -> Band {
    let mut data = resample_bilinear(
        layer.data(),
        layer.width(),
        layer.height(),
        width,
        height,
        layer.nodata().map(|v| v as f32),
    );
    if layer.dimensions() != (width, height) {
        debug!(
            dataset = layer.dataset(),
            from = ?layer.dimensions(),
            to = ?(width, height),
            "Resampled band"
        );
    }
    if sample_type.is_integer() {
        let (lo, hi) = sample_type.range();
        for v in data.iter_mut() {
            *v = (*v as f64).round().clamp(lo, hi) as f32;
        }
    }
    Band {
        dataset: layer.dataset().to_string(),
        source_type: layer.sample_type(),
        source_size: layer.dimensions(),
        data,
    }
}

fn shared_nodata(layers: &[std::sync::Arc<RasterLayer>]) -> Option<f64> {
    let first = layers.first()?.nodata()?;
    layers
        .iter()
        .all(|l| l.nodata() == Some(first))
        .then_some(first)
}

fn output_transform(
    layers: &[std::sync::Arc<RasterLayer>],
    region: &Region,
    width: usize,
    height: usize,
) -> GeoTransform {
    layers
        .iter()
        .find(|l| l.dimensions() == (width, height) && l.transform().is_some())
        .or_else(|| layers.iter().find(|l| l.transform().is_some()))
        .and_then(|l| {
            l.transform()
                .map(|t| t.rescaled(l.dimensions(), (width, height)))
        })
        .unwrap_or_else(|| GeoTransform::from_bbox(&region.bbox, width, height))
}
