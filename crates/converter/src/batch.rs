//! Per-year artifact batches over a dataset's time series.
//!
//! A failure for one (year, format) is recorded in the report and the
//! batch moves on.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use compositor::Compositor;
use geo_common::{GeoError, GeoResult};
use raster_cache::{LayerLookup, RasterCache};

use crate::convert::FormatConverter;

/// Artifact kinds written by [`FormatConverter::export_time_series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    GeoTiff,
    TileArchive,
    VectorPolygons,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::GeoTiff,
        ExportFormat::TileArchive,
        ExportFormat::VectorPolygons,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::GeoTiff => "tif",
            ExportFormat::TileArchive => "mbtiles",
            ExportFormat::VectorPolygons => "geojson",
        }
    }

    /// Parse `tif`, `mbtiles` or `geojson` (and their long names).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tif" | "tiff" | "geotiff" => Some(ExportFormat::GeoTiff),
            "mbtiles" | "tiles" => Some(ExportFormat::TileArchive),
            "geojson" | "vector" | "polygons" => Some(ExportFormat::VectorPolygons),
            _ => None,
        }
    }
}

/// Result of one unit of work.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    Written { path: PathBuf },
    Failed { code: String, error: String },
}

impl ArtifactOutcome {
    fn failed(err: &GeoError) -> Self {
        ArtifactOutcome::Failed {
            code: err.code().to_string(),
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportItem {
    pub year: i32,
    pub format: ExportFormat,
    #[serde(flatten)]
    pub outcome: ArtifactOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub dataset: String,
    pub region: String,
    pub items: Vec<ExportItem>,
    /// Years in the range with no layer in the cache.
    pub missing_years: Vec<i32>,
}

impl ExportReport {
    pub fn written(&self) -> impl Iterator<Item = &ExportItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ArtifactOutcome::Written { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExportItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ArtifactOutcome::Failed { .. }))
    }
}

/// One year's in-memory tile archive, or the reason it could not be built.
#[derive(Debug, Clone, Serialize)]
pub struct TileItem {
    pub year: i32,
    #[serde(skip)]
    pub archive: Vec<u8>,
    pub size: usize,
    pub error: Option<String>,
}

impl FormatConverter {
    /// Write the requested artifacts for each year of `years` into `out_dir`
    /// as `<dataset>_<year>.<ext>`.
    pub fn export_time_series(
        &self,
        cache: &RasterCache,
        dataset: &str,
        years: RangeInclusive<i32>,
        formats: &[ExportFormat],
        out_dir: &Path,
    ) -> GeoResult<ExportReport> {
        if cache.spec(dataset).is_none() {
            return Err(GeoError::UnsupportedDataset(dataset.to_string()));
        }
        if formats.is_empty() {
            return Err(GeoError::invalid_request("at least one export format is required"));
        }
        fs::create_dir_all(out_dir)?;

        let region = cache.region();
        let mut report = ExportReport {
            dataset: dataset.to_string(),
            region: region.name.to_string(),
            items: Vec::new(),
            missing_years: Vec::new(),
        };

        for year in years {
            match cache.lookup(dataset, year) {
                LayerLookup::Absent => {
                    warn!(dataset = dataset, year = year, "Skipping year with no layer");
                    report.missing_years.push(year);
                    continue;
                }
                LayerLookup::Failed(reason) => {
                    let err = GeoError::decode(reason);
                    for format in formats {
                        report.items.push(ExportItem {
                            year,
                            format: *format,
                            outcome: ArtifactOutcome::failed(&err),
                        });
                    }
                    continue;
                }
                LayerLookup::Present(_) => {}
            }

            let stem = format!("{}_{}", dataset, year);
            let geotiff = Compositor::new(cache)
                .compose(region.id, year, &[dataset])
                .and_then(|c| c.to_geotiff());
            let geotiff = match geotiff {
                Ok(bytes) => bytes,
                Err(e) => {
                    for format in formats {
                        report.items.push(ExportItem {
                            year,
                            format: *format,
                            outcome: ArtifactOutcome::failed(&e),
                        });
                    }
                    continue;
                }
            };

            for format in formats {
                let result = match format {
                    ExportFormat::GeoTiff => {
                        let path = out_dir.join(format!("{}.tif", stem));
                        fs::write(&path, &geotiff).map(|_| path).map_err(GeoError::from)
                    }
                    ExportFormat::TileArchive => self.to_tile_archive(&geotiff).and_then(|archive| {
                        let path = out_dir.join(format!("{}.mbtiles", stem));
                        fs::write(&path, archive)?;
                        Ok(path)
                    }),
                    ExportFormat::VectorPolygons => self.polygons_from_bytes(&geotiff, &stem, out_dir),
                };
                let outcome = match result {
                    Ok(path) => ArtifactOutcome::Written { path },
                    Err(e) => {
                        warn!(dataset = dataset, year = year, format = ?format, error = %e, "Export failed");
                        ArtifactOutcome::failed(&e)
                    }
                };
                report.items.push(ExportItem {
                    year,
                    format: *format,
                    outcome,
                });
            }
        }

        info!(
            dataset = dataset,
            written = report.written().count(),
            failed = report.failed().count(),
            missing = report.missing_years.len(),
            "Exported time series"
        );
        Ok(report)
    }

    /// Polygonize in-memory GeoTIFF bytes by staging them in a scratch file
    /// named after `stem`.
    fn polygons_from_bytes(&self, geotiff: &[u8], stem: &str, out_dir: &Path) -> GeoResult<PathBuf> {
        let scratch = self.scratch("staging-")?;
        let staged = scratch.path().join(format!("{}.tif", stem));
        fs::write(&staged, geotiff)?;
        self.to_vector_polygons(&staged, out_dir)
    }

    /// In-memory tile archives for every cached year of `dataset`, optionally
    /// limited to `years`.
    pub fn tiles_for_timeline(
        &self,
        cache: &RasterCache,
        dataset: &str,
        years: Option<RangeInclusive<i32>>,
    ) -> GeoResult<Vec<TileItem>> {
        if cache.spec(dataset).is_none() {
            return Err(GeoError::UnsupportedDataset(dataset.to_string()));
        }
        let region = cache.region();
        let items = cache
            .years(dataset)
            .into_iter()
            .filter(|y| years.as_ref().map_or(true, |r| r.contains(y)))
            .map(|year| {
                let result = Compositor::new(cache)
                    .compose(region.id, year, &[dataset])
                    .and_then(|c| c.to_geotiff())
                    .and_then(|bytes| self.to_tile_archive(&bytes));
                match result {
                    Ok(archive) => TileItem {
                        year,
                        size: archive.len(),
                        archive,
                        error: None,
                    },
                    Err(e) => TileItem {
                        year,
                        archive: Vec::new(),
                        size: 0,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("TIF"), Some(ExportFormat::GeoTiff));
        assert_eq!(ExportFormat::parse("mbtiles"), Some(ExportFormat::TileArchive));
        assert_eq!(ExportFormat::parse("geojson"), Some(ExportFormat::VectorPolygons));
        assert_eq!(ExportFormat::parse("shp"), None);
    }

    #[test]
    fn test_outcome_serializes_with_status() {
        let item = ExportItem {
            year: 2015,
            format: ExportFormat::TileArchive,
            outcome: ArtifactOutcome::Failed {
                code: "ExternalToolFailure".to_string(),
                error: "Error in rio mbtiles: boom".to_string(),
            },
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["format"], "tile_archive");
        assert_eq!(json["error"], "Error in rio mbtiles: boom");
    }
}
