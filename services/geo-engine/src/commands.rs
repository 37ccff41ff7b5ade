//! Subcommand implementations.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use analysis::{FeatureSourceConfig, FileFeatureSource, StatisticsEngine};
use compositor::Compositor;
use converter::{ConverterConfig, ExportFormat, FormatConverter};
use geo_common::{default_raster_datasets, DatasetKind, GeoError, Region};
use raster_cache::{CacheConfig, RasterCache};
use renderer::{AnimationRenderer, RenderConfig, Timeline};

use crate::Command;

/// Paths taken from flags, falling back to each component's env config.
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_cache(settings: &Settings) -> Result<RasterCache> {
    let mut config = CacheConfig::from_env();
    if let Some(dir) = &settings.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;
    let region = Region::resolve(&config.region)?;

    let (cache, report) = RasterCache::load(&config.data_dir, region, default_raster_datasets()?);
    if !report.failures.is_empty() {
        warn!(failures = report.failures.len(), "Some rasters could not be loaded");
    }
    info!(
        data_dir = %config.data_dir.display(),
        layers = report.loaded,
        "Raster cache ready"
    );
    Ok(cache)
}

fn feature_engine(settings: &Settings) -> Result<StatisticsEngine<FileFeatureSource>> {
    let mut config = FeatureSourceConfig::from_env();
    if let Some(path) = &settings.dataset_path {
        config.dataset_path = path.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(StatisticsEngine::new(FileFeatureSource::from_config(&config)))
}

fn converter() -> Result<FormatConverter> {
    Ok(FormatConverter::new(ConverterConfig::from_env()?)?)
}

pub fn run(settings: &Settings, command: Command) -> Result<ExitCode> {
    match command {
        Command::Compose {
            region,
            year,
            datasets,
            output,
        } => {
            let cache = load_cache(settings)?;
            let composite = Compositor::new(&cache).compose(&region, year, &datasets)?;
            composite.write_geotiff(&output)?;
            print_json(&serde_json::json!({
                "output": output,
                "composite": composite.summary(),
            }))?;
        }

        Command::Animate {
            dataset,
            from,
            to,
            delay_ms,
            output,
        } => {
            let cache = load_cache(settings)?;
            let years = match (from, to) {
                (Some(from), Some(to)) => Some(from..=to),
                (None, None) => None,
                _ => bail!("--from and --to must be given together"),
            };
            let timeline = Timeline::from_cache(&cache, &dataset, years)?;
            let kind = cache
                .spec(&dataset)
                .map(|s| s.kind)
                .unwrap_or_else(|| DatasetKind::from_name(&dataset));

            let mut config = RenderConfig::from_env();
            if let Some(delay) = delay_ms {
                config.frame_delay_ms = delay;
            }
            let animation = AnimationRenderer::new(config)?.render(&timeline, kind)?;
            fs::write(&output, &animation.bytes)
                .with_context(|| format!("writing {}", output.display()))?;
            print_json(&serde_json::json!({
                "output": output,
                "animation": animation,
            }))?;
        }

        Command::Still {
            dataset,
            year,
            output,
        } => {
            let cache = load_cache(settings)?;
            let timeline = Timeline::from_cache(&cache, &dataset, Some(year..=year))?;
            let frame = timeline
                .frames()
                .first()
                .ok_or_else(|| GeoError::missing_layer(dataset.as_str(), year))?;
            let kind = cache
                .spec(&dataset)
                .map(|s| s.kind)
                .unwrap_or_else(|| DatasetKind::from_name(&dataset));

            let still = AnimationRenderer::new(RenderConfig::from_env())?.render_still(frame, kind)?;
            fs::write(&output, &still.bytes)
                .with_context(|| format!("writing {}", output.display()))?;
            print_json(&serde_json::json!({
                "output": output,
                "still": still,
            }))?;
        }

        Command::Tiles { input, output } => {
            let raster = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let (archive, error) = converter()?.tile_archive_or_error(&raster);
            if let Some(error) = error {
                print_json(&serde_json::json!({ "output": null, "error": error }))?;
                return Ok(ExitCode::FAILURE);
            }
            fs::write(&output, &archive)?;
            print_json(&serde_json::json!({ "output": output, "bytes": archive.len() }))?;
        }

        Command::Export {
            dataset,
            from,
            to,
            formats,
            out_dir,
        } => {
            let formats = formats
                .iter()
                .map(|f| ExportFormat::parse(f).with_context(|| format!("unknown export format '{}'", f)))
                .collect::<Result<Vec<_>>>()?;
            let cache = load_cache(settings)?;
            let report = converter()?.export_time_series(&cache, &dataset, from..=to, &formats, &out_dir)?;
            print_json(&report)?;
        }

        Command::Stats {
            dataset,
            region,
            year,
        } => {
            let engine = feature_engine(settings)?;
            match engine.describe(&dataset, &region, year)? {
                Some(stats) => print_json(&stats)?,
                None => {
                    print_json(&serde_json::json!({
                        "error": format!("no {} features for {} in {}", dataset, region, year)
                    }))?;
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Trend {
            dataset,
            region,
            years,
        } => {
            let engine = feature_engine(settings)?;
            print_json(&engine.temporal_trend(&dataset, &region, &years))?;
        }

        Command::Compare {
            dataset,
            regions,
            year,
        } => {
            let engine = feature_engine(settings)?;
            print_json(&engine.compare_regions(&dataset, &regions, year))?;
        }

        Command::Correlate {
            region,
            years,
            datasets,
        } => {
            let [first, second] = datasets.as_slice() else {
                bail!("--datasets takes exactly two names");
            };
            let engine = feature_engine(settings)?;
            print_json(&engine.correlate_datasets(&region, &years, (first.as_str(), second.as_str())))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
