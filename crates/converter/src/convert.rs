//! Tile archive and vector polygon conversion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::{info, warn};

use geo_common::{GeoError, GeoResult};

use crate::config::ConverterConfig;
use crate::tool::{ToolCommand, ToolVars};

/// Runs the external raster utilities configured in [`ConverterConfig`].
#[derive(Debug, Clone)]
pub struct FormatConverter {
    config: ConverterConfig,
}

impl FormatConverter {
    pub fn new(config: ConverterConfig) -> GeoResult<Self> {
        config.validate().map_err(GeoError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// A fresh, uniquely named directory for one invocation. Removed with
    /// everything in it when dropped.
    pub(crate) fn scratch(&self, prefix: &str) -> GeoResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match &self.config.scratch_dir {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn vars<'a>(&'a self, input: &'a Path, output: &'a Path) -> ToolVars<'a> {
        ToolVars {
            input,
            output,
            zoom: &self.config.zoom_levels,
            format: &self.config.tile_format,
            tolerance: self.config.simplify_tolerance,
        }
    }

    /// Convert GeoTIFF bytes into a tile archive held in memory.
    ///
    /// The input and output files live in a per-call scratch directory
    /// that is removed on every exit path.
    pub fn to_tile_archive(&self, raster: &[u8]) -> GeoResult<Vec<u8>> {
        let scratch = self.scratch("tiles-")?;
        let input = scratch.path().join("input.tif");
        let output = scratch.path().join("output.mbtiles");
        fs::write(&input, raster)?;

        let tool = &self.config.tiles_command;
        tool.run(&self.vars(&input, &output))?;
        let archive = read_output(tool, &output)?;

        info!(
            input_bytes = raster.len(),
            archive_bytes = archive.len(),
            zoom = %self.config.zoom_levels,
            "Built tile archive"
        );
        Ok(archive)
    }

    /// Boundary form of [`to_tile_archive`](Self::to_tile_archive): the
    /// archive bytes, or empty bytes and the error message.
    pub fn tile_archive_or_error(&self, raster: &[u8]) -> (Vec<u8>, Option<String>) {
        match self.to_tile_archive(raster) {
            Ok(bytes) => (bytes, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        }
    }

    /// Polygonize a raster file into `out_dir/<stem>.geojson`, tagging each
    /// polygon with its cell value in `DN` and simplifying the result.
    ///
    /// Both tool outputs are staged in a per-call scratch directory and
    /// the result is moved into `out_dir` only when complete. If
    /// simplification fails, the unsimplified polygons are kept as
    /// `out_dir/<stem>.unsimplified.geojson`.
    pub fn to_vector_polygons(&self, raster: &Path, out_dir: &Path) -> GeoResult<PathBuf> {
        if !raster.is_file() {
            return Err(GeoError::invalid_request(format!(
                "raster {} not found",
                raster.display()
            )));
        }
        let stem = raster
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| GeoError::invalid_request("raster path has no file name"))?;

        fs::create_dir_all(out_dir)?;
        let scratch = self.scratch("polygons-")?;
        let intermediate = scratch.path().join("polygons.geojson");
        let simplified = scratch.path().join("simplified.geojson");
        let output = out_dir.join(format!("{}.geojson", stem));

        let polygonize = &self.config.polygonize_command;
        polygonize.run(&self.vars(raster, &intermediate))?;
        if !intermediate.exists() {
            return Err(missing_output(polygonize, &intermediate));
        }

        let simplify = &self.config.simplify_command;
        if let Err(e) = simplify.run(&self.vars(&intermediate, &simplified)) {
            let kept = out_dir.join(format!("{}.unsimplified.geojson", stem));
            publish(&intermediate, &kept)?;
            warn!(kept = %kept.display(), "Keeping unsimplified polygons after failure");
            return Err(e);
        }
        if !simplified.exists() {
            return Err(missing_output(simplify, &simplified));
        }

        publish(&simplified, &output)?;
        info!(output = %output.display(), tolerance = self.config.simplify_tolerance, "Wrote vector polygons");
        Ok(output)
    }
}

/// Copy `staged` next to `dest` under a unique name, then rename it over
/// `dest`. Readers of `dest` never see a partial file.
fn publish(staged: &Path, dest: &Path) -> GeoResult<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    io::copy(&mut fs::File::open(staged)?, file.as_file_mut())?;
    file.persist(dest).map_err(|e| GeoError::Io(e.error))?;
    Ok(())
}

fn read_output(tool: &ToolCommand, path: &Path) -> GeoResult<Vec<u8>> {
    if !path.exists() {
        return Err(missing_output(tool, path));
    }
    Ok(fs::read(path)?)
}

fn missing_output(tool: &ToolCommand, path: &Path) -> GeoError {
    GeoError::MissingOutput {
        tool: tool.name(),
        path: path.display().to_string(),
    }
}
