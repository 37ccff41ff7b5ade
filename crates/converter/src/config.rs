//! Configuration for format conversion.

use std::path::PathBuf;

use geo_common::{GeoError, GeoResult};

use crate::tool::ToolCommand;

pub const DEFAULT_TILES_COMMAND: &str =
    "rio mbtiles {input} {output} --zoom-levels {zoom} --format {format}";
pub const DEFAULT_POLYGONIZE_COMMAND: &str =
    "gdal_polygonize.py -mask {input} -f GeoJSON {input} {output} DN";
pub const DEFAULT_SIMPLIFY_COMMAND: &str =
    "ogr2ogr -f GeoJSON -simplify {tolerance} {output} {input}";

/// Tile encodings accepted by the tiling tool.
const TILE_FORMATS: &[&str] = &["PNG", "JPEG", "WEBP"];

/// Format converter configuration.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Zoom range passed to the tiling tool, `min..max`.
    pub zoom_levels: String,
    pub tile_format: String,
    /// Simplification tolerance in degrees.
    pub simplify_tolerance: f64,
    /// Parent directory for per-invocation temporary directories.
    /// `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub tiles_command: ToolCommand,
    pub polygonize_command: ToolCommand,
    pub simplify_command: ToolCommand,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            zoom_levels: "0..8".to_string(),
            tile_format: "PNG".to_string(),
            simplify_tolerance: 0.001,
            scratch_dir: None,
            tiles_command: ToolCommand::split(DEFAULT_TILES_COMMAND),
            polygonize_command: ToolCommand::split(DEFAULT_POLYGONIZE_COMMAND),
            simplify_command: ToolCommand::split(DEFAULT_SIMPLIFY_COMMAND),
        }
    }
}

impl ConverterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> GeoResult<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TILE_ZOOM_LEVELS") {
            config.zoom_levels = val;
        }

        if let Ok(val) = std::env::var("TILE_FORMAT") {
            config.tile_format = val.to_uppercase();
        }

        if let Ok(val) = std::env::var("SIMPLIFY_TOLERANCE") {
            config.simplify_tolerance = val
                .parse()
                .map_err(|_| GeoError::Config(format!("invalid SIMPLIFY_TOLERANCE: {}", val)))?;
        }

        if let Ok(val) = std::env::var("SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("TILES_COMMAND") {
            config.tiles_command = ToolCommand::parse(&val)?;
        }
        if let Ok(val) = std::env::var("POLYGONIZE_COMMAND") {
            config.polygonize_command = ToolCommand::parse(&val)?;
        }
        if let Ok(val) = std::env::var("SIMPLIFY_COMMAND") {
            config.simplify_command = ToolCommand::parse(&val)?;
        }

        Ok(config)
    }

    /// Parsed zoom range.
    pub fn zoom_range(&self) -> Option<(u8, u8)> {
        let (min, max) = self.zoom_levels.split_once("..")?;
        let min: u8 = min.trim().parse().ok()?;
        let max: u8 = max.trim().parse().ok()?;
        Some((min, max))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self.zoom_range() {
            Some((min, max)) if min <= max && max <= 24 => {}
            _ => {
                return Err(format!(
                    "zoom_levels must be 'min..max' with min <= max <= 24, got '{}'",
                    self.zoom_levels
                ))
            }
        }

        if !TILE_FORMATS.contains(&self.tile_format.as_str()) {
            return Err(format!(
                "tile_format must be one of {:?}, got '{}'",
                TILE_FORMATS, self.tile_format
            ));
        }

        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err("simplify_tolerance must be a non-negative number".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ConverterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zoom_range(), Some((0, 8)));
        assert_eq!(config.tiles_command.name(), "rio mbtiles");
        assert_eq!(config.polygonize_command.name(), "gdal_polygonize.py");
        assert_eq!(config.simplify_command.name(), "ogr2ogr");
    }

    #[test]
    fn test_validate_zoom() {
        let config = ConverterConfig {
            zoom_levels: "8..2".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConverterConfig {
            zoom_levels: "zero".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_format_and_tolerance() {
        let config = ConverterConfig {
            tile_format: "GIF".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConverterConfig {
            simplify_tolerance: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
