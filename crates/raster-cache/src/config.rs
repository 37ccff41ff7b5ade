//! Configuration for the raster cache.

use std::path::PathBuf;

use serde::Serialize;

/// Configuration for loading the raster cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheConfig {
    /// Root directory holding one subdirectory per dataset.
    pub data_dir: PathBuf,

    /// Region whose layers are loaded.
    pub region: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../data"),
            region: "assaba".to_string(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RASTER_DATA_DIR") {
            config.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("RASTER_REGION") {
            config.region = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }

        if self.region.trim().is_empty() {
            return Err("region must not be empty".to_string());
        }

        Ok(())
    }
}
