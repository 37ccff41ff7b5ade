//! Write-once in-memory cache of yearly single-band raster layers.
//!
//! The cache is populated by a single blocking scan of the data root at
//! startup and is read-only afterwards, so it can be shared behind an
//! `Arc` by any number of request handlers without locking.

pub mod cache;
pub mod config;
pub mod decode;
pub mod layer;

pub use cache::{LayerLookup, LoadFailure, LoadReport, RasterCache, RasterCacheBuilder};
pub use config::CacheConfig;
pub use decode::{read_layer, read_layer_from_bytes};
pub use layer::{GeoTransform, LayerSummary, RasterLayer, SampleType};
