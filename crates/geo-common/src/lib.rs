//! Common types shared across the regional raster engine crates.

pub mod bbox;
pub mod dataset;
pub mod error;
pub mod region;

pub use bbox::BoundingBox;
pub use dataset::{
    default_raster_datasets, default_vector_datasets, lookup_country, DatasetKind, DatasetSpec,
    FilenamePattern, VectorDatasetSpec, COUNTRY_CODES,
};
pub use error::{GeoError, GeoResult};
pub use region::{Region, ASSABA};
