//! Multi-band compositing of cached raster layers.
//!
//! Layers for one (region, year) are resampled to the largest width and
//! height among the inputs, stacked in request order and serialized as a
//! geo-referenced multi-band GeoTIFF.

pub mod compose;
pub mod geotiff;
pub mod interpolation;

pub use compose::{Band, Composite, CompositeSummary, Compositor};
pub use geotiff::{inspect_geotiff, GeoTiffInfo, GeoTiffWriter};
pub use interpolation::resample_bilinear;
