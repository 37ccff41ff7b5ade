//! Conversion of rasters into tile archives and simplified vector polygons.
//!
//! All heavy lifting is done by external raster utilities run as
//! subprocesses over per-invocation temporary files.

pub mod batch;
pub mod config;
pub mod convert;
pub mod tool;

pub use batch::{ArtifactOutcome, ExportFormat, ExportItem, ExportReport, TileItem};
pub use config::ConverterConfig;
pub use convert::FormatConverter;
pub use tool::{ToolCommand, ToolVars};
