//! Time-series rendering for yearly raster layers.
//!
//! Implements:
//! - Sequential color maps with per-dataset normalization policies
//! - Frame layout (title, map, border, colorbar)
//! - Year-ordered timelines from the cache or from files
//! - Looping GIF assembly on one shared color scale
//! - Single-year PNG stills

pub mod animation;
pub mod config;
pub mod frame;
pub mod gradient;
pub mod timeline;

pub use animation::{global_range, AnimationRenderer, RenderedAnimation, RenderedStill, SkippedFrame};
pub use config::RenderConfig;
pub use frame::{FrameLayout, FrameRenderer};
pub use gradient::{Color, ColorMap, Normalization, ValueRange};
pub use timeline::{FrameData, TimeSeriesFrame, Timeline};
