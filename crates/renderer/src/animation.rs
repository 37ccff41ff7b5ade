//! Looping animations over a timeline, and single-year stills.

use bytes::Bytes;
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::PngEncoder;
use image::{ColorType, Delay, Frame, ImageEncoder, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use geo_common::{DatasetKind, GeoError, GeoResult};
use raster_cache::RasterLayer;

use crate::config::RenderConfig;
use crate::frame::FrameRenderer;
use crate::gradient::{ColorMap, Normalization, ValueRange};
use crate::timeline::{FrameData, TimeSeriesFrame, Timeline};

/// Result of rendering a timeline.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedAnimation {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub frame_count: usize,
    /// Years of the rendered frames, ascending.
    pub years: Vec<i32>,
    /// Frames left out because their raster was unreadable.
    pub skipped: Vec<SkippedFrame>,
    pub range: ValueRange,
    /// True when no valid cells existed and [0, 100] was substituted.
    pub range_defaulted: bool,
    pub normalization: Normalization,
    pub colormap: ColorMap,
}

/// One year rendered as a static PNG.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedStill {
    #[serde(skip)]
    pub bytes: Bytes,
    pub year: i32,
    pub region: String,
    pub dataset: String,
    pub width: u32,
    pub height: u32,
    pub range: ValueRange,
    pub range_defaulted: bool,
    pub normalization: Normalization,
    pub colormap: ColorMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFrame {
    pub year: i32,
    pub reason: String,
}

/// Global range over the valid, strictly positive cells of every readable
/// frame, or `None` when there are none.
pub fn global_range(timeline: &Timeline) -> Option<ValueRange> {
    positive_range(timeline.readable().map(|(_, layer)| layer))
}

fn positive_range<'a>(layers: impl Iterator<Item = &'a RasterLayer>) -> Option<ValueRange> {
    layers
        .flat_map(|layer| layer.valid_values().filter(|v| *v > 0.0))
        .fold(None, |range: Option<ValueRange>, v| {
            let v = v as f64;
            Some(match range {
                Some(r) => r.include(v),
                None => ValueRange::new(v, v),
            })
        })
}

/// Renders timelines to animated GIFs.
pub struct AnimationRenderer {
    config: RenderConfig,
    frames: FrameRenderer,
}

impl AnimationRenderer {
    pub fn new(config: RenderConfig) -> GeoResult<Self> {
        config.validate().map_err(GeoError::Config)?;
        let frames = FrameRenderer::new(config.frame_width, config.frame_height);
        Ok(Self { config, frames })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every readable frame on one shared color scale and assemble
    /// them into an infinitely looping GIF.
    pub fn render(&self, timeline: &Timeline, kind: DatasetKind) -> GeoResult<RenderedAnimation> {
        let skipped: Vec<SkippedFrame> = timeline
            .frames()
            .iter()
            .filter_map(|f| match &f.data {
                FrameData::Unreadable(reason) => Some(SkippedFrame {
                    year: f.year,
                    reason: reason.clone(),
                }),
                FrameData::Raster(_) => None,
            })
            .collect();

        let readable: Vec<_> = timeline.readable().collect();
        if readable.is_empty() {
            return Err(GeoError::NoFramesAvailable(format!(
                "no readable frames for {} in {}",
                timeline.dataset(),
                timeline.region()
            )));
        }

        let (range, range_defaulted) = match global_range(timeline) {
            Some(range) => (range, false),
            None => {
                warn!(
                    dataset = timeline.dataset(),
                    region = timeline.region(),
                    "No valid cells in any frame, using default display range"
                );
                (ValueRange::DEFAULT, true)
            }
        };
        let norm = Normalization::for_kind(kind, range);
        let cmap = ColorMap::for_kind(kind);

        let label = display_label(timeline.label(), kind, timeline.dataset());
        let colorbar_label = kind.label().unwrap_or(label.as_str()).to_string();

        let images: Vec<RgbaImage> = readable
            .par_iter()
            .map(|(frame, layer)| {
                let title = format!("{} in {} - {}", label, frame.region, frame.year);
                self.frames
                    .render(layer, &norm, cmap, &title, &colorbar_label)
            })
            .collect();

        let bytes = self.encode(images)?;
        let years: Vec<i32> = readable.iter().map(|(f, _)| f.year).collect();

        info!(
            dataset = timeline.dataset(),
            region = timeline.region(),
            frames = years.len(),
            skipped = skipped.len(),
            bytes = bytes.len(),
            "Rendered animation"
        );

        Ok(RenderedAnimation {
            bytes,
            frame_count: years.len(),
            years,
            skipped,
            range,
            range_defaulted,
            normalization: norm,
            colormap: cmap,
        })
    }

    /// Render one year as a PNG scaled to that year's own valid cells.
    ///
    /// Uses the same frame layout, color map and normalization policy as
    /// [`render`](Self::render). Fails with a decode error when the frame's
    /// raster is unreadable.
    pub fn render_still(&self, frame: &TimeSeriesFrame, kind: DatasetKind) -> GeoResult<RenderedStill> {
        let layer = match &frame.data {
            FrameData::Raster(layer) => layer,
            FrameData::Unreadable(reason) => {
                return Err(GeoError::decode(format!(
                    "{} {} in {}: {}",
                    frame.dataset, frame.year, frame.region, reason
                )))
            }
        };

        let (range, range_defaulted) = match positive_range(std::iter::once(layer.as_ref())) {
            Some(range) => (range, false),
            None => {
                warn!(
                    dataset = %frame.dataset,
                    year = frame.year,
                    "No valid cells, using default display range"
                );
                (ValueRange::DEFAULT, true)
            }
        };
        let norm = Normalization::for_kind(kind, range);
        let cmap = ColorMap::for_kind(kind);

        let label = display_label(None, kind, &frame.dataset);
        let title = format!("{} - {} ({})", label, frame.region, frame.year);
        let image = self.frames.render(layer, &norm, cmap, &title, &label);
        let (width, height) = image.dimensions();

        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(image.as_raw(), width, height, ColorType::Rgba8)
            .map_err(|e| GeoError::encode(format!("PNG encoding failed: {}", e)))?;

        info!(
            dataset = %frame.dataset,
            region = %frame.region,
            year = frame.year,
            bytes = buf.len(),
            "Rendered still"
        );

        Ok(RenderedStill {
            bytes: Bytes::from(buf),
            year: frame.year,
            region: frame.region.clone(),
            dataset: frame.dataset.clone(),
            width,
            height,
            range,
            range_defaulted,
            normalization: norm,
            colormap: cmap,
        })
    }

    fn encode(&self, images: Vec<RgbaImage>) -> GeoResult<Vec<u8>> {
        let gif_err = |e: image::ImageError| GeoError::encode(format!("GIF encoding failed: {}", e));
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut buf, self.config.gif_speed);
            encoder.set_repeat(Repeat::Infinite).map_err(gif_err)?;
            let delay = Delay::from_numer_denom_ms(self.config.frame_delay_ms, 1);
            for image in images {
                encoder
                    .encode_frame(Frame::from_parts(image, 0, 0, delay))
                    .map_err(gif_err)?;
            }
        }
        Ok(buf)
    }
}

/// Display label: an explicit one, else the kind's, else the dataset name
/// with spaces for underscores.
fn display_label(explicit: Option<&str>, kind: DatasetKind, dataset: &str) -> String {
    explicit
        .or_else(|| kind.label())
        .map(str::to_string)
        .unwrap_or_else(|| dataset.replace('_', " "))
}
