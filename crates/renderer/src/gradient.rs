//! Color maps and value normalization for raster frames.

use rayon::prelude::*;
use serde::Serialize;

use geo_common::DatasetKind;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a 0xRRGGBB literal.
    pub const fn from_hex(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255)
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

// Nine evenly spaced samples of matplotlib's viridis.
const VIRIDIS: [Color; 9] = [
    Color::from_hex(0x440154),
    Color::from_hex(0x472d7b),
    Color::from_hex(0x3b528b),
    Color::from_hex(0x2c728e),
    Color::from_hex(0x21918c),
    Color::from_hex(0x28ae80),
    Color::from_hex(0x5ec962),
    Color::from_hex(0xaddc30),
    Color::from_hex(0xfde725),
];

// ColorBrewer sequential Blues.
const BLUES: [Color; 9] = [
    Color::from_hex(0xf7fbff),
    Color::from_hex(0xdeebf7),
    Color::from_hex(0xc6dbef),
    Color::from_hex(0x9ecae1),
    Color::from_hex(0x6baed6),
    Color::from_hex(0x4292c6),
    Color::from_hex(0x2171b5),
    Color::from_hex(0x08519c),
    Color::from_hex(0x08306b),
];

/// Sequential color map sampled on [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorMap {
    Viridis,
    Blues,
}

impl ColorMap {
    /// Map used for a dataset kind.
    pub fn for_kind(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Precipitation => Self::Blues,
            DatasetKind::PopulationDensity | DatasetKind::Other => Self::Viridis,
        }
    }

    fn stops(&self) -> &'static [Color] {
        match self {
            Self::Viridis => &VIRIDIS,
            Self::Blues => &BLUES,
        }
    }

    /// Color at position `t` (clamped to [0, 1]).
    pub fn sample(&self, t: f32) -> Color {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f32;
        let idx = (scaled.floor() as usize).min(stops.len() - 2);
        interpolate_color(stops[idx], stops[idx + 1], scaled - idx as f32)
    }
}

/// Observed value range across a set of frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Display range used when no valid cells exist at all.
    pub const DEFAULT: ValueRange = ValueRange {
        min: 0.0,
        max: 100.0,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Widen to include `value`.
    pub fn include(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }
}

/// Minimum displayed ceiling for population and precipitation scales.
pub const MIN_DISPLAY_CEILING: f64 = 100.0;

/// Mapping from data values to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "scale", rename_all = "lowercase")]
pub enum Normalization {
    Linear { vmin: f64, vmax: f64 },
    Log { vmin: f64, vmax: f64 },
}

impl Normalization {
    /// Scaling policy for a dataset kind over an observed range.
    ///
    /// Population density: log scale, floor 1, ceiling at least 100.
    /// Precipitation: linear, ceiling at least 100. Anything else: linear
    /// over the observed range.
    pub fn for_kind(kind: DatasetKind, range: ValueRange) -> Self {
        match kind {
            DatasetKind::PopulationDensity => Self::Log {
                vmin: range.min.max(1.0),
                vmax: range.max.max(MIN_DISPLAY_CEILING),
            },
            DatasetKind::Precipitation => Self::Linear {
                vmin: range.min,
                vmax: range.max.max(MIN_DISPLAY_CEILING),
            },
            DatasetKind::Other => Self::Linear {
                vmin: range.min,
                vmax: range.max,
            },
        }
    }

    pub fn vmin(&self) -> f64 {
        match *self {
            Self::Linear { vmin, .. } | Self::Log { vmin, .. } => vmin,
        }
    }

    pub fn vmax(&self) -> f64 {
        match *self {
            Self::Linear { vmax, .. } | Self::Log { vmax, .. } => vmax,
        }
    }

    /// Position of `value` on the scale, clamped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        let t = match *self {
            Self::Linear { vmin, vmax } => {
                let span = vmax - vmin;
                if span.abs() < f64::EPSILON {
                    0.0
                } else {
                    (value - vmin) / span
                }
            }
            Self::Log { vmin, vmax } => {
                let lo = vmin.ln();
                let span = vmax.ln() - lo;
                if span.abs() < f64::EPSILON {
                    0.0
                } else {
                    (value.max(vmin).ln() - lo) / span
                }
            }
        };
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }

    /// Tick values for a colorbar: decades for log scales, `count` even
    /// steps for linear ones.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match *self {
            Self::Linear { vmin, vmax } => {
                let count = count.max(2);
                (0..count)
                    .map(|i| vmin + (vmax - vmin) * i as f64 / (count - 1) as f64)
                    .collect()
            }
            Self::Log { vmin, vmax } => {
                let mut ticks = Vec::new();
                let mut decade = 10f64.powf(vmin.log10().ceil());
                while decade <= vmax * (1.0 + 1e-9) {
                    ticks.push(decade);
                    decade *= 10.0;
                }
                if ticks.is_empty() {
                    ticks.push(vmin);
                    ticks.push(vmax);
                }
                ticks
            }
        }
    }
}

/// Format a tick value compactly.
pub fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.0e}", value)
    } else if abs >= 100.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else if abs >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Colorize a row-major grid into RGBA pixels.
///
/// Cells rejected by `is_valid` are painted with `background`.
pub fn colorize<F>(
    data: &[f32],
    width: usize,
    norm: &Normalization,
    cmap: ColorMap,
    background: Color,
    is_valid: F,
) -> Vec<u8>
where
    F: Fn(f32) -> bool + Sync,
{
    let mut pixels = vec![0u8; data.len() * 4];
    let row_bytes = width.max(1) * 4;
    pixels
        .par_chunks_mut(row_bytes)
        .zip(data.par_chunks(width.max(1)))
        .for_each(|(out, row)| {
            for (px, &value) in out.chunks_exact_mut(4).zip(row) {
                let color = if is_valid(value) {
                    cmap.sample(norm.normalize(value as f64) as f32)
                } else {
                    background
                };
                px.copy_from_slice(&color.to_rgba());
            }
        });
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(ColorMap::Viridis.sample(0.0), VIRIDIS[0]);
        assert_eq!(ColorMap::Viridis.sample(1.0), VIRIDIS[8]);
        assert_eq!(ColorMap::Blues.sample(2.0), BLUES[8]);
        assert_eq!(ColorMap::Blues.sample(f32::NAN), BLUES[0]);
    }

    #[test]
    fn test_population_policy() {
        let norm = Normalization::for_kind(
            DatasetKind::PopulationDensity,
            ValueRange::new(0.2, 40.0),
        );
        assert_eq!(norm, Normalization::Log { vmin: 1.0, vmax: 100.0 });
        // Values below the floor clamp to the floor
        assert_eq!(norm.normalize(0.5), 0.0);
        assert!((norm.normalize(10.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_precipitation_policy() {
        let norm = Normalization::for_kind(DatasetKind::Precipitation, ValueRange::new(5.0, 60.0));
        assert_eq!(norm, Normalization::Linear { vmin: 5.0, vmax: 100.0 });
        let wide = Normalization::for_kind(DatasetKind::Precipitation, ValueRange::new(5.0, 900.0));
        assert_eq!(wide.vmax(), 900.0);
    }

    #[test]
    fn test_other_policy_uses_observed_range() {
        let norm = Normalization::for_kind(DatasetKind::Other, ValueRange::new(2.0, 12.0));
        assert_eq!(norm.vmin(), 2.0);
        assert_eq!(norm.vmax(), 12.0);
        assert_eq!(norm.normalize(7.0), 0.5);
    }

    #[test]
    fn test_degenerate_range() {
        let norm = Normalization::Linear { vmin: 3.0, vmax: 3.0 };
        assert_eq!(norm.normalize(3.0), 0.0);
    }

    #[test]
    fn test_log_ticks_are_decades() {
        let norm = Normalization::Log { vmin: 1.0, vmax: 5000.0 };
        assert_eq!(norm.ticks(5), vec![1.0, 10.0, 100.0, 1000.0]);
    }

    #[test]
    fn test_linear_ticks() {
        let norm = Normalization::Linear { vmin: 0.0, vmax: 100.0 };
        assert_eq!(norm.ticks(5), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(100.0), "100");
        assert_eq!(format_tick(12.5), "12.5");
        assert_eq!(format_tick(0.25), "0.25");
    }

    #[test]
    fn test_colorize_background_for_invalid() {
        let norm = Normalization::Linear { vmin: 0.0, vmax: 1.0 };
        let pixels = colorize(
            &[0.0, f32::NAN, 1.0, -9999.0],
            2,
            &norm,
            ColorMap::Viridis,
            Color::WHITE,
            |v| v.is_finite() && v != -9999.0,
        );
        assert_eq!(&pixels[0..4], &VIRIDIS[0].to_rgba());
        assert_eq!(&pixels[4..8], &Color::WHITE.to_rgba());
        assert_eq!(&pixels[8..12], &VIRIDIS[8].to_rgba());
        assert_eq!(&pixels[12..16], &Color::WHITE.to_rgba());
    }
}
