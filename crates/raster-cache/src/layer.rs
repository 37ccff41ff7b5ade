//! Decoded raster layer types.

use serde::Serialize;

use geo_common::{BoundingBox, GeoError, GeoResult};

/// Native sample type of a decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SampleType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Bits per sample.
    pub fn bits(&self) -> u16 {
        match self {
            Self::U8 | Self::I8 => 8,
            Self::U16 | Self::I16 => 16,
            Self::U32 | Self::I32 | Self::F32 => 32,
            Self::F64 => 64,
        }
    }

    /// TIFF SampleFormat value: 1 unsigned, 2 signed, 3 IEEE float.
    pub fn sample_format(&self) -> u16 {
        match self {
            Self::U8 | Self::U16 | Self::U32 => 1,
            Self::I8 | Self::I16 | Self::I32 => 2,
            Self::F32 | Self::F64 => 3,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.sample_format() != 3
    }

    /// Representable range, used to clamp resampled integer data.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::U8 => (u8::MIN as f64, u8::MAX as f64),
            Self::U16 => (u16::MIN as f64, u16::MAX as f64),
            Self::U32 => (u32::MIN as f64, u32::MAX as f64),
            Self::I8 => (i8::MIN as f64, i8::MAX as f64),
            Self::I16 => (i16::MIN as f64, i16::MAX as f64),
            Self::I32 => (i32::MIN as f64, i32::MAX as f64),
            Self::F32 => (f32::MIN as f64, f32::MAX as f64),
            Self::F64 => (f64::MIN, f64::MAX),
        }
    }

    /// Single output type for a set of bands: the shared type when all
    /// agree, otherwise 32-bit float.
    pub fn common(types: impl IntoIterator<Item = SampleType>) -> Option<SampleType> {
        let mut iter = types.into_iter();
        let first = iter.next()?;
        if iter.all(|t| t == first) {
            Some(first)
        } else {
            Some(Self::F32)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Affine placement of a north-up raster: top-left origin and cell size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    /// Cell width in degrees.
    pub pixel_width: f64,
    /// Cell height in degrees (positive; rows run south).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Transform placing a `width` x `height` grid exactly over `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, width: usize, height: usize) -> Self {
        let (pixel_width, pixel_height) = bbox.pixel_size(width, height);
        Self {
            origin_x: bbox.min_x,
            origin_y: bbox.max_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Same extent, divided into a different number of cells.
    pub fn rescaled(&self, from: (usize, usize), to: (usize, usize)) -> Self {
        Self {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            pixel_width: self.pixel_width * from.0 as f64 / to.0.max(1) as f64,
            pixel_height: self.pixel_height * from.1 as f64 / to.1.max(1) as f64,
        }
    }
}

/// Min/max/mean over a layer's valid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid_count: usize,
}

/// Immutable 2-D grid for one (dataset, year) pair, row-major.
///
/// Only built through [`RasterLayer::new`], so dimensions are never zero
/// and always match the buffer length.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    dataset: String,
    year: i32,
    width: usize,
    height: usize,
    data: Vec<f32>,
    sample_type: SampleType,
    nodata: Option<f64>,
    transform: Option<GeoTransform>,
}

impl RasterLayer {
    /// Create a layer, checking the buffer length against the dimensions.
    pub fn new(
        dataset: impl Into<String>,
        year: i32,
        width: usize,
        height: usize,
        data: Vec<f32>,
        sample_type: SampleType,
    ) -> GeoResult<Self> {
        if width == 0 || height == 0 {
            return Err(GeoError::DimensionMismatch(format!(
                "layer has zero dimensions {}x{}",
                width, height
            )));
        }
        if data.len() != width * height {
            return Err(GeoError::DimensionMismatch(format!(
                "expected {} values for {}x{}, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            dataset: dataset.into(),
            year,
            width,
            height,
            data,
            sample_type,
            nodata: None,
            transform: None,
        })
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_transform(mut self, transform: Option<GeoTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Row-major cell values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn transform(&self) -> Option<GeoTransform> {
        self.transform
    }

    /// Value at (col, row), if in bounds.
    pub fn value(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// True when `value` is a real measurement (finite and not no-data).
    pub fn is_valid(&self, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.nodata {
            Some(nodata) => value != nodata as f32,
            None => true,
        }
    }

    /// Iterator over valid cell values.
    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied().filter(move |v| self.is_valid(*v))
    }

    /// Min/max/mean of valid cells, or `None` when there are none.
    pub fn summary(&self) -> Option<LayerSummary> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in self.valid_values() {
            let v = v as f64;
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        (count > 0).then(|| LayerSummary {
            min,
            max,
            mean: sum / count as f64,
            valid_count: count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(data: Vec<f32>) -> RasterLayer {
        RasterLayer::new("test", 2020, 2, 2, data, SampleType::F32).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = RasterLayer::new("test", 2020, 3, 3, vec![0.0; 4], SampleType::U8).unwrap_err();
        assert!(matches!(err, GeoError::DimensionMismatch(_)));
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        let err = RasterLayer::new("test", 2020, 0, 4, vec![], SampleType::U8).unwrap_err();
        assert!(matches!(err, GeoError::DimensionMismatch(_)));
        let err = RasterLayer::new("test", 2020, 4, 0, vec![], SampleType::U8).unwrap_err();
        assert!(matches!(err, GeoError::DimensionMismatch(_)));
    }

    #[test]
    fn test_accessors() {
        let layer = layer(vec![1.0, 2.0, 3.0, 4.0]).with_nodata(Some(-1.0));
        assert_eq!(layer.dataset(), "test");
        assert_eq!(layer.year(), 2020);
        assert_eq!(layer.dimensions(), (2, 2));
        assert_eq!(layer.data().len(), 4);
        assert_eq!(layer.sample_type(), SampleType::F32);
        assert_eq!(layer.nodata(), Some(-1.0));
        assert!(layer.transform().is_none());
    }

    #[test]
    fn test_summary_skips_nodata_and_nan() {
        let layer = layer(vec![1.0, -9999.0, f32::NAN, 5.0]).with_nodata(Some(-9999.0));
        let summary = layer.summary().unwrap();
        assert_eq!(summary.valid_count, 2);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.mean, 3.0);
    }

    #[test]
    fn test_summary_empty() {
        let layer = layer(vec![0.0; 4]).with_nodata(Some(0.0));
        assert!(layer.summary().is_none());
    }

    #[test]
    fn test_value_bounds() {
        let layer = layer(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(layer.value(1, 1), Some(4.0));
        assert_eq!(layer.value(2, 0), None);
    }

    #[test]
    fn test_common_sample_type() {
        assert_eq!(
            SampleType::common([SampleType::U8, SampleType::U8]),
            Some(SampleType::U8)
        );
        assert_eq!(
            SampleType::common([SampleType::U8, SampleType::I16]),
            Some(SampleType::F32)
        );
        assert_eq!(SampleType::common([]), None);
    }

    #[test]
    fn test_transform_rescale() {
        let t = GeoTransform {
            origin_x: -12.0,
            origin_y: 18.0,
            pixel_width: 0.2,
            pixel_height: 0.2,
        };
        let r = t.rescaled((10, 10), (20, 40));
        assert!((r.pixel_width - 0.1).abs() < 1e-12);
        assert!((r.pixel_height - 0.05).abs() < 1e-12);
    }
}
