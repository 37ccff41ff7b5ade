//! Multi-band GeoTIFF writer.
//!
//! Uses the low-level directory API of the `tiff` encoder so any band
//! count and sample type can be written as one chunky (pixel-interleaved)
//! strip.

use std::io::{Cursor, Read, Seek, Write};

use tiff::decoder::Decoder;
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKindStandard, TiffValue};
use tiff::tags::Tag;

use geo_common::{GeoError, GeoResult};
use raster_cache::{GeoTransform, SampleType};

// GeoTIFF tag IDs
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

// GeoKeys
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const EPSG_WGS84: u16 = 4326;

fn tiff_err(e: tiff::TiffError) -> GeoError {
    GeoError::encode(format!("TIFF encoding error: {}", e))
}

/// Writes equally-sized bands as one geo-referenced image.
pub struct GeoTiffWriter<'a> {
    bands: Vec<&'a [f32]>,
    width: usize,
    height: usize,
    sample_type: SampleType,
    transform: GeoTransform,
    nodata: Option<f64>,
}

impl<'a> GeoTiffWriter<'a> {
    pub fn new(width: usize, height: usize, sample_type: SampleType, transform: GeoTransform) -> Self {
        Self {
            bands: Vec::new(),
            width,
            height,
            sample_type,
            transform,
            nodata: None,
        }
    }

    pub fn band(mut self, data: &'a [f32]) -> Self {
        self.bands.push(data);
        self
    }

    pub fn nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Encode into a new byte buffer.
    pub fn to_bytes(&self) -> GeoResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Encode into any seekable writer.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> GeoResult<()> {
        if self.bands.is_empty() {
            return Err(GeoError::encode("no bands to write"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GeoError::encode("raster has zero dimensions"));
        }
        let cells = self.width * self.height;
        if let Some(bad) = self.bands.iter().position(|b| b.len() != cells) {
            return Err(GeoError::DimensionMismatch(format!(
                "band {} has {} values, expected {}",
                bad + 1,
                self.bands[bad].len(),
                cells
            )));
        }

        let band_count = self.bands.len();
        let width = u32::try_from(self.width).map_err(|_| GeoError::encode("width too large"))?;
        let height = u32::try_from(self.height).map_err(|_| GeoError::encode("height too large"))?;

        let mut encoder = TiffEncoder::new(writer).map_err(tiff_err)?;
        let mut dir = encoder.new_directory().map_err(tiff_err)?;

        dir.write_tag(Tag::ImageWidth, width).map_err(tiff_err)?;
        dir.write_tag(Tag::ImageLength, height).map_err(tiff_err)?;
        let bits = vec![self.sample_type.bits(); band_count];
        dir.write_tag(Tag::BitsPerSample, bits.as_slice())
            .map_err(tiff_err)?;
        dir.write_tag(Tag::Compression, 1u16).map_err(tiff_err)?;
        // BlackIsZero: bands are data, not color channels
        dir.write_tag(Tag::PhotometricInterpretation, 1u16)
            .map_err(tiff_err)?;
        dir.write_tag(Tag::SamplesPerPixel, band_count as u16)
            .map_err(tiff_err)?;
        let formats = vec![self.sample_type.sample_format(); band_count];
        dir.write_tag(Tag::SampleFormat, formats.as_slice())
            .map_err(tiff_err)?;
        dir.write_tag(Tag::PlanarConfiguration, 1u16)
            .map_err(tiff_err)?;
        dir.write_tag(Tag::RowsPerStrip, height).map_err(tiff_err)?;
        if band_count > 1 {
            let extra = vec![0u16; band_count - 1];
            dir.write_tag(Tag::ExtraSamples, extra.as_slice())
                .map_err(tiff_err)?;
        }

        self.write_geo_tags(&mut dir)?;

        let interleaved = self.interleave();
        let (offset, byte_count) = match self.sample_type {
            SampleType::U8 => write_strip(&mut dir, &interleaved, |v| v as u8)?,
            SampleType::U16 => write_strip(&mut dir, &interleaved, |v| v as u16)?,
            SampleType::U32 => write_strip(&mut dir, &interleaved, |v| v as u32)?,
            SampleType::I8 => write_strip(&mut dir, &interleaved, |v| v as i8)?,
            SampleType::I16 => write_strip(&mut dir, &interleaved, |v| v as i16)?,
            SampleType::I32 => write_strip(&mut dir, &interleaved, |v| v as i32)?,
            SampleType::F32 => write_strip(&mut dir, &interleaved, |v| v)?,
            SampleType::F64 => write_strip(&mut dir, &interleaved, |v| v as f64)?,
        };
        dir.write_tag(Tag::StripOffsets, offset).map_err(tiff_err)?;
        dir.write_tag(Tag::StripByteCounts, byte_count)
            .map_err(tiff_err)?;

        dir.finish().map_err(tiff_err)?;
        Ok(())
    }

    fn interleave(&self) -> Vec<f32> {
        let cells = self.width * self.height;
        let mut out = Vec::with_capacity(cells * self.bands.len());
        for i in 0..cells {
            for band in &self.bands {
                out.push(band[i]);
            }
        }
        out
    }

    fn write_geo_tags<W: Write + Seek>(
        &self,
        dir: &mut DirectoryEncoder<'_, W, TiffKindStandard>,
    ) -> GeoResult<()> {
        let t = &self.transform;
        let scale = [t.pixel_width, t.pixel_height, 0.0];
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])
            .map_err(tiff_err)?;

        // Ties pixel (0, 0) to the top-left corner
        let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])
            .map_err(tiff_err)?;

        let geokeys: [u16; 16] = [
            1, 1, 0, 3, // header: version, revision, minor, key count
            GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC,
            GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
            GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, EPSG_WGS84,
        ];
        dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &geokeys[..])
            .map_err(tiff_err)?;

        if let Some(nodata) = self.nodata {
            dir.write_tag(
                Tag::from_u16_exhaustive(GDAL_NODATA),
                nodata.to_string().as_str(),
            )
            .map_err(tiff_err)?;
        }
        Ok(())
    }
}

fn write_strip<W, T, F>(
    dir: &mut DirectoryEncoder<'_, W, TiffKindStandard>,
    values: &[f32],
    convert: F,
) -> GeoResult<(u32, u32)>
where
    W: Write + Seek,
    T: Copy,
    [T]: TiffValue,
    F: Fn(f32) -> T,
{
    let samples: Vec<T> = values.iter().map(|&v| convert(v)).collect();
    let byte_count = u32::try_from(samples.len() * std::mem::size_of::<T>())
        .map_err(|_| GeoError::encode("strip exceeds 4 GiB"))?;
    let offset = dir.write_data(samples.as_slice()).map_err(tiff_err)?;
    let offset = u32::try_from(offset).map_err(|_| GeoError::encode("offset exceeds 4 GiB"))?;
    Ok((offset, byte_count))
}

/// Header-level facts about an encoded GeoTIFF.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTiffInfo {
    pub width: u32,
    pub height: u32,
    pub bands: u32,
    pub bits_per_sample: u16,
    pub sample_format: u16,
    pub pixel_scale: Option<Vec<f64>>,
    pub nodata: Option<String>,
}

/// Read the header of a GeoTIFF without decoding pixel data.
pub fn inspect_geotiff(bytes: &[u8]) -> GeoResult<GeoTiffInfo> {
    inspect(Cursor::new(bytes))
}

fn inspect<R: Read + Seek>(reader: R) -> GeoResult<GeoTiffInfo> {
    let decode_err = |e: tiff::TiffError| GeoError::decode(e.to_string());
    let mut decoder = Decoder::new(reader).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let bands = decoder
        .get_tag_u32(Tag::SamplesPerPixel)
        .map_err(decode_err)?;
    let bits = decoder
        .get_tag_u16_vec(Tag::BitsPerSample)
        .map_err(decode_err)?;
    let formats = decoder
        .get_tag_u16_vec(Tag::SampleFormat)
        .unwrap_or_else(|_| vec![1]);
    let pixel_scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok();
    let nodata = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok();
    Ok(GeoTiffInfo {
        width,
        height,
        bands,
        bits_per_sample: bits.first().copied().unwrap_or(0),
        sample_format: formats.first().copied().unwrap_or(1),
        pixel_scale,
        nodata,
    })
}
