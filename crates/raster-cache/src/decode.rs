//! GeoTIFF decoding to single-channel layers.
//!
//! Grayscale images keep their native sample type. Multi-channel images
//! are reduced to luma using ITU-R 601-2 weights; an alpha channel is
//! ignored.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

use geo_common::{GeoError, GeoResult};

use crate::layer::{GeoTransform, RasterLayer, SampleType};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GDAL_NODATA: u16 = 42113;

/// Decode a raster file into a layer for (dataset, year).
pub fn read_layer(path: &Path, dataset: &str, year: i32) -> GeoResult<RasterLayer> {
    let file = File::open(path)?;
    decode(BufReader::new(file), dataset, year).map_err(|e| match e {
        GeoError::Decode(msg) => GeoError::decode(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Decode an in-memory raster into a layer for (dataset, year).
pub fn read_layer_from_bytes(bytes: &[u8], dataset: &str, year: i32) -> GeoResult<RasterLayer> {
    decode(Cursor::new(bytes), dataset, year)
}

fn decode<R: Read + Seek>(reader: R, dataset: &str, year: i32) -> GeoResult<RasterLayer> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| GeoError::decode(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| GeoError::decode(format!("cannot read dimensions: {}", e)))?;
    let colortype = decoder
        .colortype()
        .map_err(|e| GeoError::decode(format!("cannot read color type: {}", e)))?;
    let channels = match colortype {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        other => {
            return Err(GeoError::decode(format!(
                "unsupported color type {:?}",
                other
            )))
        }
    };

    let result = decoder
        .read_image()
        .map_err(|e| GeoError::decode(format!("cannot read image data: {}", e)))?;

    let (samples, sample_type): (Vec<f32>, SampleType) = match result {
        DecodingResult::U8(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::U8),
        DecodingResult::U16(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::U16),
        DecodingResult::U32(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::U32),
        DecodingResult::I8(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::I8),
        DecodingResult::I16(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::I16),
        DecodingResult::I32(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::I32),
        DecodingResult::F32(buf) => (buf, SampleType::F32),
        DecodingResult::F64(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleType::F64),
        _ => {
            return Err(GeoError::decode("unsupported TIFF sample format"));
        }
    };

    let cells = width as usize * height as usize;
    if samples.len() != cells * channels {
        return Err(GeoError::decode(format!(
            "expected {} samples for {}x{}x{}, got {}",
            cells * channels,
            width,
            height,
            channels,
            samples.len()
        )));
    }

    let data = match channels {
        1 => samples,
        2 => samples.chunks_exact(2).map(|px| px[0]).collect(),
        _ => samples
            .chunks_exact(channels)
            .map(|px| luma(px[0], px[1], px[2], sample_type))
            .collect(),
    };

    let nodata = read_nodata(&mut decoder);
    let transform = read_transform(&mut decoder);
    debug!(
        dataset = dataset,
        year = year,
        width = width,
        height = height,
        sample_type = %sample_type,
        channels = channels,
        has_nodata = nodata.is_some(),
        "Decoded raster"
    );

    Ok(
        RasterLayer::new(dataset, year, width as usize, height as usize, data, sample_type)?
            .with_nodata(nodata)
            .with_transform(transform),
    )
}

/// ITU-R 601-2 luma, rounded for integer sample types.
fn luma(r: f32, g: f32, b: f32, sample_type: SampleType) -> f32 {
    let l = (r * 299.0 + g * 587.0 + b * 114.0) / 1000.0;
    if sample_type.is_integer() {
        l.round()
    } else {
        l
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse().ok())
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z]
    Some(GeoTransform {
        origin_x: tiepoint[3] - tiepoint[0] * scale[0],
        origin_y: tiepoint[4] + tiepoint[1] * scale[1],
        pixel_width: scale[0],
        pixel_height: scale[1],
    })
}
