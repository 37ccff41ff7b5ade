//! GeoTIFF fixture writers.
//!
//! Fixtures are written with ModelPixelScale/ModelTiepoint tags covering
//! [`bbox::ASSABA`](crate::fixtures::bbox::ASSABA) so decoders see a real
//! geotransform.

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

use crate::fixtures::bbox;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GDAL_NODATA: u16 = 42113;

fn encode<C, W>(writer: W, width: u32, height: u32, data: &[C::Inner], nodata: Option<f64>)
where
    C: ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let (min_x, min_y, max_x, max_y) = bbox::ASSABA;
    let scale = [
        (max_x - min_x) / width as f64,
        (max_y - min_y) / height as f64,
        0.0,
    ];
    let tiepoint = [0.0, 0.0, 0.0, min_x, max_y, 0.0];

    let mut encoder = TiffEncoder::new(writer).expect("Failed to create TIFF encoder");
    let mut image = encoder
        .new_image::<C>(width, height)
        .expect("Failed to start TIFF image");
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])
        .expect("Failed to write pixel scale");
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])
        .expect("Failed to write tiepoint");
    if let Some(nodata) = nodata {
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), nodata.to_string().as_str())
            .expect("Failed to write nodata tag");
    }
    image.write_data(data).expect("Failed to write TIFF data");
}

/// Writes a single-band TIFF of any supported color type to `path`.
pub fn write_tiff<C>(path: &Path, width: u32, height: u32, data: &[C::Inner], nodata: Option<f64>)
where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    let file = File::create(path).expect("Failed to create TIFF fixture");
    encode::<C, _>(file, width, height, data, nodata);
}

/// Encodes a TIFF into memory.
pub fn tiff_bytes<C>(width: u32, height: u32, data: &[C::Inner], nodata: Option<f64>) -> Vec<u8>
where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let mut buf = Vec::new();
    encode::<C, _>(Cursor::new(&mut buf), width, height, data, nodata);
    buf
}

/// 16-bit grayscale fixture encoded into memory.
pub fn gray16_tiff_bytes(width: u32, height: u32, data: &[u16]) -> Vec<u8> {
    tiff_bytes::<colortype::Gray16>(width, height, data, None)
}

/// 8-bit grayscale fixture.
pub fn write_gray8_tiff(path: &Path, width: u32, height: u32, data: &[u8]) {
    write_tiff::<colortype::Gray8>(path, width, height, data, None);
}

/// 16-bit grayscale fixture.
pub fn write_gray16_tiff(path: &Path, width: u32, height: u32, data: &[u16]) {
    write_tiff::<colortype::Gray16>(path, width, height, data, None);
}

/// 32-bit float fixture with an optional GDAL no-data value.
pub fn write_gray32f_tiff(path: &Path, width: u32, height: u32, data: &[f32], nodata: Option<f64>) {
    write_tiff::<colortype::Gray32Float>(path, width, height, data, nodata);
}

/// 8-bit RGB fixture (interleaved).
pub fn write_rgb8_tiff(path: &Path, width: u32, height: u32, data: &[u8]) {
    write_tiff::<colortype::RGB8>(path, width, height, data, None);
}
