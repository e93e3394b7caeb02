//! Single-band GeoTIFF I/O on the pure-Rust `tiff` crate.
//!
//! Georeferencing uses the ModelPixelScale / ModelTiepoint pair (north-up
//! only) and nodata the GDAL_NODATA ASCII tag, which is what GDAL and QGIS read.
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::Gray32Float;
use tiff::tags::Tag;
use tracing::debug;

use crate::core::raster::{Band, GeoTransform, GridSpec};
use crate::error::{Error, Result};
use crate::types::CoordinateSpace;

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);
const GEO_KEY_DIRECTORY: Tag = Tag::Unknown(34735);
const GDAL_NODATA: Tag = Tag::Unknown(42113);

/// Decoded band plus the transform found in the file's tags, if any.
#[derive(Debug, Clone)]
pub struct TiffBand {
    pub band: Band,
    pub transform: Option<GeoTransform>,
}

/// Read the first image of a TIFF as band `name`.
///
/// Samples equal to the GDAL_NODATA value, or non-finite, are undefined.
pub fn read_tiff_band(path: &Path, name: &str) -> Result<TiffBand> {
    let file = BufReader::new(File::open(path)?);
    let decoded = decode_band(file, name)?;
    debug!(
        "Read band {} from {:?}: {:?}",
        name,
        path,
        decoded.band.data.dim()
    );
    Ok(decoded)
}

fn decode_band<R: Read + Seek>(reader: R, name: &str) -> Result<TiffBand> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let values: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        _ => return Err(Error::invalid_argument("tiff sample format", name)),
    };
    if values.len() != rows * cols {
        // interleaved multi-sample images land here
        return Err(Error::invalid_argument(
            "tiff samples per pixel",
            values.len() / (rows * cols).max(1),
        ));
    }

    let nodata = decoder
        .get_tag_ascii_string(GDAL_NODATA)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());
    let transform = read_transform(&mut decoder);

    let data = Array2::from_shape_vec((rows, cols), values)
        .map_err(Error::external)?
        .mapv(|v| match nodata {
            Some(nd) if v == nd => None,
            _ if !v.is_finite() => None,
            _ => Some(v),
        });
    Ok(TiffBand {
        band: Band::new(name, data),
        transform,
    })
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: raster (I, J, K) -> model (X, Y, Z)
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]).ok()
}

/// Write `band` as a Float32 GeoTIFF on `grid`; undefined pixels become NaN.
pub fn write_geotiff_f32(
    output: &Path,
    grid: &GridSpec,
    band: &Band,
    space: CoordinateSpace,
) -> Result<()> {
    super::write_replacing(output, |writer| encode_geotiff_f32(writer, grid, band, space))
}

fn encode_geotiff_f32<W: Write + Seek>(
    writer: W,
    grid: &GridSpec,
    band: &Band,
    space: CoordinateSpace,
) -> Result<()> {
    if band.data.dim() != grid.shape() {
        return Err(Error::ExtentMismatch {
            earlier: grid.to_string(),
            later: format!("band {} {:?}", band.name, band.data.dim()),
        });
    }
    let (rows, cols) = grid.shape();
    let data: Vec<f32> = band
        .to_filled_vec(f64::NAN)
        .into_iter()
        .map(|v| v as f32)
        .collect();

    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let t = &grid.transform;
    let scale = [t.pixel_width, t.pixel_height.abs(), 0.0];
    image.encoder().write_tag(MODEL_PIXEL_SCALE, &scale[..])?;
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    image.encoder().write_tag(MODEL_TIEPOINT, &tiepoint[..])?;
    image
        .encoder()
        .write_tag(GEO_KEY_DIRECTORY, &geo_keys(space)[..])?;
    image.encoder().write_tag(GDAL_NODATA, "nan")?;

    image.write_data(&data)?;
    Ok(())
}

/// GeoKeyDirectory: header (version 1.1.0, key count) then one
/// (key, location, count, value) entry per key.
fn geo_keys(space: CoordinateSpace) -> Vec<u16> {
    match space {
        CoordinateSpace::Geographic => vec![
            1, 1, 0, 3, //
            1024, 0, 1, 2, // GTModelType = Geographic
            1025, 0, 1, 1, // GTRasterType = PixelIsArea
            2048, 0, 1, 4326, // GeographicType = WGS 84
        ],
        CoordinateSpace::Planar => vec![
            1, 1, 0, 2, //
            1024, 0, 1, 1, // GTModelType = Projected
            1025, 0, 1, 1, // GTRasterType = PixelIsArea
        ],
    }
}
