use jpeg_encoder::{ColorType, Encoder};
use std::path::Path;

use crate::error::{Error, Result};

/// Write interleaved RGB bytes as a baseline JPEG at quality 100.
pub fn write_rgb_jpeg(output: &Path, cols: usize, rows: usize, rgb_data: &[u8]) -> Result<()> {
    let width = u16::try_from(cols).map_err(|_| Error::invalid_argument("jpeg width", cols))?;
    let height = u16::try_from(rows).map_err(|_| Error::invalid_argument("jpeg height", rows))?;
    if rgb_data.len() != cols * rows * 3 {
        return Err(Error::invalid_argument("rgb buffer length", rgb_data.len()));
    }
    super::write_replacing(output, |writer| {
        Encoder::new(writer, 100)
            .encode(rgb_data, width, height, ColorType::Rgb)
            .map_err(Error::external)
    })
}
