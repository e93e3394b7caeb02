use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::raster::GeoTransform;
use crate::error::Result;
use crate::types::CoordinateSpace;

/// WGS 84 as OGC WKT, written for geographic outputs.
pub const WGS84_WKT: &str = concat!(
    r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,"#,
    r#"AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,"#,
    r#"AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,"#,
    r#"AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#
);

/// `tif` -> `tfw`, `jpg` -> `jgw`; anything else gets `wld`.
fn world_file_extension(image: &Path) -> String {
    let ext = image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "jgw".to_string(),
        "png" => "pgw".to_string(),
        "tif" | "tiff" => "tfw".to_string(),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next_back()) {
                (Some(first), Some(last)) => format!("{first}{last}w"),
                _ => "wld".to_string(),
            }
        }
    }
}

/// Write a world file next to `output_image`.
/// World files use the pixel-center convention for the origin.
pub fn write_world_file(output_image: &Path, transform: &GeoTransform) -> Result<PathBuf> {
    let world_path = output_image.with_extension(world_file_extension(output_image));
    let gt = transform.to_gdal();

    // A: x size, D: y rotation, B: x rotation, E: y size, C/F: upper-left pixel center
    let (a, d, b, e) = (gt[1], gt[4], gt[2], gt[5]);
    let c = gt[0] + 0.5 * a + 0.5 * b;
    let f = gt[3] + 0.5 * d + 0.5 * e;

    let mut file = BufWriter::new(File::create(&world_path)?);
    for v in [a, d, b, e, c, f] {
        writeln!(file, "{:.12}", v)?;
    }
    file.flush()?;
    Ok(world_path)
}

/// Write a `.prj` next to `output_image`. Planar outputs carry no known CRS,
/// so nothing is written for them.
pub fn write_prj_file(output_image: &Path, space: CoordinateSpace) -> Result<Option<PathBuf>> {
    match space {
        CoordinateSpace::Geographic => {
            let prj_path = output_image.with_extension("prj");
            std::fs::write(&prj_path, WGS84_WKT.as_bytes())?;
            Ok(Some(prj_path))
        }
        CoordinateSpace::Planar => Ok(None),
    }
}
