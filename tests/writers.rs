use canopydiff::io::export_to_path;
use canopydiff::io::writers::tiff::read_tiff_band;
use canopydiff::{
    Band, CoordinateSpace, ExportRequest, GeoTransform, GridSpec, OutputFormat, Raster,
    RegionOfInterest, VisParams,
};
use approx::assert_abs_diff_eq;
use geo::polygon;
use ndarray::array;
use tempfile::tempdir;

fn difference_raster() -> Raster {
    let grid = GridSpec::new(GeoTransform::new(-75.28, 40.14, 0.2, -0.2).unwrap(), 2, 3);
    let band = Band::new(
        "difference",
        array![[Some(-1.0), Some(0.0), Some(1.0)], [None, Some(1.0), None]],
    );
    Raster::new("difference", grid, vec![band]).unwrap()
}

fn request(space: CoordinateSpace) -> ExportRequest {
    let region = RegionOfInterest::from_polygon(
        polygon![(x: -75.28, y: 39.74), (x: -74.68, y: 39.74), (x: -74.68, y: 40.14), (x: -75.28, y: 40.14)],
        space,
    )
    .unwrap();
    ExportRequest::builder(difference_raster(), region)
        .scale(100.0)
        .description("CanopyDiff")
        .style(VisParams::difference())
        .build()
        .unwrap()
}

#[test]
fn geotiff_export_writes_all_sidecars() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("CanopyDiff.tif");
    let written = export_to_path(&request(CoordinateSpace::Geographic), &output, OutputFormat::TIFF).unwrap();

    assert_eq!(written.image, output);
    assert_eq!(written.world_file, dir.path().join("CanopyDiff.tfw"));
    assert_eq!(written.sidecar, dir.path().join("CanopyDiff.json"));
    let prj = written.prj.expect("geographic output gets a .prj");
    assert!(std::fs::read_to_string(prj).unwrap().contains("EPSG\",\"4326"));

    let decoded = read_tiff_band(&output, "difference").unwrap();
    assert_eq!(decoded.band, difference_raster().bands()[0]);
    assert_eq!(decoded.transform, Some(difference_raster().grid().transform));

    let world: Vec<f64> = std::fs::read_to_string(&written.world_file)
        .unwrap()
        .lines()
        .map(|l| l.trim().parse().unwrap())
        .collect();
    assert_eq!(world.len(), 6);
    assert_abs_diff_eq!(world[0], 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(world[3], -0.2, epsilon = 1e-12);
    // upper-left pixel center
    assert_abs_diff_eq!(world[4], -75.18, epsilon = 1e-9);
    assert_abs_diff_eq!(world[5], 40.04, epsilon = 1e-9);

    let sidecar: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written.sidecar).unwrap()).unwrap();
    assert_eq!(sidecar["description"], "CanopyDiff");
    assert_eq!(sidecar["crs"], "EPSG:4326");
    assert_eq!(sidecar["nodata"], "nan");
    assert_eq!(sidecar["rows"], 2);
    assert_eq!(sidecar["cols"], 3);
    assert_eq!(sidecar["style"]["palette"][0], "FF0000");
}

#[test]
fn jpeg_preview_for_planar_region() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("preview.jpg");
    let written = export_to_path(&request(CoordinateSpace::Planar), &output, OutputFormat::JPEG).unwrap();

    let bytes = std::fs::read(&written.image).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    assert_eq!(written.world_file, dir.path().join("preview.jgw"));
    assert!(written.prj.is_none());

    let sidecar: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written.sidecar).unwrap()).unwrap();
    assert_eq!(sidecar["format"], "JPEG");
    assert!(sidecar["crs"].is_null());
}

#[test]
fn multiband_raster_is_rejected() {
    let grid = GridSpec::new(GeoTransform::new(0.0, 1.0, 1.0, -1.0).unwrap(), 1, 1);
    let raster = Raster::undefined("pair", grid, &["R", "N"]);
    let region = RegionOfInterest::from_polygon(
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        CoordinateSpace::Planar,
    )
    .unwrap();
    let request = ExportRequest::builder(raster, region).scale(1.0).build().unwrap();
    let dir = tempdir().unwrap();
    assert!(export_to_path(&request, &dir.path().join("pair.tif"), OutputFormat::TIFF).is_err());
}
