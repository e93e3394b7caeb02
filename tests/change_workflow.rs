use canopydiff::{
    Band, BoundingBox, ChangeParams, ChangeSummary, CoordinateSpace, DateRange, Error,
    GeoTransform, GridSpec, InMemoryArchive, Raster, RegionOfInterest, Tile, build_export,
    detect_canopy_change, display_layers,
};
use chrono::NaiveDate;
use geo::polygon;
use ndarray::Array2;

const PIXEL: f64 = 0.2;

fn philadelphia() -> ChangeParams {
    let mut params = ChangeParams::new(
        BoundingBox::new(-75.28, 39.87, -74.96, 40.14).unwrap(),
        DateRange::parse("2017-01-01", "2018-01-01").unwrap(),
        DateRange::parse("2022-01-01", "2024-01-01").unwrap(),
    );
    params.pixel_size = PIXEL;
    params
}

/// 2x2 tile on the working grid with uniform red and NIR values.
fn tile(id: &str, acquired: &str, red: f64, nir: f64) -> Tile {
    let grid = GridSpec::new(GeoTransform::new(-75.28, 40.14, PIXEL, -PIXEL).unwrap(), 2, 2);
    let raster = Raster::new(
        id,
        grid,
        vec![
            Band::from_values("R", Array2::from_elem((2, 2), red)),
            Band::from_values("N", Array2::from_elem((2, 2), nir)),
        ],
    )
    .unwrap();
    Tile::new(
        id,
        NaiveDate::parse_from_str(acquired, "%Y-%m-%d").unwrap(),
        raster,
    )
}

fn values(raster: &Raster) -> Vec<Option<f64>> {
    raster.single_band().unwrap().data.iter().copied().collect()
}

#[test]
fn vegetation_loss_is_minus_one_everywhere() {
    let archive = InMemoryArchive::new()
        .with_tile("naip", tile("2017", "2017-06-01", 10.0, 30.0))
        .with_tile("naip", tile("2023", "2023-05-01", 30.0, 10.0))
        // outside both epochs; would flip the result if selected
        .with_tile("naip", tile("2020", "2020-07-01", 5.0, 50.0));
    let params = philadelphia();

    let result = detect_canopy_change(&archive, &params, None).unwrap();
    assert_eq!(result.grid.shape(), (2, 2));
    assert_eq!(result.earlier.tiles, 1);
    assert_eq!(result.later.tiles, 1);
    assert_eq!(values(&result.difference), vec![Some(-1.0); 4]);

    // bottom-row centers (lat 39.84) fall south of the region
    assert_eq!(
        values(&result.clipped),
        vec![Some(-1.0), Some(-1.0), None, None]
    );
    assert_eq!(
        result.summary,
        ChangeSummary {
            lost: 2,
            undefined: 2,
            ..Default::default()
        }
    );
}

#[test]
fn identical_epochs_show_no_change() {
    let archive = InMemoryArchive::new()
        .with_tile("naip", tile("2017", "2017-06-01", 12.0, 20.0))
        .with_tile("naip", tile("2023", "2023-05-01", 12.0, 20.0));
    let result = detect_canopy_change(&archive, &philadelphia(), None).unwrap();
    assert_eq!(values(&result.difference), vec![Some(0.0); 4]);
    assert_eq!(result.summary.unchanged, 2);
    assert_eq!(result.summary.gained + result.summary.lost, 0);
}

#[test]
fn polygon_roi_clips_and_gain_is_plus_one() {
    let archive = InMemoryArchive::new()
        .with_tile("naip", tile("2017", "2017-06-01", 30.0, 10.0))
        .with_tile("naip", tile("2023", "2023-05-01", 10.0, 30.0));
    // triangle covering only the north-west pixel center (-75.18, 40.04)
    let roi = RegionOfInterest::from_polygon(
        polygon![(x: -75.28, y: 39.9), (x: -75.0, y: 40.14), (x: -75.28, y: 40.14)],
        CoordinateSpace::Geographic,
    )
    .unwrap();
    let result = detect_canopy_change(&archive, &philadelphia(), Some(&roi)).unwrap();
    assert_eq!(values(&result.clipped), vec![Some(1.0), None, None, None]);
    assert_eq!(result.summary.gained, 1);
    assert_eq!(result.roi, roi);
}

#[test]
fn missing_epoch_leaves_everything_undefined() {
    let archive = InMemoryArchive::new().with_tile("naip", tile("2017", "2017-06-01", 10.0, 30.0));
    let result = detect_canopy_change(&archive, &philadelphia(), None).unwrap();
    assert_eq!(result.later.tiles, 0);
    assert_eq!(values(&result.difference), vec![None; 4]);
    assert_eq!(result.summary.undefined, 4);
}

#[test]
fn archive_failure_propagates() {
    let archive = InMemoryArchive::new().with_tile("naip", tile("2017", "2017-06-01", 10.0, 30.0));
    let mut params = philadelphia();
    params.archive = "sentinel".to_string();
    assert!(matches!(
        detect_canopy_change(&archive, &params, None),
        Err(Error::Archive(_))
    ));
}

#[test]
fn export_and_display_requests() {
    let archive = InMemoryArchive::new()
        .with_tile("naip", tile("2017", "2017-06-01", 10.0, 30.0))
        .with_tile("naip", tile("2023", "2023-05-01", 30.0, 10.0));
    let mut params = philadelphia();
    let result = detect_canopy_change(&archive, &params, None).unwrap();

    let request = build_export(&result, &params).unwrap();
    assert_eq!(request.description(), "CanopyDiff");
    assert_eq!(request.scale(), 10.0);
    assert_eq!(request.raster().name(), "difference");
    // ~27 km x 30 km at 10 m
    assert!((7_000_000..10_000_000).contains(&request.estimated_pixels()));

    params.export.max_pixels = 1_000;
    assert!(matches!(
        build_export(&result, &params),
        Err(Error::PixelBudgetExceeded { ceiling: 1_000, .. })
    ));

    let layers = display_layers(&result, &params).unwrap();
    let names: Vec<&str> = layers.iter().map(|l| l.name()).collect();
    assert_eq!(
        names,
        vec![
            "Vegetation cover [2017-01-01, 2018-01-01)",
            "Vegetation cover [2022-01-01, 2024-01-01)",
            "Vegetation difference 2017-01-01 to 2022-01-01",
        ]
    );
    assert_eq!(layers[2].style(), &params.style);
}

#[test]
fn oversized_working_grid_fails_before_processing() {
    let archive = InMemoryArchive::new().with_tile("naip", tile("2017", "2017-06-01", 10.0, 30.0));
    let mut params = philadelphia();
    params.pixel_size = 1e-5;
    assert!(matches!(
        detect_canopy_change(&archive, &params, None),
        Err(Error::PixelBudgetExceeded {
            estimated: 864_000_000,
            ..
        })
    ));
}
