//! Integration test: write a small Zarr archive and read it through
//! ImergArchive end to end.
//!
//! The archive is a 4 x 3 grid of 1° cells anchored at (0, 0), three days of
//! half-hour samples from 2020-01-01T00:00Z. Every sample of cell (c, r)
//! holds `test_cell_value(c, r)`, so every hourly value is twice that.

use std::path::Path;
use std::sync::Arc;

use culvert_protocol::{aggregate, DateRange, QueryGeometry};
use grid_processor::{
    CellIndexConfig, GridProcessorConfig, GridProcessorError, ImergArchive, RegularCellIndex,
    ZarrArchiveReader,
};
use projection::Crs;
use test_utils::{
    archive_offset, assert_series_approx_eq, cell_index_geojson, create_test_archive,
    test_cell_value, write_archive_files, write_imerg_archive, ArchiveLayout, ARCHIVE_SENTINEL,
};
use zarrs_filesystem::FilesystemStore;

const TIME: usize = 144;
const ROWS: usize = 3;
const COLUMNS: usize = 4;

fn grid_config(archive_path: &Path) -> GridProcessorConfig {
    GridProcessorConfig {
        archive_path: archive_path.to_path_buf(),
        cell_index: CellIndexConfig::Regular {
            origin_lon: 0.0,
            origin_lat: 0.0,
            resolution: 1.0,
            columns: COLUMNS,
            rows: ROWS,
        },
        ..Default::default()
    }
}

fn write_archive(path: &Path, start_time: Option<&str>, data: &[f32]) {
    let mut layout = ArchiveLayout::new("2020-01-01T00:00:00Z", TIME, ROWS, COLUMNS);
    layout.start_time = start_time.map(str::to_string);
    write_imerg_archive(path, &layout, data).expect("Failed to write archive");
}

fn open_archive(path: &Path) -> ImergArchive {
    ImergArchive::open(&grid_config(path)).expect("Failed to open archive")
}

fn range(s: &str) -> DateRange {
    DateRange::parse(s).unwrap()
}

#[tokio::test]
async fn test_point_reads_single_cell() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), Some("2020-01-01T00:00:00Z"), &create_test_archive(TIME, ROWS, COLUMNS));
    let archive = open_archive(dir.path());

    let geometry = QueryGeometry::parse("POINT(1.5 2.5)", &Crs::Wgs84).unwrap();
    let contributions = archive
        .read_geometry(&geometry, &range("2020-01-02/2020-01-03"))
        .await
        .unwrap();

    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0].label, "1,2");
    assert_eq!(contributions[0].weight, 1.0);
    let expected = vec![2.0 * test_cell_value(1, 2) as f64; 24];
    assert_series_approx_eq!(contributions[0].values, expected, 1e-9);
}

#[tokio::test]
async fn test_polygon_weights_two_cells() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), Some("2020-01-01T00:00:00Z"), &create_test_archive(TIME, ROWS, COLUMNS));
    let archive = open_archive(dir.path());

    let geometry =
        QueryGeometry::parse("POLYGON((1.5 2, 2.5 2, 2.5 3, 1.5 3, 1.5 2))", &Crs::Wgs84).unwrap();
    let date_range = range("2020-01-01/2020-01-03");
    let contributions = archive.read_geometry(&geometry, &date_range).await.unwrap();

    let labels: Vec<&str> = contributions.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["1,2", "2,2"]);

    let hourly = aggregate(&contributions, date_range.hours()).unwrap();
    assert_eq!(hourly.len(), 48);
    let expected = 0.5 * 2.0 * test_cell_value(1, 2) as f64 + 0.5 * 2.0 * test_cell_value(2, 2) as f64;
    for value in hourly {
        assert!((value - expected).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_missing_sample_is_filled() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = create_test_archive(TIME, ROWS, COLUMNS);
    // First half hour of 2020-01-02 for cell (1, 2).
    data[archive_offset(48, 2, 1, ROWS, COLUMNS)] = ARCHIVE_SENTINEL;
    write_archive(dir.path(), Some("2020-01-01T00:00:00Z"), &data);
    let archive = open_archive(dir.path());

    let geometry = QueryGeometry::parse("POINT(1.5 2.5)", &Crs::Wgs84).unwrap();
    let contributions = archive
        .read_geometry(&geometry, &range("2020-01-02/2020-01-03"))
        .await
        .unwrap();

    let values = &contributions[0].values;
    assert!((values[0] - (-1.0 + test_cell_value(1, 2) as f64)).abs() < 1e-9);
    assert!((values[1] - 2.0 * test_cell_value(1, 2) as f64).abs() < 1e-9);
}

#[tokio::test]
async fn test_range_outside_archive() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), Some("2020-01-01T00:00:00Z"), &create_test_archive(TIME, ROWS, COLUMNS));
    let archive = open_archive(dir.path());

    let past_end = range("2020-01-03/2020-01-05");
    assert!(!archive.is_valid(&past_end));

    let geometry = QueryGeometry::parse("POINT(1.5 2.5)", &Crs::Wgs84).unwrap();
    let err = archive.read_geometry(&geometry, &past_end).await.unwrap_err();
    assert!(matches!(err, GridProcessorError::OutOfArchiveRange { .. }));
    assert!(err.to_string().contains("2020-01-01T00:00Z to 2020-01-03T23:30Z"));
}

#[tokio::test]
async fn test_end_date_after_last_sample_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), Some("2020-01-01T00:00:00Z"), &create_test_archive(TIME, ROWS, COLUMNS));
    let archive = open_archive(dir.path());

    // The last slot summed is 2020-01-03T23:30, but the end date lies past it.
    let last_day = range("2020-01-03/2020-01-04");
    assert!(!archive.is_valid(&last_day));

    let geometry = QueryGeometry::parse("POINT(1.5 2.5)", &Crs::Wgs84).unwrap();
    let err = archive.read_geometry(&geometry, &last_day).await.unwrap_err();
    assert!(matches!(err, GridProcessorError::OutOfArchiveRange { .. }));

    assert!(archive.is_valid(&range("2020-01-02/2020-01-03")));
}

#[tokio::test]
async fn test_missing_bounds_make_every_range_invalid() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), None, &create_test_archive(TIME, ROWS, COLUMNS));
    let archive = open_archive(dir.path());

    assert!(archive.bounds().is_none());
    let date_range = range("2020-01-01/2020-01-02");
    assert!(!archive.is_valid(&date_range));

    let geometry = QueryGeometry::parse("POINT(1.5 2.5)", &Crs::Wgs84).unwrap();
    let err = archive.read_geometry(&geometry, &date_range).await.unwrap_err();
    assert!(matches!(err, GridProcessorError::BoundsUnavailable(_)));
}

#[tokio::test]
async fn test_bounds_from_archive_files() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("imerg.zarr");
    let files_dir = dir.path().join("files");
    std::fs::create_dir_all(&files_dir).unwrap();
    write_archive(&store_path, None, &create_test_archive(TIME, ROWS, COLUMNS));
    write_archive_files(
        &files_dir,
        &[
            "20200101-S000000-E002959.0000.V06B.HDF5",
            "20200102-S120000-E122959.0720.V06B.HDF5",
            "20200103-S233000-E235959.1410.V06B.HDF5",
        ],
    );

    let config = GridProcessorConfig {
        files_dir: Some(files_dir),
        ..grid_config(&store_path)
    };
    let archive = ImergArchive::open(&config).unwrap();

    let bounds = archive.bounds().unwrap();
    assert_eq!(bounds.to_string(), "2020-01-01T00:00Z to 2020-01-03T23:30Z");
    assert!(archive.is_valid(&range("2020-01-01/2020-01-03")));
}

#[tokio::test]
async fn test_geojson_cell_index() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("imerg.zarr");
    let index_path = dir.path().join("cells.geojson");
    write_archive(&store_path, Some("2020-01-01T00:00:00Z"), &create_test_archive(TIME, ROWS, COLUMNS));
    std::fs::write(&index_path, cell_index_geojson(0.0, 0.0, 1.0, COLUMNS, ROWS)).unwrap();

    let config = GridProcessorConfig {
        cell_index: CellIndexConfig::GeoJson { path: index_path },
        ..grid_config(&store_path)
    };
    let archive = ImergArchive::open(&config).unwrap();

    let geometry = QueryGeometry::parse("POINT(3.2 0.7)", &Crs::Wgs84).unwrap();
    let contributions = archive
        .read_geometry(&geometry, &range("2020-01-01/2020-01-02"))
        .await
        .unwrap();
    assert_eq!(contributions[0].label, "3,0");
    assert!((contributions[0].values[5] - 2.0 * test_cell_value(3, 0) as f64).abs() < 1e-9);
}

#[tokio::test]
async fn test_reader_over_shared_parts() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), Some("2020-01-01T00:00:00Z"), &create_test_archive(TIME, ROWS, COLUMNS));

    let store = FilesystemStore::new(dir.path()).unwrap();
    let reader = ZarrArchiveReader::open(store, "/").unwrap();
    let index = RegularCellIndex::new(0.0, 0.0, 1.0, COLUMNS, ROWS);
    let archive = ImergArchive::new(Arc::new(reader), Arc::new(index), &grid_config(dir.path()));

    let geometry = QueryGeometry::parse("POINT(0.5 0.5)", &Crs::Wgs84).unwrap();
    let contributions = archive
        .read_geometry(&geometry, &range("2020-01-01/2020-01-01"))
        .await
        .unwrap();
    assert!(contributions.is_empty());
}
