//! On-disk fixtures: Zarr archives, archive file listings and cell indexes.

use std::path::Path;
use std::sync::Arc;

use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

/// Sentinel used by the archive for missing samples.
pub const ARCHIVE_SENTINEL: f32 = -9999.9;

/// Layout of a test archive.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    /// RFC 3339 timestamp of time index 0, written as `start_time`.
    pub start_time: Option<String>,
    /// Number of half-hour steps.
    pub time: usize,
    pub rows: usize,
    pub columns: usize,
    /// Chunk length along the time axis.
    pub time_chunk: usize,
}

impl ArchiveLayout {
    pub fn new(start_time: &str, time: usize, rows: usize, columns: usize) -> Self {
        Self {
            start_time: Some(start_time.to_string()),
            time,
            rows,
            columns,
            time_chunk: 48,
        }
    }
}

/// Write a `[time, row, column]` float32 Zarr V3 array at `path` (store root).
///
/// `data` is in C order: time slowest, column fastest.
pub fn write_imerg_archive(
    path: &Path,
    layout: &ArchiveLayout,
    data: &[f32],
) -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(data.len(), layout.time * layout.rows * layout.columns, "data does not match shape");

    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    let shape = vec![layout.time as u64, layout.rows as u64, layout.columns as u64];
    let chunk_shape = vec![
        layout.time_chunk.min(layout.time).max(1) as u64,
        layout.rows as u64,
        layout.columns as u64,
    ];

    let mut attrs = serde_json::Map::new();
    attrs.insert("units".to_string(), serde_json::json!("mm/hr"));
    attrs.insert("time_step_minutes".to_string(), serde_json::json!(30));
    if let Some(start) = &layout.start_time {
        attrs.insert("start_time".to_string(), serde_json::json!(start));
    }

    let array = ArrayBuilder::new(
        shape.clone(),
        DataType::Float32,
        chunk_shape.try_into()?,
        FillValue::from(ARCHIVE_SENTINEL),
    )
    .attributes(attrs)
    .build(store.clone(), "/")?;

    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(vec![0, 0, 0], shape)?;
    array.store_array_subset_elements(&subset, data)?;

    Ok(())
}

/// Create empty files named like the archive's half-hourly source files.
pub fn write_archive_files(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"").expect("failed to create archive file");
    }
}

/// A FeatureCollection of square cells with `column,row` labels.
///
/// Features are emitted row by row, columns fastest.
pub fn cell_index_geojson(
    origin_lon: f64,
    origin_lat: f64,
    resolution: f64,
    columns: usize,
    rows: usize,
) -> String {
    let mut features = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        for col in 0..columns {
            let west = origin_lon + col as f64 * resolution;
            let south = origin_lat + row as f64 * resolution;
            let east = west + resolution;
            let north = south + resolution;
            features.push(serde_json::json!({
                "type": "Feature",
                "properties": { "label": format!("{},{}", col, row) },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [west, south], [east, south], [east, north], [west, north], [west, south]
                    ]]
                }
            }));
        }
    }
    serde_json::json!({ "type": "FeatureCollection", "features": features }).to_string()
}
