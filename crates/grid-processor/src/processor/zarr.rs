//! Zarr V3 archive reader.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableStorageTraits;

use crate::error::{GridProcessorError, Result};

use super::ArchiveReader;

/// Attribute holding the RFC 3339 timestamp of time index 0.
pub const START_TIME_ATTR: &str = "start_time";

/// Reader over a 3D `[time, row, column]` float32 Zarr array.
pub struct ZarrArchiveReader<S: ReadableStorageTraits> {
    /// The Zarr array.
    array: Array<S>,
    /// `(time, rows, columns)`
    shape: (usize, usize, usize),
    start_time: Option<DateTime<Utc>>,
}

impl<S: ReadableStorageTraits + Send + Sync + 'static> ZarrArchiveReader<S> {
    /// Open a Zarr array from storage.
    ///
    /// # Arguments
    /// * `storage` - The storage backend
    /// * `path` - Path to the Zarr array inside the store
    pub fn open(storage: S, path: &str) -> Result<Self> {
        let array = Array::open(Arc::new(storage), path)
            .map_err(|e| GridProcessorError::open_failed(e.to_string()))?;

        let dims = array.shape();
        if dims.len() != 3 {
            return Err(GridProcessorError::invalid_metadata(format!(
                "expected a 3D [time, row, column] array, found {} dimensions",
                dims.len()
            )));
        }
        let shape = (dims[0] as usize, dims[1] as usize, dims[2] as usize);

        let start_time = match array.attributes().get(START_TIME_ATTR) {
            Some(value) => {
                let text = value.as_str().ok_or_else(|| {
                    GridProcessorError::invalid_metadata("start_time must be a string")
                })?;
                let parsed = DateTime::parse_from_rfc3339(text)
                    .map_err(|e| GridProcessorError::invalid_metadata(format!("start_time: {}", e)))?;
                Some(parsed.with_timezone(&Utc))
            }
            None => None,
        };

        debug!(path = %path, ?shape, ?start_time, "Opened Zarr archive");

        Ok(Self {
            array,
            shape,
            start_time,
        })
    }

    fn read_cell_sync(&self, band_range: (usize, usize), column: usize, row: usize) -> Result<Vec<f32>> {
        let (start, end) = band_range;
        let (time_len, rows, columns) = self.shape;
        if start > end || end >= time_len || row >= rows || column >= columns {
            return Err(GridProcessorError::read_failed(format!(
                "cell {},{} bands {}..={} outside array shape {:?}",
                column, row, start, end, self.shape
            )));
        }

        let subset = ArraySubset::new_with_start_shape(
            vec![start as u64, row as u64, column as u64],
            vec![(end - start + 1) as u64, 1, 1],
        )
        .map_err(|e| GridProcessorError::read_failed(e.to_string()))?;

        self.array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(|e| GridProcessorError::read_failed(e.to_string()))
    }
}

#[async_trait]
impl<S: ReadableStorageTraits + Send + Sync + 'static> ArchiveReader for ZarrArchiveReader<S> {
    async fn read_cell(&self, band_range: (usize, usize), column: usize, row: usize) -> Result<Vec<f32>> {
        self.read_cell_sync(band_range, column, row)
    }

    fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }
}
