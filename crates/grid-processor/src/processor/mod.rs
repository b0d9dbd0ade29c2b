//! Dense archive readers.

mod zarr;

pub use zarr::ZarrArchiveReader;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Read access to the `[time, row, column]` precipitation array.
///
/// Implementations are opened once and shared read-only between requests.
#[async_trait]
pub trait ArchiveReader: Send + Sync {
    /// Raw half-hour samples of one cell for the inclusive band range.
    ///
    /// # Arguments
    /// * `band_range` - Inclusive `(start, end)` time indices
    /// * `column` - Column (longitude) index
    /// * `row` - Row (latitude) index
    async fn read_cell(&self, band_range: (usize, usize), column: usize, row: usize) -> Result<Vec<f32>>;

    /// Array shape as `(time, rows, columns)`.
    fn shape(&self) -> (usize, usize, usize);

    /// First timestamp recorded in the array's metadata, if any.
    fn start_time(&self) -> Option<DateTime<Utc>>;
}
