//! The IMERG archive: bounds, cell index and reader behind one handle.

use std::sync::Arc;

use culvert_protocol::{ArchiveBounds, Contribution, DateRange, QueryGeometry};
use tracing::{debug, info, warn};
use zarrs_filesystem::FilesystemStore;

use crate::archive::{bounds_from_start, discover_bounds, HalfHourAxis};
use crate::cell_index::{open_cell_index, CellIndex};
use crate::config::GridProcessorConfig;
use crate::coverage::resolve_cells;
use crate::error::{GridProcessorError, Result};
use crate::hourly::{half_hour_to_hourly, HourlyOptions};
use crate::processor::{ArchiveReader, ZarrArchiveReader};

/// Read-only handle on the dense precipitation archive.
///
/// Opened once at startup and shared between requests.
pub struct ImergArchive {
    axis: Option<HalfHourAxis>,
    index: Arc<dyn CellIndex>,
    reader: Arc<dyn ArchiveReader>,
    options: HourlyOptions,
}

impl ImergArchive {
    /// Open the Zarr store and cell index named in `config`.
    pub fn open(config: &GridProcessorConfig) -> Result<Self> {
        config.validate().map_err(GridProcessorError::ConfigError)?;

        let store = FilesystemStore::new(&config.archive_path).map_err(|e| {
            GridProcessorError::open_failed(format!("{}: {}", config.archive_path.display(), e))
        })?;
        let reader = ZarrArchiveReader::open(store, &config.array_path)?;
        let index = open_cell_index(&config.cell_index)?;

        let archive = Self::new(Arc::new(reader), Arc::from(index), config);
        info!(
            path = %config.archive_path.display(),
            bounds = ?archive.bounds(),
            "Opened IMERG archive"
        );
        Ok(archive)
    }

    /// Assemble an archive from parts, discovering bounds per `config`.
    ///
    /// If the bounds cannot be discovered the archive still opens; every
    /// range is then reported as outside it.
    pub fn new(reader: Arc<dyn ArchiveReader>, index: Arc<dyn CellIndex>, config: &GridProcessorConfig) -> Self {
        let (time_len, _, _) = reader.shape();
        let bounds = match &config.files_dir {
            Some(dir) => discover_bounds(dir),
            None => reader
                .start_time()
                .ok_or_else(|| {
                    GridProcessorError::BoundsUnavailable(
                        "no files_dir configured and no start_time attribute".to_string(),
                    )
                })
                .and_then(|start| bounds_from_start(start, time_len)),
        };
        let axis = match bounds {
            Ok(bounds) => {
                if bounds.half_hour_count() != time_len {
                    warn!(
                        implied = bounds.half_hour_count(),
                        array = time_len,
                        "Archive bounds and array length disagree"
                    );
                }
                Some(HalfHourAxis::new(bounds, Some(time_len)))
            }
            Err(e) => {
                warn!(error = %e, "Archive bounds unavailable");
                None
            }
        };

        Self {
            axis,
            index,
            reader,
            options: HourlyOptions {
                fill_value: config.missing_fill_value,
                sentinel_threshold: config.sentinel_threshold,
                round_decimals: config.round_decimals,
            },
        }
    }

    pub fn bounds(&self) -> Option<&ArchiveBounds> {
        self.axis.as_ref().map(|a| a.bounds())
    }

    /// Whether `range` can be served from this archive.
    pub fn is_valid(&self, range: &DateRange) -> bool {
        range.is_valid(self.bounds())
    }

    /// Hourly contributions of every cell covering `geometry` over `range`.
    ///
    /// An empty result means the geometry touches no cell.
    pub async fn read_geometry(&self, geometry: &QueryGeometry, range: &DateRange) -> Result<Vec<Contribution>> {
        let axis = self.axis.as_ref().ok_or_else(|| {
            GridProcessorError::BoundsUnavailable(format!("cannot serve {}", range))
        })?;
        if !range.is_valid(Some(axis.bounds())) {
            return Err(GridProcessorError::out_of_range(range.to_string(), axis.bounds()));
        }
        if range.hours() == 0 {
            return Ok(Vec::new());
        }

        let band_range = axis.band_range(range)?;
        let cells = resolve_cells(self.index.as_ref(), geometry, band_range)?;
        debug!(cells = cells.len(), ?band_range, "Resolved archive cells");

        let mut contributions = Vec::with_capacity(cells.len());
        for (cell, weight) in cells {
            let raw = self
                .reader
                .read_cell(cell.band_range, cell.column, cell.row)
                .await?;
            let hourly = half_hour_to_hourly(&raw, &self.options);
            if hourly.missing > 0 {
                warn!(
                    cell = %cell.label(),
                    missing = hourly.missing,
                    fill = self.options.fill_value,
                    "Filled missing half-hour samples"
                );
            }
            contributions.push(Contribution::new(cell.label(), weight, hourly.values));
        }
        Ok(contributions)
    }
}
