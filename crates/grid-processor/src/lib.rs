//! Dense precipitation archive access.
//!
//! The IMERG archive is a Zarr V3 array of half-hourly precipitation laid out
//! as `[time, row, column]`. This crate turns a query geometry and date range
//! into weighted hourly series:
//!
//! 1. [`archive`] discovers the archive's temporal bounds and maps instants
//!    to half-hour band indices.
//! 2. [`cell_index`] finds the cells under the geometry's bounding box and
//!    [`coverage`] weights them by overlap.
//! 3. [`processor`] reads each cell's samples and [`hourly`] fills missing
//!    values, rounds and pairs them into hours.
//!
//! [`ImergArchive`] wires these together behind a single read-only handle.

pub mod archive;
pub mod cell_index;
pub mod config;
pub mod coverage;
pub mod error;
pub mod hourly;
pub mod imerg;
pub mod processor;

pub use archive::{discover_bounds, parse_file_stem, HalfHourAxis};
pub use cell_index::{CellIndex, CellRecord, GeoJsonCellIndex, GridCell, RegularCellIndex};
pub use config::{CellIndexConfig, GridProcessorConfig};
pub use coverage::{coverage_weight, resolve_cells};
pub use error::{GridProcessorError, Result};
pub use hourly::{half_hour_to_hourly, HourlyOptions, HourlyValues};
pub use imerg::ImergArchive;
pub use processor::{ArchiveReader, ZarrArchiveReader};
