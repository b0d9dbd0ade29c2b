//! Configuration for the dense archive.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for opening and reading the IMERG archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProcessorConfig {
    /// Directory of the Zarr V3 store holding the `[time, row, column]` array.
    pub archive_path: PathBuf,

    /// Path of the array inside the store.
    pub array_path: String,

    /// Directory of the original half-hourly files. When set, archive bounds
    /// come from the first and last file names; otherwise from the array's
    /// `start_time` attribute and time dimension.
    pub files_dir: Option<PathBuf>,

    /// How cells are located.
    pub cell_index: CellIndexConfig,

    /// Value substituted for missing samples before rounding.
    pub missing_fill_value: f64,

    /// Raw samples at or below this are missing.
    pub sentinel_threshold: f64,

    /// Decimal places each half-hour sample is rounded to.
    pub round_decimals: u32,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from("data/imerg.zarr"),
            array_path: "/".to_string(),
            files_dir: None,
            cell_index: CellIndexConfig::default(),
            missing_fill_value: -1.0,
            sentinel_threshold: -9999.0,
            round_decimals: 5,
        }
    }
}

/// Source of cell geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellIndexConfig {
    /// Cells computed from a regular lat/lon grid definition.
    Regular {
        origin_lon: f64,
        origin_lat: f64,
        resolution: f64,
        columns: usize,
        rows: usize,
    },
    /// Cells read from a GeoJSON FeatureCollection with a `label` property.
    GeoJson { path: PathBuf },
}

impl Default for CellIndexConfig {
    /// The global 0.1° IMERG grid, rows counted from the south edge.
    fn default() -> Self {
        Self::Regular {
            origin_lon: -180.0,
            origin_lat: -90.0,
            resolution: 0.1,
            columns: 3600,
            rows: 1800,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables where set.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("IMERG_ARCHIVE_PATH") {
            self.archive_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("IMERG_FILES_DIR") {
            self.files_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("IMERG_CELL_INDEX") {
            self.cell_index = CellIndexConfig::GeoJson {
                path: PathBuf::from(val),
            };
        }

        if let Ok(val) = std::env::var("IMERG_MISSING_FILL") {
            if let Ok(fill) = val.parse() {
                self.missing_fill_value = fill;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.round_decimals > 15 {
            return Err("round_decimals must be <= 15".to_string());
        }

        if let CellIndexConfig::Regular {
            resolution,
            columns,
            rows,
            ..
        } = &self.cell_index
        {
            if *resolution <= 0.0 {
                return Err("cell_index.resolution must be > 0".to_string());
            }
            if *columns == 0 || *rows == 0 {
                return Err("cell_index grid must have at least one cell".to_string());
            }
        }

        Ok(())
    }
}
