//! Error types for grid processing.

use culvert_protocol::{ArchiveBounds, PipelineError};
use thiserror::Error;

/// Errors that can occur while reading the dense archive.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Failed to open the archive.
    #[error("failed to open archive: {0}")]
    OpenFailed(String),

    /// Failed to read data from the archive.
    #[error("failed to read archive data: {0}")]
    ReadFailed(String),

    /// Invalid metadata in the archive.
    #[error("invalid archive metadata: {0}")]
    InvalidMetadata(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Cell index could not be loaded or queried.
    #[error("cell index error: {0}")]
    CellIndex(String),

    /// A cell label is not `column,row`.
    #[error("invalid cell label '{0}': expected 'column,row'")]
    InvalidLabel(String),

    /// A requested instant is outside (or misaligned with) the archive.
    #[error("{requested} is outside the archive range {bounds}")]
    OutOfArchiveRange {
        requested: String,
        bounds: String,
    },

    /// The archive's first/last timestamps could not be determined.
    #[error("archive bounds unavailable: {0}")]
    BoundsUnavailable(String),
}

impl GridProcessorError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create an OutOfArchiveRange error naming the archive bounds.
    pub fn out_of_range(requested: impl Into<String>, bounds: &ArchiveBounds) -> Self {
        Self::OutOfArchiveRange {
            requested: requested.into(),
            bounds: bounds.to_string(),
        }
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<GridProcessorError> for PipelineError {
    fn from(err: GridProcessorError) -> Self {
        match err {
            GridProcessorError::OutOfArchiveRange { .. } | GridProcessorError::BoundsUnavailable(_) => {
                PipelineError::Range(err.to_string())
            }
            other => PipelineError::Internal(other.to_string()),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_archive_errors_map_to_status() {
        let bounds = ArchiveBounds::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 3, 23, 30, 0).unwrap(),
        );
        let range: PipelineError = GridProcessorError::out_of_range("2020-01-03/2020-01-04", &bounds).into();
        assert_eq!(range.status_code(), 400);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "zarr.json");
        let storage: PipelineError = GridProcessorError::from(io).into();
        assert_eq!(storage.status_code(), 500);

        let metadata: PipelineError = GridProcessorError::invalid_metadata("start_time: bad").into();
        assert_eq!(metadata.status_code(), 500);
    }
}
