//! Archive temporal bounds and the half-hour index axis.
//!
//! The archive stores one sample per half hour, starting at the first
//! timestamp on record. Band indices are therefore positions in the
//! synthetic 30-minute sequence anchored at [`ArchiveBounds::min`].

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use culvert_protocol::date_range::HALF_HOUR_MINUTES;
use culvert_protocol::{ArchiveBounds, DateRange};
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Prefix format of archive file names, e.g. `20000601-S000000.HDF5`.
pub const FILE_STEM_FORMAT: &str = "%Y%m%d-S%H%M";

const FILE_STEM_PREFIX_LEN: usize = 14;

/// Parse the timestamp at the start of an archive file name.
///
/// Anything after `YYYYMMDD-SHHMM` (seconds, end time, version) is ignored.
pub fn parse_file_stem(stem: &str) -> Option<DateTime<Utc>> {
    let prefix = stem.get(..FILE_STEM_PREFIX_LEN)?;
    NaiveDateTime::parse_from_str(prefix, FILE_STEM_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Discover archive bounds from the names of the half-hourly files in `dir`.
pub fn discover_bounds(dir: &Path) -> Result<ArchiveBounds> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        GridProcessorError::BoundsUnavailable(format!("{}: {}", dir.display(), e))
    })?;

    let mut min: Option<DateTime<Utc>> = None;
    let mut max: Option<DateTime<Utc>> = None;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(stem) = name.to_str() else {
            continue;
        };
        match parse_file_stem(stem) {
            Some(t) => {
                min = Some(min.map_or(t, |m| m.min(t)));
                max = Some(max.map_or(t, |m| m.max(t)));
            }
            None => debug!(file = %stem, "Skipping file without archive timestamp"),
        }
    }

    match (min, max) {
        (Some(min), Some(max)) => Ok(ArchiveBounds::new(min, max)),
        _ => Err(GridProcessorError::BoundsUnavailable(format!(
            "no dated files in {}",
            dir.display()
        ))),
    }
}

/// Bounds of an archive with `len` half-hour samples starting at `start`.
pub fn bounds_from_start(start: DateTime<Utc>, len: usize) -> Result<ArchiveBounds> {
    if len == 0 {
        return Err(GridProcessorError::BoundsUnavailable(
            "archive has no time steps".to_string(),
        ));
    }
    let max = start + Duration::minutes(HALF_HOUR_MINUTES * (len as i64 - 1));
    Ok(ArchiveBounds::new(start, max))
}

/// Half-hour index axis anchored at the archive's first timestamp.
#[derive(Debug, Clone, Copy)]
pub struct HalfHourAxis {
    bounds: ArchiveBounds,
    len: usize,
}

impl HalfHourAxis {
    /// Axis covering `bounds`, truncated to `array_len` steps when the array
    /// holds fewer samples than the bounds imply.
    pub fn new(bounds: ArchiveBounds, array_len: Option<usize>) -> Self {
        let implied = bounds.half_hour_count();
        let len = array_len.map_or(implied, |n| n.min(implied));
        Self { bounds, len }
    }

    pub fn bounds(&self) -> &ArchiveBounds {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of `t` in the half-hour sequence.
    pub fn index_of(&self, t: DateTime<Utc>) -> Result<usize> {
        let minutes = (t - self.bounds.min).num_minutes();
        let out_of_range = || {
            GridProcessorError::out_of_range(t.format("%Y-%m-%dT%H:%MZ").to_string(), &self.bounds)
        };
        if minutes < 0 || minutes % HALF_HOUR_MINUTES != 0 {
            return Err(out_of_range());
        }
        let index = (minutes / HALF_HOUR_MINUTES) as usize;
        if index >= self.len {
            return Err(out_of_range());
        }
        Ok(index)
    }

    /// Inclusive `(start, end)` band indices of the slots `range` reads.
    pub fn band_range(&self, range: &DateRange) -> Result<(usize, usize)> {
        let last = range.last_slot().ok_or_else(|| {
            GridProcessorError::out_of_range(format!("empty range {}", range), &self.bounds)
        })?;
        Ok((self.index_of(range.start())?, self.index_of(last)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::write_archive_files;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_file_stem() {
        assert_eq!(
            parse_file_stem("20000601-S000000-E002959.0000.V06B.HDF5"),
            Some(at("2000-06-01T00:00:00Z"))
        );
        assert_eq!(parse_file_stem("20200201-S233000"), Some(at("2020-02-01T23:30:00Z")));
        assert_eq!(parse_file_stem("Grid.fgb"), None);
        assert_eq!(parse_file_stem("2020"), None);
    }

    #[test]
    fn test_discover_bounds() {
        let dir = tempfile::tempdir().unwrap();
        write_archive_files(
            dir.path(),
            &["20200101-S000000.HDF5", "20200103-S233000.HDF5", "20200102-S120000.HDF5"],
        );
        std::fs::write(dir.path().join("README"), "not an archive file").unwrap();

        let bounds = discover_bounds(dir.path()).unwrap();
        assert_eq!(bounds.min, at("2020-01-01T00:00:00Z"));
        assert_eq!(bounds.max, at("2020-01-03T23:30:00Z"));
    }

    #[test]
    fn test_discover_bounds_empty_or_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_bounds(dir.path()),
            Err(GridProcessorError::BoundsUnavailable(_))
        ));
        assert!(matches!(
            discover_bounds(&dir.path().join("missing")),
            Err(GridProcessorError::BoundsUnavailable(_))
        ));
    }

    #[test]
    fn test_index_of() {
        let bounds = ArchiveBounds::new(at("2020-01-01T00:00:00Z"), at("2020-01-02T23:30:00Z"));
        let axis = HalfHourAxis::new(bounds, None);

        assert_eq!(axis.len(), 96);
        assert_eq!(axis.index_of(at("2020-01-01T00:00:00Z")).unwrap(), 0);
        assert_eq!(axis.index_of(at("2020-01-01T01:30:00Z")).unwrap(), 3);
        assert_eq!(axis.index_of(at("2020-01-02T23:30:00Z")).unwrap(), 95);
    }

    #[test]
    fn test_index_of_out_of_range_names_bounds() {
        let bounds = ArchiveBounds::new(at("2020-01-01T00:00:00Z"), at("2020-01-02T23:30:00Z"));
        let axis = HalfHourAxis::new(bounds, None);

        for t in ["2019-12-31T23:30:00Z", "2020-01-03T00:00:00Z", "2020-01-01T00:10:00Z"] {
            let err = axis.index_of(at(t)).unwrap_err();
            assert!(matches!(err, GridProcessorError::OutOfArchiveRange { .. }));
            assert!(err.to_string().contains("2020-01-01T00:00Z to 2020-01-02T23:30Z"));
        }
    }

    #[test]
    fn test_band_range() {
        let bounds = ArchiveBounds::new(at("2020-01-01T00:00:00Z"), at("2020-01-05T23:30:00Z"));
        let axis = HalfHourAxis::new(bounds, None);
        let range = DateRange::parse("2020-01-02/2020-01-03").unwrap();

        assert_eq!(axis.band_range(&range).unwrap(), (48, 95));
    }

    #[test]
    fn test_axis_truncated_to_array() {
        let bounds = ArchiveBounds::new(at("2020-01-01T00:00:00Z"), at("2020-01-05T23:30:00Z"));
        let axis = HalfHourAxis::new(bounds, Some(48));
        let range = DateRange::parse("2020-01-02/2020-01-03").unwrap();

        assert_eq!(axis.len(), 48);
        assert!(axis.band_range(&range).is_err());
    }

    #[test]
    fn test_bounds_from_start() {
        let bounds = bounds_from_start(at("2020-01-01T00:00:00Z"), 96).unwrap();
        assert_eq!(bounds.max, at("2020-01-02T23:30:00Z"));
        assert!(bounds_from_start(at("2020-01-01T00:00:00Z"), 0).is_err());
    }
}
