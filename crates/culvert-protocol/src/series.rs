//! Hourly precipitation series and their CSV encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CSV header row.
pub const CSV_HEADER: [&str; 2] = ["timestamp", "precipitation"];

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("series length mismatch: {timestamps} timestamps, {values} values")]
    LengthMismatch { timestamps: usize, values: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV encoding error: {0}")]
    Encoding(String),
}

/// Epoch-millisecond timestamps paired one-to-one with values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationSeries {
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: i64,
    precipitation: f64,
}

impl PrecipitationSeries {
    pub fn new(timestamps: Vec<i64>, values: Vec<f64>) -> Result<Self, SeriesError> {
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        Ok(Self { timestamps, values })
    }

    /// Build from `(timestamp, value)` pairs, as returned by the station APIs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, f64)>) -> Self {
        let (timestamps, values) = pairs.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The series as `[timestamp, value]` pairs, in time order.
    pub fn pairs(&self) -> Vec<(i64, f64)> {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Encode as CSV with a `timestamp,precipitation` header.
    pub fn to_csv(&self) -> Result<String, SeriesError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        // Written explicitly so an empty series still carries a header.
        writer.write_record(CSV_HEADER)?;
        for (timestamp, precipitation) in self.pairs() {
            writer.serialize(CsvRow {
                timestamp,
                precipitation,
            })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SeriesError::Encoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| SeriesError::Encoding(e.to_string()))
    }

    /// Decode CSV produced by [`to_csv`](Self::to_csv).
    pub fn from_csv(data: &str) -> Result<Self, SeriesError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        let rows = reader
            .deserialize::<CsvRow>()
            .map(|row| row.map(|r| (r.timestamp, r.precipitation)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_pairs(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch() {
        let err = PrecipitationSeries::new(vec![1, 2], vec![0.5]).unwrap_err();
        assert!(matches!(
            err,
            SeriesError::LengthMismatch { timestamps: 2, values: 1 }
        ));
    }

    #[test]
    fn test_pairs_zip_in_order() {
        let series = PrecipitationSeries::new(vec![10, 20, 30], vec![0.1, 0.0, 2.5]).unwrap();
        assert_eq!(series.pairs(), vec![(10, 0.1), (20, 0.0), (30, 2.5)]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_csv_header_and_rows() {
        let series = PrecipitationSeries::new(
            vec![1_580_515_200_000, 1_580_518_800_000],
            vec![0.25, -1.0],
        )
        .unwrap();
        let csv = series.to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("timestamp,precipitation"));
        assert_eq!(lines.next(), Some("1580515200000,0.25"));
        assert_eq!(lines.next(), Some("1580518800000,-1.0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_round_trip_preserves_pairs() {
        let series = PrecipitationSeries::new(
            vec![1_580_515_200_000, 1_580_518_800_000, 1_580_522_400_000],
            vec![0.30000000000000004, 17.0, 0.00001],
        )
        .unwrap();
        let decoded = PrecipitationSeries::from_csv(&series.to_csv().unwrap()).unwrap();
        assert_eq!(decoded, series);
    }

    #[test]
    fn test_empty_series_csv() {
        let series = PrecipitationSeries::new(vec![], vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.to_csv().unwrap(), "timestamp,precipitation\n");
        let decoded = PrecipitationSeries::from_csv(&series.to_csv().unwrap()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_malformed_csv() {
        let result = PrecipitationSeries::from_csv("timestamp,precipitation\nnot-a-number,1.0\n");
        assert!(matches!(result, Err(SeriesError::Csv(_))));
    }
}
