//! Result aggregation.
//!
//! Each grid cell or station contributes an hourly series with a coverage
//! weight. The aggregate at every hour is the weighted sum of the
//! contributions. Weights are applied as given and never renormalised, so a
//! polygon reaching outside the grid yields a proportionally smaller total.

use thiserror::Error;

use crate::series::PrecipitationSeries;

/// One source's hourly values and the weight it carries in the total.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    /// Cell label (`column,row`) or station id.
    pub label: String,
    pub weight: f64,
    pub values: Vec<f64>,
}

impl Contribution {
    pub fn new(label: impl Into<String>, weight: f64, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            weight,
            values,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("no contributions to aggregate")]
    Empty,

    #[error("contribution {label} has {actual} values, expected {expected}")]
    LengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Weighted sum of `contributions`, each of which must hold `hours` values.
pub fn aggregate(contributions: &[Contribution], hours: usize) -> Result<Vec<f64>, AggregateError> {
    if contributions.is_empty() {
        return Err(AggregateError::Empty);
    }

    let mut total = vec![0.0; hours];
    for c in contributions {
        if c.values.len() != hours {
            return Err(AggregateError::LengthMismatch {
                label: c.label.clone(),
                expected: hours,
                actual: c.values.len(),
            });
        }
        for (acc, v) in total.iter_mut().zip(&c.values) {
            *acc += c.weight * v;
        }
    }
    Ok(total)
}

/// Aggregate and pair the result with its hourly timestamps.
pub fn aggregate_series(
    contributions: &[Contribution],
    timestamps: Vec<i64>,
) -> Result<PrecipitationSeries, AggregateError> {
    let values = aggregate(contributions, timestamps.len())?;
    Ok(PrecipitationSeries::from_pairs(timestamps.into_iter().zip(values)))
}
